//! # AdmSync Model
//!
//! Canonical in-memory model of administrative objects.
//!
//! This crate provides:
//! - [`Property`] and the canonical [`PropertyMap`]
//! - [`PropertyCanonicalizer`] for the `property` substructure of exports
//! - [`AttributeValue`] with numbered repeating group ordering
//! - [`KindDescriptor`], the capability table describing one object kind
//! - [`AdminObject`], [`BusinessObject`] and [`SyncObject`]
//! - [`ObjectBuilder`] and [`decode_object`] for the read path
//!
//! ## Key Invariants
//!
//! - Properties are keyed by `name` or `name::kind::target`; the key is
//!   both the dedup key and the sort key
//! - Housekeeping properties are decoded but never output-visible
//! - Objects are mutated only while decoding
//!
//! ## Usage
//!
//! ```
//! use admsync_model::{decode_object_str, FileNaming, KindDescriptor};
//!
//! let descriptor = KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"));
//! let object = decode_object_str(
//!     &descriptor,
//!     "<ematrix><attributeDef><adminProperties><name>Weight</name></adminProperties></attributeDef></ematrix>",
//! )
//! .unwrap();
//! assert_eq!(object.name(), "Weight");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attribute;
mod builder;
mod descriptor;
mod object;
mod property;

pub use attribute::{compare_names, AttributeCollector, AttributeValue, VALUE_TAGS};
pub use builder::{decode_object, decode_object_str, ObjectBuilder};
pub use descriptor::{
    admin_paths, business_paths, FieldBinding, FieldTarget, FileNaming, KindDescriptor,
    ObjectShape, REVISION_SEPARATOR,
};
pub use object::{quote_name, AdminObject, BusinessObject, Installation, ObjectAddress, SyncObject};
pub use property::{
    Property, PropertyCanonicalizer, PropertyMap, IGNORED_PROPERTIES, KEY_SEPARATOR,
    RESERVED_SENTINEL,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_serialize_for_display() {
        let descriptor = KindDescriptor::admin("attribute", FileNaming::default());
        let mut object = SyncObject::empty(&descriptor);
        object.admin_mut().name = "Weight".into();
        object
            .admin_mut()
            .properties
            .insert(Property::new("P", "1").with_reference("type", "Part"));

        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["shape"], "admin");
        assert_eq!(json["name"], "Weight");
        assert_eq!(json["properties"]["P::type::Part"]["referenced_name"], "Part");
    }
}
