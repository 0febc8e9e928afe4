//! In-memory representation of one administrative object.

use crate::attribute::AttributeValue;
use crate::descriptor::{KindDescriptor, ObjectShape, REVISION_SEPARATOR};
use crate::property::PropertyMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Installation bookkeeping recovered from housekeeping properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Installation {
    /// `installed date` property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_date: Option<String>,
    /// `original name` property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// `application` property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// `installer` property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<String>,
}

/// A plain administrative object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminObject {
    /// Object name.
    pub name: String,
    /// Author, recovered from the `author` property.
    pub author: String,
    /// Description.
    pub description: String,
    /// Whether the object is hidden.
    pub hidden: bool,
    /// Version marker, recovered from the `version` property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Installation bookkeeping.
    pub installation: Installation,
    /// Properties keyed by canonical key.
    pub properties: PropertyMap,
    /// Kind-specific fields bound through the descriptor.
    pub fields: BTreeMap<String, String>,
}

/// A revisioned business object.
///
/// The embedded [`AdminObject`] holds the base name; the externally visible
/// name joins base name and revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusinessObject {
    /// Shared admin data; `admin.name` is the base name.
    pub admin: AdminObject,
    /// Business type.
    pub business_type: String,
    /// Revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault: Option<String>,
    /// Internal object id reported by the export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Attribute values in numbered-group order.
    pub attributes: BTreeSet<AttributeValue>,
}

impl BusinessObject {
    /// External name: base name, or `base________revision`.
    pub fn name(&self) -> String {
        match self.revision.as_deref().filter(|r| !r.is_empty()) {
            Some(revision) => format!("{}{REVISION_SEPARATOR}{revision}", self.admin.name),
            None => self.admin.name.clone(),
        }
    }

    /// Splits an external name into base name and revision.
    pub fn split_name(name: &str) -> (&str, Option<&str>) {
        match name.split_once(REVISION_SEPARATOR) {
            Some((base, revision)) => (base, Some(revision)),
            None => (name, None),
        }
    }
}

/// How statements and queries address an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectAddress {
    /// Admin object by kind and name.
    Named {
        /// Kind name.
        kind: String,
        /// Object name.
        name: String,
        /// Optional trailing address token.
        suffix: Option<String>,
    },
    /// Business object by type, name and revision.
    Business {
        /// Business type.
        business_type: String,
        /// Base name.
        name: String,
        /// Revision (empty if none).
        revision: String,
    },
    /// Business object by internal id.
    ObjectId(String),
}

impl ObjectAddress {
    /// Address of the object called `name` in the given kind.
    ///
    /// Business object names are split at the revision separator.
    pub fn for_name(descriptor: &KindDescriptor, name: &str) -> Self {
        match &descriptor.shape {
            ObjectShape::Admin => Self::Named {
                kind: descriptor.kind_name.clone(),
                name: name.to_string(),
                suffix: descriptor.address_suffix.clone(),
            },
            ObjectShape::Business { business_type } => {
                let (base, revision) = BusinessObject::split_name(name);
                Self::Business {
                    business_type: business_type.clone(),
                    name: base.to_string(),
                    revision: revision.unwrap_or("").to_string(),
                }
            }
        }
    }
}

/// Single-quotes an object name, backslash-escaping `'` and `\`.
pub fn quote_name(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('\'');
    for c in name.chars() {
        if matches!(c, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { kind, name, suffix } => {
                write!(f, "{kind} {}", quote_name(name))?;
                if let Some(suffix) = suffix {
                    write!(f, " {suffix}")?;
                }
                Ok(())
            }
            Self::Business {
                business_type,
                name,
                revision,
            } => write!(
                f,
                "bus {} {} {}",
                quote_name(business_type),
                quote_name(name),
                quote_name(revision)
            ),
            Self::ObjectId(id) => write!(f, "bus {id}"),
        }
    }
}

/// A decoded object of either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SyncObject {
    /// Plain admin object.
    Admin(AdminObject),
    /// Business object.
    Business(BusinessObject),
}

impl SyncObject {
    /// Creates an empty object of the descriptor's shape.
    pub fn empty(descriptor: &KindDescriptor) -> Self {
        match &descriptor.shape {
            ObjectShape::Admin => Self::Admin(AdminObject::default()),
            ObjectShape::Business { business_type } => Self::Business(BusinessObject {
                business_type: business_type.clone(),
                ..BusinessObject::default()
            }),
        }
    }

    /// Creates an empty object carrying only `name`.
    ///
    /// Business names are split at the revision separator.
    pub fn placeholder(descriptor: &KindDescriptor, name: &str) -> Self {
        let mut object = Self::empty(descriptor);
        match &mut object {
            Self::Admin(admin) => admin.name = name.to_string(),
            Self::Business(business) => {
                let (base, revision) = BusinessObject::split_name(name);
                business.admin.name = base.to_string();
                business.revision = revision.map(str::to_string);
            }
        }
        object
    }

    /// Shared admin data.
    pub fn admin(&self) -> &AdminObject {
        match self {
            Self::Admin(admin) => admin,
            Self::Business(business) => &business.admin,
        }
    }

    /// Mutable shared admin data.
    pub fn admin_mut(&mut self) -> &mut AdminObject {
        match self {
            Self::Admin(admin) => admin,
            Self::Business(business) => &mut business.admin,
        }
    }

    /// Business data, if this is a business object.
    pub fn business(&self) -> Option<&BusinessObject> {
        match self {
            Self::Admin(_) => None,
            Self::Business(business) => Some(business),
        }
    }

    /// Externally visible identity.
    pub fn name(&self) -> String {
        match self {
            Self::Admin(admin) => admin.name.clone(),
            Self::Business(business) => business.name(),
        }
    }

    /// Version marker.
    pub fn version(&self) -> Option<&str> {
        self.admin().version.as_deref()
    }

    /// Returns true if no field of the object carries a value.
    pub fn is_blank(&self) -> bool {
        let admin = self.admin();
        let admin_blank = admin.description.is_empty()
            && !admin.hidden
            && admin.properties.output_visible().next().is_none()
            && admin.fields.values().all(String::is_empty);
        match self {
            Self::Admin(_) => admin_blank,
            Self::Business(business) => {
                admin_blank && business.attributes.iter().all(|a| a.value.is_empty())
            }
        }
    }

    /// Best address for statements against this object.
    ///
    /// Business objects with a known internal id are addressed by it.
    pub fn address(&self, descriptor: &KindDescriptor) -> ObjectAddress {
        match self {
            Self::Business(BusinessObject {
                object_id: Some(id),
                ..
            }) if !id.is_empty() => ObjectAddress::ObjectId(id.clone()),
            _ => ObjectAddress::for_name(descriptor, &self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileNaming;
    use crate::property::Property;

    fn trigger() -> KindDescriptor {
        KindDescriptor::business(
            "eService Trigger Program Parameters",
            FileNaming::new("TRIGGER_", ".tcl"),
        )
    }

    #[test]
    fn business_external_name() {
        let mut business = BusinessObject::default();
        business.admin.name = "PartCheck".into();
        assert_eq!(business.name(), "PartCheck");

        business.revision = Some("A".into());
        assert_eq!(business.name(), "PartCheck________A");
        assert_eq!(
            BusinessObject::split_name("PartCheck________A"),
            ("PartCheck", Some("A"))
        );
    }

    #[test]
    fn addresses() {
        let attribute = KindDescriptor::admin("attribute", FileNaming::default());
        let mut object = SyncObject::empty(&attribute);
        object.admin_mut().name = "Weight".into();
        assert_eq!(object.address(&attribute).to_string(), "attribute 'Weight'");

        let table = KindDescriptor::admin("table", FileNaming::default()).with_address_suffix("system");
        assert_eq!(
            ObjectAddress::for_name(&table, "Parts").to_string(),
            "table 'Parts' system"
        );

        let descriptor = trigger();
        let mut object = SyncObject::empty(&descriptor);
        assert_eq!(
            ObjectAddress::for_name(&descriptor, "Check________1"),
            ObjectAddress::Business {
                business_type: "eService Trigger Program Parameters".into(),
                name: "Check".into(),
                revision: "1".into(),
            }
        );
        if let SyncObject::Business(business) = &mut object {
            business.object_id = Some("1.2.3.4".into());
        }
        assert_eq!(
            object.address(&descriptor),
            ObjectAddress::ObjectId("1.2.3.4".into())
        );
    }

    #[test]
    fn blank_objects() {
        let attribute = KindDescriptor::admin("attribute", FileNaming::default());
        let mut object = SyncObject::empty(&attribute);
        assert!(object.is_blank());

        object
            .admin_mut()
            .properties
            .insert(Property::new("author", "Jane"));
        assert!(object.is_blank());

        object.admin_mut().properties.insert(Property::new("X", "1"));
        assert!(!object.is_blank());
    }

    #[test]
    fn placeholders_carry_the_name() {
        let attribute = KindDescriptor::admin("attribute", FileNaming::default());
        let object = SyncObject::placeholder(&attribute, "Weight");
        assert_eq!(object.name(), "Weight");
        assert!(object.is_blank());

        let descriptor = trigger();
        let object = SyncObject::placeholder(&descriptor, "PartCheck________1");
        let business = object.business().unwrap();
        assert_eq!(business.admin.name, "PartCheck");
        assert_eq!(business.revision.as_deref(), Some("1"));
        assert_eq!(object.name(), "PartCheck________1");
    }

    #[test]
    fn addresses_escape_names() {
        assert_eq!(quote_name("Weight"), "'Weight'");
        assert_eq!(quote_name(r"O'Brien\x"), r"'O\'Brien\\x'");

        let attribute = KindDescriptor::admin("attribute", FileNaming::default());
        assert_eq!(
            ObjectAddress::for_name(&attribute, "X' description 'y").to_string(),
            r"attribute 'X\' description \'y'"
        );
        assert_eq!(
            ObjectAddress::for_name(&trigger(), "It's________A").to_string(),
            r"bus 'eService Trigger Program Parameters' 'It\'s' 'A'"
        );
    }
}
