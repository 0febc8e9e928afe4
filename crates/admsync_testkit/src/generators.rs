//! Property-based test generators using proptest.
//!
//! Provides strategies for properties, attribute names and whole export
//! documents built from them.

use admsync_model::{Property, IGNORED_PROPERTIES};
use proptest::prelude::*;

/// Strategy for property and object names, including XML-special text.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 _&<>]{0,15}").expect("Invalid regex")
}

/// Strategy for non-blank property values.
pub fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9.,:;&<>\"'-][A-Za-z0-9 .,:;&<>\"'-]{0,23}")
        .expect("Invalid regex")
}

/// Strategy for a single property, sometimes referencing another object
/// and sometimes carrying a housekeeping name.
pub fn property_strategy() -> impl Strategy<Value = Property> {
    let name = prop_oneof![
        4 => name_strategy(),
        1 => prop::sample::select(IGNORED_PROPERTIES.to_vec()).prop_map(str::to_string),
    ];
    let reference = prop::option::of((
        prop::sample::select(vec!["type", "attribute", "policy"]),
        prop::sample::select(vec!["A", "B", "Part", "Document"]),
    ));
    (name, prop::option::of(value_strategy()), reference).prop_map(|(name, value, reference)| {
        let mut property = Property {
            name,
            value,
            ..Property::default()
        };
        if let Some((kind, target)) = reference {
            property = property.with_reference(kind, target);
        }
        property
    })
}

/// Strategy for a property list in document order, duplicates allowed.
pub fn property_list_strategy() -> impl Strategy<Value = Vec<Property>> {
    prop::collection::vec(property_strategy(), 0..12)
}

/// Strategy for attribute names of a numbered repeating group.
pub fn numbered_name_strategy() -> impl Strategy<Value = (String, u32)> {
    (prop::sample::select(vec!["Line", "Step", "Row "]), 0u32..10_000)
        .prop_map(|(prefix, n)| (format!("{prefix}{n}"), n))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders an attribute export carrying `properties` in the given order.
pub fn admin_export(name: &str, properties: &[Property]) -> String {
    let mut doc = String::from("<?xml version=\"1.0\"?>\n<ematrix>\n<attributeDef>\n");
    doc.push_str("<adminProperties>\n");
    doc.push_str(&format!("<name>{}</name>\n<propertyList>\n", escape(name)));
    for property in properties {
        doc.push_str(&format!("<property><name>{}</name>", escape(&property.name)));
        if property.is_reference() {
            doc.push_str(&format!(
                "<adminRef><adminType>{}</adminType><adminName>{}</adminName></adminRef>",
                escape(property.referenced_kind.as_deref().unwrap_or("")),
                escape(property.referenced_name.as_deref().unwrap_or(""))
            ));
        }
        if let Some(value) = &property.value {
            doc.push_str(&format!("<value>{}</value>", escape(value)));
        }
        doc.push_str("</property>\n");
    }
    doc.push_str("</propertyList>\n</adminProperties>\n</attributeDef>\n</ematrix>\n");
    doc
}
