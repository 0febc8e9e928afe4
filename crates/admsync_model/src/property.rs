//! Named properties and their canonical collection.

use admsync_decode::{DecodedEvent, LogicalPath};
use serde::Serialize;
use std::collections::BTreeMap;

/// Property names maintained by the remote store itself.
///
/// They are decoded (the `author` property supplies the object's author)
/// but never written back by a generated script.
pub const IGNORED_PROPERTIES: [&str; 6] = [
    "version",
    "installed date",
    "original name",
    "application",
    "installer",
    "author",
];

/// Leading character of reserved, store-managed property names.
pub const RESERVED_SENTINEL: char = '%';

/// Separator used in composite property keys.
pub const KEY_SEPARATOR: &str = "::";

/// One named attachment on an administrative object.
///
/// A property either carries a simple value or references another admin
/// object (`referenced_kind` / `referenced_name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Flags reported by the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    /// Kind of the referenced admin object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_kind: Option<String>,
    /// Name of the referenced admin object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_name: Option<String>,
}

impl Property {
    /// Creates a simple property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the referenced admin object.
    pub fn with_reference(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.referenced_kind = Some(kind.into());
        self.referenced_name = Some(name.into());
        self
    }

    /// Returns true if the property references another admin object.
    pub fn is_reference(&self) -> bool {
        self.referenced_kind.is_some() || self.referenced_name.is_some()
    }

    /// Canonical key: `name`, or `name::kind::target` for references.
    pub fn key(&self) -> String {
        if self.is_reference() {
            format!(
                "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
                self.name,
                self.referenced_kind.as_deref().unwrap_or(""),
                self.referenced_name.as_deref().unwrap_or("")
            )
        } else {
            self.name.clone()
        }
    }

    /// Returns true if the property may appear in a generated script.
    pub fn is_output_visible(&self) -> bool {
        !IGNORED_PROPERTIES.contains(&self.name.as_str())
            && !self.name.starts_with(RESERVED_SENTINEL)
    }
}

/// Properties keyed and ordered by their canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: BTreeMap<String, Property>,
}

impl PropertyMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, replacing one with the same canonical key.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        self.entries.insert(property.key(), property)
    }

    /// Removes the property with the given canonical key.
    pub fn remove(&mut self, key: &str) -> Option<Property> {
        self.entries.remove(key)
    }

    /// Looks up a property by canonical key.
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.entries.get(key)
    }

    /// Returns the value of the simple property `name`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .filter(|p| !p.is_reference())
            .and_then(|p| p.value.as_deref())
    }

    /// Number of properties, suppressed ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the properties a script may write, in key order.
    pub fn output_visible(&self) -> impl Iterator<Item = &Property> {
        self.entries.values().filter(|p| p.is_output_visible())
    }
}

impl FromIterator<Property> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut map = Self::new();
        for property in iter {
            map.insert(property);
        }
        map
    }
}

/// Builds a [`PropertyMap`] from the `property` substructure of an export.
///
/// Recognized paths, relative to the property list root:
///
/// | Path | Effect |
/// |------|--------|
/// | `property` | starts a new property |
/// | `property/name` | name |
/// | `property/value` | value |
/// | `property/flags` | flags |
/// | `property/adminRef/adminType` | referenced kind |
/// | `property/adminRef/adminName` | referenced name |
#[derive(Debug)]
pub struct PropertyCanonicalizer {
    root: LogicalPath,
    pending: Vec<Property>,
}

impl PropertyCanonicalizer {
    /// Creates a canonicalizer for properties listed under `root`.
    pub fn new(root: LogicalPath) -> Self {
        Self {
            root,
            pending: Vec::new(),
        }
    }

    /// Consumes `event` if it belongs to the property substructure.
    ///
    /// Returns false for events outside the property list root.
    pub fn accept(&mut self, event: &DecodedEvent) -> bool {
        let Some(rest) = event.path.strip_prefix(&self.root) else {
            return false;
        };
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
        match rest.as_slice() {
            [] => {}
            ["property"] => self.pending.push(Property::default()),
            ["property", field @ ..] => self.apply(field, event),
            _ => tracing::debug!(path = %event.path, "ignoring unrecognized property path"),
        }
        true
    }

    fn apply(&mut self, field: &[&str], event: &DecodedEvent) {
        let Some(property) = self.pending.last_mut() else {
            tracing::debug!(path = %event.path, "property field outside a property element");
            return;
        };
        let text = event.text.clone();
        match field {
            ["name"] => property.name = text.unwrap_or_default(),
            ["value"] => property.value = text,
            ["flags"] => property.flags = text,
            ["adminRef"] => {}
            ["adminRef", "adminType"] => property.referenced_kind = text,
            ["adminRef", "adminName"] => property.referenced_name = text,
            _ => tracing::debug!(path = %event.path, "ignoring unrecognized property path"),
        }
    }

    /// Drains the collected properties into their canonical map.
    ///
    /// Properties are applied in document order, so a later property with
    /// the same canonical key replaces an earlier one.
    pub fn finish(self) -> PropertyMap {
        self.pending
            .into_iter()
            .filter(|p| !p.name.is_empty())
            .collect()
    }
}
