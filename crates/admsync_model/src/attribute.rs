//! Attribute values of business objects.

use admsync_decode::{DecodedEvent, LogicalPath};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Element names that carry an attribute's value in an export.
pub const VALUE_TAGS: [&str; 6] = ["string", "integer", "real", "boolean", "date", "timestamp"];

/// One attribute value on a business object.
///
/// Ordering follows the numbered repeating group convention of the remote
/// schema: names made of a common prefix and a trailing integer
/// (`"Line 1"`, `"Line 2"`, `"Line 10"`) sort by that integer, everything
/// else sorts lexically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeValue {
    /// Attribute name.
    pub name: String,
    /// Attribute value as text.
    pub value: String,
}

impl AttributeValue {
    /// Creates an attribute value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_names(&self.name, &other.name).then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits `name` into its non-numeric prefix and trailing digits.
fn split_numbered(name: &str) -> (&str, &str) {
    let digits = name
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    name.split_at(name.len() - digits)
}

/// Compares two decimal digit strings by numeric value.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Orders attribute names by (prefix, numeric suffix, full name).
///
/// A name without trailing digits is its own prefix and sorts before any
/// numbered name sharing that prefix.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_digits) = split_numbered(a);
    let (b_prefix, b_digits) = split_numbered(b);
    a_prefix
        .cmp(b_prefix)
        .then_with(|| match (a_digits.is_empty(), b_digits.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_digits(a_digits, b_digits),
        })
        .then_with(|| a.cmp(b))
}

/// Collects `attribute` entries of a business object export.
#[derive(Debug)]
pub struct AttributeCollector {
    root: LogicalPath,
    pending: Vec<(String, String)>,
}

impl AttributeCollector {
    /// Creates a collector for attributes listed under `root`.
    pub fn new(root: LogicalPath) -> Self {
        Self {
            root,
            pending: Vec::new(),
        }
    }

    /// Consumes `event` if it belongs to the attribute list.
    pub fn accept(&mut self, event: &DecodedEvent) -> bool {
        let Some(rest) = event.path.strip_prefix(&self.root) else {
            return false;
        };
        match rest {
            [] => {}
            [tag] if tag == "attribute" => self.pending.push((String::new(), String::new())),
            [tag, field] if tag == "attribute" => {
                if let Some((name, value)) = self.pending.last_mut() {
                    if field == "name" {
                        *name = event.text_or_empty().to_string();
                    } else if VALUE_TAGS.contains(&field.as_str()) {
                        *value = event.text_or_empty().to_string();
                    }
                }
            }
            _ => {}
        }
        true
    }

    /// Returns the collected values; a later duplicate name wins.
    pub fn finish(self) -> BTreeSet<AttributeValue> {
        let mut latest: Vec<AttributeValue> = Vec::new();
        for (name, value) in self.pending {
            if name.is_empty() {
                continue;
            }
            latest.retain(|a| a.name != name);
            latest.push(AttributeValue::new(name, value));
        }
        latest.into_iter().collect()
    }
}
