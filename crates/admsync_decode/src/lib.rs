//! # AdmSync Decode
//!
//! Path-accumulating decoder for admin object export documents.
//!
//! The remote store exports each administrative object as an XML document
//! whose first two levels are a fixed wrapper. This crate turns such a
//! document into a flat sequence of [`DecodedEvent`]s, one per element:
//!
//! ```text
//! <ematrix>                              (stripped)
//!   <attributeDef>                       (stripped)
//!     <adminProperties>                  -> /adminProperties            None
//!       <name>Weight</name>              -> /adminProperties/name       Some("Weight")
//!     </adminProperties>
//!   </attributeDef>
//! </ematrix>
//! ```
//!
//! ## Rules
//!
//! - Every element is emitted exactly once
//! - Containers are emitted before their first child
//! - Text after a nested child is ignored (no mixed content)
//! - The `creationProperties` wrapper is never emitted
//! - External DTD subsets are never fetched
//!
//! ## Usage
//!
//! ```
//! use admsync_decode::decode_str;
//!
//! let events = decode_str(
//!     "<ematrix><attributeDef><adminProperties><name>Weight</name></adminProperties></attributeDef></ematrix>",
//! )
//! .unwrap();
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[1].path.to_string(), "/adminProperties/name");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod entity;
mod error;
mod path;
mod reader;

pub use decoder::{PathDecoder, Token, CREATION_PROPERTIES, DEFAULT_MAX_DEPTH, WRAPPER_DEPTH};
pub use entity::{DocType, EmptySubset, EntityTable, ExternalSubsetResolver};
pub use error::{DecodeError, DecodeResult};
pub use path::{DecodedEvent, LogicalPath};
pub use reader::{DecodeConfig, EventStream, ExportReader};

use std::io::BufRead;

/// Decodes a whole document held in memory.
///
/// # Errors
///
/// Returns an error if the document is not well formed.
pub fn decode_str(document: &str) -> DecodeResult<Vec<DecodedEvent>> {
    events(document.as_bytes(), &DecodeConfig::default()).collect()
}

/// Returns a streaming iterator of events over `input`.
pub fn events<R: BufRead>(input: R, config: &DecodeConfig) -> EventStream<R> {
    EventStream::new(input, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_export_document() {
        let document = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ematrix SYSTEM "ematrix.dtd">
<ematrix>
  <creationProperties>
    <release>2024x</release>
  </creationProperties>
  <attributeDef id="1.2.3">
    <adminProperties>
      <name>Weight</name>
      <description></description>
      <propertyList>
        <property>
          <name>X</name>
          <value>1</value>
        </property>
      </propertyList>
    </adminProperties>
  </attributeDef>
</ematrix>"#;

        let events = decode_str(document).unwrap();
        let rendered: Vec<_> = events
            .iter()
            .map(|e| (e.path.to_string(), e.text.clone()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("/adminProperties".to_string(), None),
                ("/adminProperties/name".to_string(), Some("Weight".to_string())),
                ("/adminProperties/description".to_string(), None),
                ("/adminProperties/propertyList".to_string(), None),
                ("/adminProperties/propertyList/property".to_string(), None),
                (
                    "/adminProperties/propertyList/property/name".to_string(),
                    Some("X".to_string())
                ),
                (
                    "/adminProperties/propertyList/property/value".to_string(),
                    Some("1".to_string())
                ),
            ]
        );
    }

    /// Generated element tree.
    #[derive(Debug, Clone)]
    enum Node {
        Leaf(String, String),
        Branch(String, Vec<Node>),
    }

    fn node_strategy() -> impl Strategy<Value = Node> {
        let tag = "[a-z]{1,6}";
        let leaf = (tag, "[a-zA-Z0-9 ]{0,8}").prop_map(|(t, v)| Node::Leaf(t, v));
        leaf.prop_recursive(4, 32, 4, move |inner| {
            (tag, prop::collection::vec(inner, 0..4)).prop_map(|(t, c)| Node::Branch(t, c))
        })
    }

    /// Renders `node` and records the events it must produce, in order.
    fn render(node: &Node, parent: &LogicalPath, out: &mut String, expected: &mut Vec<DecodedEvent>) {
        match node {
            Node::Leaf(tag, value) => {
                out.push_str(&format!("<{tag}>{value}</{tag}>"));
                let path = parent.child(tag.as_str());
                expected.push(if value.trim().is_empty() {
                    DecodedEvent::structural(path)
                } else {
                    DecodedEvent::leaf(path, value.as_str())
                });
            }
            Node::Branch(tag, children) => {
                out.push_str(&format!("<{tag}>"));
                let path = parent.child(tag.as_str());
                expected.push(DecodedEvent::structural(path.clone()));
                for child in children {
                    render(child, &path, out, expected);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    proptest! {
        #[test]
        fn one_event_per_element(children in prop::collection::vec(node_strategy(), 0..4)) {
            let mut document = String::from("<root><wrapper>");
            let mut expected = Vec::new();
            for child in &children {
                render(child, &LogicalPath::default(), &mut document, &mut expected);
            }
            document.push_str("</wrapper></root>");

            let events = decode_str(&document).unwrap();
            prop_assert_eq!(events, expected);
        }
    }
}
