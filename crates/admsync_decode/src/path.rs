//! Logical paths and decoded events.

use std::fmt;

/// A position inside an export document.
///
/// Paths are rooted two levels below the document root: the root element
/// and its single wrapper child are never part of a logical path. Two paths
/// are equal only when their segment sequences are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// Creates a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a slash-separated path such as `/adminProperties/name`.
    ///
    /// Leading, trailing and repeated slashes are ignored.
    pub fn parse(text: &str) -> Self {
        Self::new(text.split('/').filter(|s| !s.is_empty()))
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the last segment.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns true if `prefix` matches the leading segments of this path.
    pub fn starts_with(&self, prefix: &LogicalPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns the segments that follow `prefix`, if this path starts with it.
    pub fn strip_prefix(&self, prefix: &LogicalPath) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.len()..])
        } else {
            None
        }
    }

    /// Compares the segments against string slices.
    pub fn matches(&self, segments: &[&str]) -> bool {
        self.segments.len() == segments.len()
            && self.segments.iter().zip(segments).all(|(a, b)| a == b)
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for LogicalPath {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// One element of an export document, emitted exactly once.
///
/// `text` is `None` for structural elements (containers and empty leaves)
/// and `Some` for leaves carrying character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Position of the element.
    pub path: LogicalPath,
    /// Leaf text, if any.
    pub text: Option<String>,
}

impl DecodedEvent {
    /// Creates a structural event.
    pub fn structural(path: LogicalPath) -> Self {
        Self { path, text: None }
    }

    /// Creates a leaf event.
    pub fn leaf(path: LogicalPath, text: impl Into<String>) -> Self {
        Self {
            path,
            text: Some(text.into()),
        }
    }

    /// Returns the leaf text or an empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = LogicalPath::parse("/adminProperties/propertyList/property");
        assert_eq!(path.len(), 3);
        assert_eq!(path.last(), Some("property"));
        assert_eq!(path.to_string(), "/adminProperties/propertyList/property");
        assert_eq!(LogicalPath::default().to_string(), "/");
    }

    #[test]
    fn exact_equality_only() {
        let a = LogicalPath::parse("/a/b");
        assert_eq!(a, LogicalPath::new(["a", "b"]));
        assert_ne!(a, LogicalPath::parse("/a/b/c"));
        assert!(a.matches(&["a", "b"]));
        assert!(!a.matches(&["a"]));
    }

    #[test]
    fn prefix_handling() {
        let root = LogicalPath::parse("/adminProperties/propertyList");
        let leaf = root.child("property").child("name");
        assert!(leaf.starts_with(&root));
        let rest = leaf.strip_prefix(&root).unwrap();
        assert_eq!(rest, ["property".to_string(), "name".to_string()]);
        assert!(LogicalPath::parse("/other").strip_prefix(&root).is_none());
    }
}
