//! Change detection between the remote store and local definitions.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Version marker read from the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteVersion {
    /// Epoch seconds stamped by a previous sync.
    Known(i64),
    /// Missing or unparsable marker.
    Unknown,
}

impl RemoteVersion {
    /// Parses a raw marker; anything but a decimal integer is unknown.
    pub fn parse(marker: &str) -> Self {
        marker
            .trim()
            .parse()
            .map(Self::Known)
            .unwrap_or(Self::Unknown)
    }

    /// Returns true if the marker matches the local definition.
    pub fn matches(&self, local: LocalMarker) -> bool {
        matches!(self, Self::Known(seconds) if *seconds == local.epoch_seconds())
    }
}

/// Modification time of a local definition, in whole epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalMarker(i64);

impl LocalMarker {
    /// Creates a marker from epoch seconds.
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Creates a marker from a timestamp, truncating to seconds.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Self(elapsed.as_secs() as i64),
            Err(before) => Self(-(before.duration().as_secs() as i64)),
        }
    }

    /// Reads the modification time of a file.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self::from_system_time(modified))
    }

    /// Current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Epoch seconds.
    pub fn epoch_seconds(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decides whether an object must be synchronized.
///
/// Only an exact match of a parsable remote marker skips the sync.
pub fn needs_sync(remote_marker: &str, local: LocalMarker) -> bool {
    match RemoteVersion::parse(remote_marker) {
        RemoteVersion::Unknown => {
            tracing::warn!(marker = remote_marker, "remote version unknown, forcing sync");
            true
        }
        remote => !remote.matches(local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_markers() {
        assert_eq!(
            RemoteVersion::parse("1700000000"),
            RemoteVersion::Known(1_700_000_000)
        );
        assert_eq!(RemoteVersion::parse(" 42\n"), RemoteVersion::Known(42));
        assert_eq!(RemoteVersion::parse(""), RemoteVersion::Unknown);
        assert_eq!(RemoteVersion::parse("1.5"), RemoteVersion::Unknown);
        assert_eq!(RemoteVersion::parse("yesterday"), RemoteVersion::Unknown);
    }

    #[test]
    fn missing_or_garbage_marker_forces_sync() {
        let local = LocalMarker::from_epoch_seconds(1_700_000_000);
        assert!(needs_sync("", local));
        assert!(needs_sync("abc", local));
        assert!(needs_sync("1700000000.0", local));
    }

    #[test]
    fn equal_markers_skip() {
        let local = LocalMarker::from_epoch_seconds(1_700_000_000);
        assert!(!needs_sync("1700000000", local));
        assert!(needs_sync("1699999999", local));
        assert!(needs_sync("1700000001", local));
    }

    #[test]
    fn system_time_truncates_to_seconds() {
        let time = UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);
        assert_eq!(LocalMarker::from_system_time(time).epoch_seconds(), 1_700_000_000);
    }

    #[test]
    fn marker_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ATTRIBUTE_Weight.tcl");
        std::fs::write(&path, "mql mod attribute Weight;").unwrap();

        let marker = LocalMarker::from_path(&path).unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let expected = LocalMarker::from_system_time(modified);
        assert_eq!(marker, expected);
        assert!(!needs_sync(&marker.to_string(), marker));

        assert!(LocalMarker::from_path(dir.path().join("missing")).is_err());
    }
}
