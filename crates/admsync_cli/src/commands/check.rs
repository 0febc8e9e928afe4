//! Check command implementation.

use admsync_engine::{needs_sync, LocalMarker, RemoteVersion};
use serde::Serialize;
use std::path::Path;

/// Change detection result.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// Parsed remote marker, if known.
    pub remote: Option<i64>,
    /// Local marker in epoch seconds.
    pub local: i64,
    /// Whether a sync is required.
    pub needs_sync: bool,
}

/// Compares a remote marker with a local definition.
pub fn check(
    remote: &str,
    file: Option<&Path>,
    local: Option<i64>,
) -> Result<CheckResult, Box<dyn std::error::Error>> {
    let local = match (file, local) {
        (_, Some(seconds)) => LocalMarker::from_epoch_seconds(seconds),
        (Some(path), None) => LocalMarker::from_path(path)
            .map_err(|e| format!("cannot stat {}: {e}", path.display()))?,
        (None, None) => return Err("either --file or --local is required".into()),
    };
    let remote_version = match RemoteVersion::parse(remote) {
        RemoteVersion::Known(seconds) => Some(seconds),
        RemoteVersion::Unknown => None,
    };
    Ok(CheckResult {
        remote: remote_version,
        local: local.epoch_seconds(),
        needs_sync: needs_sync(remote, local),
    })
}

/// Runs the check command.
pub fn run(
    remote: &str,
    file: Option<&Path>,
    local: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = check(remote, file, local)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_markers() {
        let result = check("100", None, Some(100)).unwrap();
        assert_eq!(result.remote, Some(100));
        assert!(!result.needs_sync);

        let result = check("99", None, Some(100)).unwrap();
        assert!(result.needs_sync);

        let result = check("", None, Some(100)).unwrap();
        assert_eq!(result.remote, None);
        assert!(result.needs_sync);
    }

    #[test]
    fn marker_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ATTRIBUTE_Weight.tcl");
        std::fs::write(&path, "puts hi").unwrap();

        let local = LocalMarker::from_path(&path).unwrap();
        let result = check(&local.to_string(), Some(&path), None).unwrap();
        assert!(!result.needs_sync);
    }

    #[test]
    fn local_marker_required() {
        assert!(check("1", None, None).is_err());
    }
}
