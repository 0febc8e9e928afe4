//! Remote session abstraction.

use admsync_model::ObjectAddress;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for remote session calls.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failure reported by the remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SessionError {
    /// Remote error text.
    pub message: String,
}

impl SessionError {
    /// Creates a session error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One connection to the remote configuration store.
///
/// All calls are blocking round-trips. A session runs one sync at a time;
/// callers synchronizing concurrently use one session each.
pub trait RemoteSession: Send + Sync {
    /// Exports the object at `address`, or `None` if it does not exist.
    fn export(&self, address: &ObjectAddress) -> SessionResult<Option<String>>;

    /// Reads the raw value of the version property of an object.
    ///
    /// Returns an empty string if the object or property does not exist.
    fn version_marker(&self, address: &ObjectAddress, property: &str) -> SessionResult<String>;

    /// Opens a transaction.
    fn begin(&self) -> SessionResult<()>;

    /// Runs a script and returns its output.
    fn execute(&self, script: &str) -> SessionResult<String>;

    /// Commits the open transaction.
    fn commit(&self) -> SessionResult<()>;

    /// Aborts the open transaction.
    fn abort(&self) -> SessionResult<()>;

    /// Stops recording history entries for modifications.
    fn disable_history(&self) -> SessionResult<()>;

    /// Resumes recording history entries.
    fn enable_history(&self) -> SessionResult<()>;
}

/// A scripted session for testing.
///
/// Exports and version markers are served from fixed tables; every call is
/// recorded by name so tests can assert on call order.
#[derive(Debug, Default)]
pub struct MockSession {
    exports: Mutex<BTreeMap<String, String>>,
    versions: Mutex<BTreeMap<String, String>>,
    failures: Mutex<BTreeMap<&'static str, String>>,
    calls: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
}

impl MockSession {
    /// Creates an empty mock session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the export returned for an address.
    pub fn set_export(&self, address: &ObjectAddress, document: impl Into<String>) {
        self.exports
            .lock()
            .insert(address.to_string(), document.into());
    }

    /// Sets the version marker returned for an address.
    pub fn set_version(&self, address: &ObjectAddress, marker: impl Into<String>) {
        self.versions
            .lock()
            .insert(address.to_string(), marker.into());
    }

    /// Makes the named call (`"export"`, `"begin"`, `"execute"`, ...) fail.
    pub fn fail(&self, call: &'static str, message: impl Into<String>) {
        self.failures.lock().insert(call, message.into());
    }

    /// Returns the names of all calls made so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Returns the scripts passed to `execute`.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    fn record(&self, call: &'static str) -> SessionResult<()> {
        self.calls.lock().push(call.to_string());
        match self.failures.lock().get(call) {
            Some(message) => Err(SessionError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl RemoteSession for MockSession {
    fn export(&self, address: &ObjectAddress) -> SessionResult<Option<String>> {
        self.record("export")?;
        Ok(self.exports.lock().get(&address.to_string()).cloned())
    }

    fn version_marker(&self, address: &ObjectAddress, _property: &str) -> SessionResult<String> {
        self.record("version_marker")?;
        Ok(self
            .versions
            .lock()
            .get(&address.to_string())
            .cloned()
            .unwrap_or_default())
    }

    fn begin(&self) -> SessionResult<()> {
        self.record("begin")
    }

    fn execute(&self, script: &str) -> SessionResult<String> {
        self.scripts.lock().push(script.to_string());
        self.record("execute")?;
        Ok(String::new())
    }

    fn commit(&self) -> SessionResult<()> {
        self.record("commit")
    }

    fn abort(&self) -> SessionResult<()> {
        self.record("abort")
    }

    fn disable_history(&self) -> SessionResult<()> {
        self.record("disable_history")
    }

    fn enable_history(&self) -> SessionResult<()> {
        self.record("enable_history")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ObjectAddress {
        ObjectAddress::Named {
            kind: "attribute".into(),
            name: "Weight".into(),
            suffix: None,
        }
    }

    #[test]
    fn mock_serves_tables() {
        let session = MockSession::new();
        assert_eq!(session.export(&address()).unwrap(), None);
        assert_eq!(session.version_marker(&address(), "version").unwrap(), "");

        session.set_export(&address(), "<ematrix/>");
        session.set_version(&address(), "1700000000");
        assert_eq!(
            session.export(&address()).unwrap().as_deref(),
            Some("<ematrix/>")
        );
        assert_eq!(
            session.version_marker(&address(), "version").unwrap(),
            "1700000000"
        );
    }

    #[test]
    fn mock_failure_injection() {
        let session = MockSession::new();
        session.fail("execute", "syntax error");

        let err = session.execute("bogus").unwrap_err();
        assert_eq!(err.message, "syntax error");
        assert_eq!(session.scripts(), vec!["bogus".to_string()]);
        assert_eq!(session.calls(), vec!["execute".to_string()]);
    }
}
