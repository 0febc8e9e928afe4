//! Error types for the synchronizer.

use crate::session::SessionError;
use admsync_decode::DecodeError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while detecting changes or synchronizing.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The object's export could not be retrieved or consumed.
    #[error("failed to decode {kind} '{name}': {source}")]
    Decode {
        /// Object kind.
        kind: String,
        /// Object name.
        name: String,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// The remote version query failed.
    #[error("version query for {kind} '{name}' failed: {message}")]
    VersionQuery {
        /// Object kind.
        kind: String,
        /// Object name.
        name: String,
        /// Remote error text, verbatim.
        message: String,
    },

    /// The sync transaction was aborted.
    #[error("sync of {kind} '{name}' aborted: {message}")]
    Transaction {
        /// Object kind.
        kind: String,
        /// Object name.
        name: String,
        /// Remote error text, verbatim.
        message: String,
    },

    /// History recording could not be re-enabled after a commit.
    #[error("history recording could not be re-enabled after syncing {kind} '{name}': {message}")]
    HistoryRestore {
        /// Object kind.
        kind: String,
        /// Object name.
        name: String,
        /// Remote error text.
        message: String,
    },

    /// The update request is not usable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SyncError {
    /// Creates a decode error for an object.
    pub fn decode(kind: impl Into<String>, name: impl Into<String>, source: DecodeError) -> Self {
        Self::Decode {
            kind: kind.into(),
            name: name.into(),
            source,
        }
    }

    /// Creates a transaction error carrying the remote message.
    pub fn transaction(
        kind: impl Into<String>,
        name: impl Into<String>,
        source: &SessionError,
    ) -> Self {
        Self::Transaction {
            kind: kind.into(),
            name: name.into(),
            message: source.message.clone(),
        }
    }

    /// Creates a version query error carrying the remote message.
    pub fn version_query(
        kind: impl Into<String>,
        name: impl Into<String>,
        source: &SessionError,
    ) -> Self {
        Self::VersionQuery {
            kind: kind.into(),
            name: name.into(),
            message: source.message.clone(),
        }
    }

    /// Creates a history restore error carrying the remote message.
    pub fn history_restore(
        kind: impl Into<String>,
        name: impl Into<String>,
        source: &SessionError,
    ) -> Self {
        Self::HistoryRestore {
            kind: kind.into(),
            name: name.into(),
            message: source.message.clone(),
        }
    }

    /// Returns true if the remote session is left in a state the caller
    /// must not keep using.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::HistoryRestore { .. })
    }
}
