//! Error types for the decode crate.

use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while consuming an export document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The underlying XML stream is not well formed.
    #[error("malformed export document at byte {position}: {message}")]
    Malformed {
        /// Byte offset where the reader stopped.
        position: u64,
        /// Description reported by the reader.
        message: String,
    },

    /// Element or text content is not valid UTF-8.
    #[error("invalid UTF-8 in export document")]
    InvalidUtf8,

    /// An entity reference could not be resolved.
    #[error("unresolved entity reference: &{name};")]
    UnresolvedEntity {
        /// Entity name without `&` and `;`.
        name: String,
    },

    /// Nesting exceeded the configured limit.
    #[error("export document nested deeper than {max_depth} levels")]
    TooDeep {
        /// Configured maximum depth.
        max_depth: usize,
    },

    /// The document ended while elements were still open.
    #[error("unexpected end of export document ({open} elements still open)")]
    UnexpectedEof {
        /// Number of elements left open.
        open: usize,
    },

    /// A close notification arrived with no open element.
    #[error("close without matching open element")]
    UnbalancedClose,

    /// The export could not be retrieved from the remote store.
    #[error("export unavailable: {message}")]
    Unavailable {
        /// Message from the export source.
        message: String,
    },
}

impl DecodeError {
    /// Create a malformed-document error.
    pub fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            position,
            message: message.into(),
        }
    }

    /// Create an unavailable-export error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
