//! Error types for the sync engine.

use gamesync_protocol::ProtocolError;
use gamesync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote store answered but refused the call.
    #[error("remote rejected the request: {0}")]
    Rejected(String),

    /// Protocol error (invalid message format or parameters).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A feature adapter failed to load or collect its section.
    #[error("feature {section}: {message}")]
    Feature {
        /// Section owned by the failing adapter.
        section: String,
        /// Error message.
        message: String,
    },

    /// Two adapters claimed the same section.
    #[error("section {0:?} already has an adapter")]
    DuplicateSection(String),

    /// No signed-in session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a feature error for `section`.
    pub fn feature(section: impl Into<String>, message: impl ToString) -> Self {
        Self::Feature {
            section: section.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Rejected(_) | SyncError::NotConnected => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::transport_fatal("bad certificate").is_retryable());
        assert!(SyncError::Rejected("busy".into()).is_retryable());
        assert!(SyncError::NotConnected.is_retryable());
        assert!(!SyncError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::feature("currency", "negative credits");
        assert_eq!(err.to_string(), "feature currency: negative credits");

        let err = SyncError::DuplicateSection("inventory".into());
        assert!(err.to_string().contains("inventory"));
    }
}
