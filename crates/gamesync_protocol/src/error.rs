//! Error types for protocol encoding and validation.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding, decoding, or validating protocol values.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A section key cannot be stored in a snapshot.
    #[error("invalid section key {key:?}: {reason}")]
    InvalidSectionKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A user id could not be parsed.
    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    /// A request carried parameters that don't match its procedure.
    #[error("invalid parameters for {procedure}: {message}")]
    InvalidParams {
        /// The procedure being decoded.
        procedure: &'static str,
        /// What was wrong.
        message: String,
    },
}
