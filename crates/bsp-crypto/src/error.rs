//! Signature layer error types.

use thiserror::Error;

/// Errors raised by signing and verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The signature does not verify against the canonical rendering.
    #[error("signature verification failed")]
    BadSignature,

    /// The record carries no signature but one is required.
    #[error("record carries no signature")]
    MissingSignature,

    /// Key material could not be loaded or used.
    #[error("bad key: {reason}")]
    BadKey {
        /// What went wrong with the key.
        reason: String,
    },

    /// Canonical serialization failed.
    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing key files failed.
    #[error("key I/O error: {0}")]
    Io(#[from] std::io::Error),
}
