//! Record and envelope error types.

use thiserror::Error;

/// Errors raised by the metadata layer.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The metadata blob does not match the record schema.
    #[error("metadata schema error: {reason}")]
    Schema {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// The record carries a protocol version outside the known set.
    #[error("unsupported protocol version {version} (known: 1..=5)")]
    UnsupportedProtocolVersion {
        /// The offending version.
        version: u64,
    },

    /// A coordinate violates its domain constraints.
    #[error("invalid coordinate: {reason}")]
    InvalidCoordinate {
        /// Which constraint failed.
        reason: String,
    },

    /// Reading or writing the metadata file failed.
    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
