//! Engine error type: the union of every layer's failures.

use thiserror::Error;

use bsp_chunker::ChunkerError;
use bsp_codec::CodecError;
use bsp_core::RecordError;
use bsp_crypto::SignatureError;
use bsp_oracle::OracleError;

/// Errors surfaced by the storage operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Page codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Compression, split, or integrity failure.
    #[error(transparent)]
    Chunker(#[from] ChunkerError),

    /// Metadata schema or envelope failure.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Signature failure.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Oracle failure, after internal retries.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The operation was cancelled; no partial record is emitted.
    #[error("operation cancelled")]
    Cancelled,

    /// A worker task died unexpectedly.
    #[error("internal failure: {reason}")]
    Internal {
        /// What broke.
        reason: String,
    },
}
