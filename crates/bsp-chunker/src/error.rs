//! Chunker error types.

use thiserror::Error;

/// Errors raised while splitting or reassembling a file.
///
/// The integrity variants double as the warning type collected during
/// non-strict reassembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkerError {
    /// The input cannot be processed at all.
    #[error("bad input: {reason}")]
    BadInput {
        /// Why the input was refused.
        reason: String,
    },

    /// A decoded chunk's SHA-256 does not match its record entry.
    #[error("chunk {index} hash mismatch")]
    ChunkHashMismatch {
        /// Index of the offending chunk.
        index: u32,
    },

    /// A decoded chunk's length does not match its record entry.
    #[error("chunk {index} length mismatch: expected {expected}, got {got}")]
    ChunkLengthMismatch {
        /// Index of the offending chunk.
        index: u32,
        /// Length the record declares.
        expected: u32,
        /// Length actually decoded.
        got: u32,
    },

    /// The reassembled stream's SHA-256 does not match the record.
    #[error("file hash mismatch: expected {expected}, got {got}")]
    FileHashMismatch {
        /// Hash the record declares.
        expected: String,
        /// Hash of the reassembled stream.
        got: String,
    },

    /// The number of decoded chunks does not match the record.
    #[error("chunk count mismatch: record has {expected}, got {got}")]
    ChunkCountMismatch {
        /// Count the record declares.
        expected: u32,
        /// Chunks actually provided.
        got: u32,
    },

    /// zstd compression failed.
    #[error("compression failed: {reason}")]
    Compression {
        /// Underlying failure.
        reason: String,
    },

    /// zstd decompression failed; the stream is unusable.
    #[error("decompression failed: {reason}")]
    Decompression {
        /// Underlying failure.
        reason: String,
    },
}
