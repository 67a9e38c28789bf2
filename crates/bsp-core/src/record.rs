//! The persisted file record (BSP metadata).

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Protocol version written by this implementation.
pub const PROTOCOL_VERSION: u64 = 5;

/// Protocol versions this implementation can read.
pub const KNOWN_PROTOCOL_VERSIONS: std::ops::RangeInclusive<u64> = 1..=5;

/// Name of the page encoding used for newly written records.
pub const ENCODING_NAME: &str = "base29-v5";

/// Compression parameters recorded alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compression {
    /// Algorithm identifier; always `"zstd"` for written records.
    pub algorithm: String,
    /// Compression level the stream was produced with.
    pub level: i32,
}

impl Compression {
    /// The zstd level-19 parameters every new record carries.
    #[must_use]
    pub fn zstd_default() -> Self {
        Self {
            algorithm: "zstd".to_string(),
            level: 19,
        }
    }
}

/// Per-chunk entry in the record: where the chunk lives and how to check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Zero-based position in the compressed stream.
    pub index: u32,
    /// Page coordinate the chunk was stored at.
    pub coordinate: Coordinate,
    /// Byte length of the chunk before page encoding.
    pub raw_len: u32,
    /// Lowercase hex SHA-256 of the chunk bytes.
    pub sha256: String,
}

/// The complete persisted artifact.
///
/// A `FileRecord` is born at the end of upload, once every chunk has a
/// coordinate and every hash is populated, and is immutable thereafter.
/// Losing the record loses the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// BSP protocol version; this implementation writes 5.
    pub protocol_version: u64,
    /// Name of the original file, for reconstruction convenience only.
    pub original_name: String,
    /// Size of the original input in bytes.
    pub original_size: u64,
    /// Size of the zstd stream in bytes.
    pub compressed_size: u64,
    /// Compression parameters.
    pub compression: Compression,
    /// Lowercase hex SHA-256 over the *compressed* byte stream.
    pub file_sha256: String,
    /// Number of chunks; equals `chunks.len()`.
    pub chunk_count: u32,
    /// Ordered chunk entries, strictly increasing in `index`.
    pub chunks: Vec<ChunkRecord>,
    /// Page encoding identifier, `"base29-v5"` for written records.
    pub encoding: String,
    /// Base64 RSA-PSS signature over the canonical rendering, if signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Hex SHA-256 fingerprint of the signer's public key, if signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_fingerprint: Option<String>,
}

/// Top-level field names a strict loader accepts.
pub(crate) const KNOWN_FIELDS: &[&str] = &[
    "protocol_version",
    "original_name",
    "original_size",
    "compressed_size",
    "compression",
    "file_sha256",
    "chunk_count",
    "chunks",
    "encoding",
    "signature",
    "public_key_fingerprint",
];
