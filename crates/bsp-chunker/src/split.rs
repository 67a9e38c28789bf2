//! Encode-side pipeline: compress, hash, split.

use sha2::{Digest, Sha256};
use tracing::debug;

use bsp_core::{CHUNK_PAYLOAD_MAX, MAX_INPUT_SIZE};

use crate::error::ChunkerError;
use crate::COMPRESSION_LEVEL;

/// A contiguous slice of the compressed stream, at most
/// [`CHUNK_PAYLOAD_MAX`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the compressed stream.
    pub index: u32,
    /// The chunk's bytes.
    pub bytes: Vec<u8>,
}

impl Chunk {
    /// Byte length of this chunk.
    #[must_use]
    pub fn raw_len(&self) -> u32 {
        u32::try_from(self.bytes.len()).unwrap_or(u32::MAX)
    }

    /// Lowercase hex SHA-256 of the chunk bytes.
    #[must_use]
    pub fn sha256_hex(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

/// The compressed stream split into ordered chunks, plus the material the
/// record needs.
#[derive(Debug, Clone)]
pub struct SplitPlan {
    /// Size of the original input in bytes.
    pub original_size: u64,
    /// Size of the compressed stream in bytes.
    pub compressed_size: u64,
    /// Lowercase hex SHA-256 over the compressed stream.
    pub file_sha256: String,
    /// The chunks, strictly increasing in index.
    pub chunks: Vec<Chunk>,
}

/// Lowercase hex SHA-256 of arbitrary bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compress with zstd at the protocol level.
///
/// # Errors
///
/// Returns [`ChunkerError::Compression`] on encoder failure.
pub fn compress(input: &[u8]) -> Result<Vec<u8>, ChunkerError> {
    zstd::encode_all(input, COMPRESSION_LEVEL).map_err(|e| ChunkerError::Compression {
        reason: e.to_string(),
    })
}

/// Decompress a zstd stream.
///
/// # Errors
///
/// Returns [`ChunkerError::Decompression`] if the stream is corrupt.
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>, ChunkerError> {
    zstd::decode_all(compressed).map_err(|e| ChunkerError::Decompression {
        reason: e.to_string(),
    })
}

/// Run the full encode-side pipeline: compress, hash, split.
///
/// The empty input is legal; zstd's frame overhead means it still produces
/// one chunk.
///
/// # Errors
///
/// Returns [`ChunkerError::BadInput`] for inputs above the size cap and
/// [`ChunkerError::Compression`] on encoder failure.
pub fn split_input(input: &[u8]) -> Result<SplitPlan, ChunkerError> {
    if input.len() as u64 > MAX_INPUT_SIZE {
        return Err(ChunkerError::BadInput {
            reason: format!(
                "input is {} bytes, above the {MAX_INPUT_SIZE}-byte cap",
                input.len()
            ),
        });
    }

    let compressed = compress(input)?;
    let file_sha256 = sha256_hex(&compressed);

    let chunks: Vec<Chunk> = compressed
        .chunks(CHUNK_PAYLOAD_MAX)
        .enumerate()
        .map(|(index, bytes)| Chunk {
            index: u32::try_from(index).unwrap_or(u32::MAX),
            bytes: bytes.to_vec(),
        })
        .collect();

    debug!(
        original_size = input.len(),
        compressed_size = compressed.len(),
        chunk_count = chunks.len(),
        "split input into chunks"
    );

    Ok(SplitPlan {
        original_size: input.len() as u64,
        compressed_size: compressed.len() as u64,
        file_sha256,
        chunks,
    })
}
