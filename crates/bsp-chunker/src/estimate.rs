//! Storage estimation: what uploading an input would cost.

use bsp_codec::encoding_overhead;

use crate::error::ChunkerError;
use crate::split::compress;

/// Per-chunk time guesses used for the coarse duration estimates, in
/// seconds. Uploads pay a search plus a verification fetch.
const UPLOAD_SECS_PER_CHUNK: u64 = 2;
const DOWNLOAD_SECS_PER_CHUNK: u64 = 1;

/// Predicted storage cost of an input.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEstimate {
    /// Input size in bytes.
    pub original_size: u64,
    /// zstd stream size in bytes.
    pub compressed_size: u64,
    /// Chunks the stream splits into.
    pub chunk_count: u32,
    /// Symbols-per-byte factor of the page encoding.
    pub encoding_overhead: f64,
    /// Total page symbols the chunks will occupy, before padding.
    pub estimated_encoded_size: u64,
    /// Coarse upload duration guess in seconds.
    pub estimated_upload_secs: u64,
    /// Coarse download duration guess in seconds.
    pub estimated_download_secs: u64,
}

/// Estimate storage requirements by running the real compressor.
///
/// Chunks are slices of the zstd stream, not of the input, so the estimate
/// compresses for real instead of guessing a ratio.
///
/// # Errors
///
/// Returns [`ChunkerError::Compression`] on encoder failure.
pub fn estimate(input: &[u8]) -> Result<StorageEstimate, ChunkerError> {
    let compressed_size = compress(input)?.len() as u64;
    let chunk_count = bsp_core::expected_chunk_count(compressed_size);
    let overhead = encoding_overhead();

    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let estimated_encoded_size = (compressed_size as f64 * overhead).ceil() as u64;


    Ok(StorageEstimate {
        original_size: input.len() as u64,
        compressed_size,
        chunk_count,
        encoding_overhead: overhead,
        estimated_encoded_size,
        estimated_upload_secs: u64::from(chunk_count) * UPLOAD_SECS_PER_CHUNK,
        estimated_download_secs: u64::from(chunk_count) * DOWNLOAD_SECS_PER_CHUNK,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_small_input() {
        let est = estimate(&[0x41; 100]).unwrap();
        assert_eq!(est.original_size, 100);
        assert!(est.compressed_size > 0);
        assert_eq!(est.chunk_count, 1);
        assert!(est.encoding_overhead > 1.64 && est.encoding_overhead < 1.65);
        assert_eq!(est.estimated_upload_secs, 2);
        assert_eq!(est.estimated_download_secs, 1);
    }

    #[test]
    fn estimate_scales_with_chunks() {
        let input: Vec<u8> = (0..10_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 11) as u8)
            .collect();
        let est = estimate(&input).unwrap();
        assert!(est.chunk_count > 1);
        assert_eq!(
            est.chunk_count,
            bsp_core::expected_chunk_count(est.compressed_size)
        );
        assert!(est.estimated_encoded_size > est.compressed_size);
    }
}
