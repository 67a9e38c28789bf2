//! Offline structural verification of a file record.

use std::fmt;

use crate::record::{FileRecord, KNOWN_PROTOCOL_VERSIONS};
use crate::CHUNK_PAYLOAD_MAX;

/// A single structural defect found in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIssue {
    /// `chunks[i].index != i`.
    NonSequentialIndex {
        /// Position in the `chunks` array.
        position: u32,
        /// Index the entry actually carries.
        found: u32,
    },
    /// `sum(chunks[i].raw_len) != compressed_size`.
    SizeSumMismatch {
        /// Declared compressed size.
        declared: u64,
        /// Sum of the chunk lengths.
        summed: u64,
    },
    /// `chunk_count` disagrees with `chunks.len()` or the payload arithmetic.
    ChunkCountMismatch {
        /// Declared `chunk_count`.
        declared: u32,
        /// Expected count.
        expected: u32,
    },
    /// A chunk entry carries an empty or malformed SHA-256 field.
    MalformedChunkHash {
        /// Index of the chunk.
        index: u32,
    },
    /// A chunk entry's coordinate violates its domain.
    InvalidCoordinate {
        /// Index of the chunk.
        index: u32,
        /// Constraint that failed.
        reason: String,
    },
    /// A chunk declares a payload longer than a page can carry.
    OversizedChunk {
        /// Index of the chunk.
        index: u32,
        /// Declared raw length.
        raw_len: u32,
    },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonSequentialIndex { position, found } => {
                write!(f, "chunk at position {position} carries index {found}")
            }
            Self::SizeSumMismatch { declared, summed } => write!(
                f,
                "chunk lengths sum to {summed} but compressed_size is {declared}"
            ),
            Self::ChunkCountMismatch { declared, expected } => {
                write!(f, "chunk_count is {declared}, expected {expected}")
            }
            Self::MalformedChunkHash { index } => {
                write!(f, "chunk {index} has a malformed sha256 field")
            }
            Self::InvalidCoordinate { index, reason } => {
                write!(f, "chunk {index} coordinate invalid: {reason}")
            }
            Self::OversizedChunk { index, raw_len } => {
                write!(f, "chunk {index} declares {raw_len} bytes, above the page payload cap")
            }
        }
    }
}

/// Result of the offline structural checks.
#[derive(Debug, Clone, Default)]
pub struct StructuralReport {
    /// Defects found; empty means the structure is sound.
    pub issues: Vec<RecordIssue>,
}

impl StructuralReport {
    /// Whether the record passed every structural check.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Run the offline structural checks on a record.
///
/// Covers the sequential-index, size-sum, and chunk-count invariants plus
/// per-chunk field sanity. Signature verification is layered on top by the
/// crypto crate; this function touches no network and no key material.
#[must_use]
pub fn verify_structure(record: &FileRecord) -> StructuralReport {
    let mut report = StructuralReport::default();

    debug_assert!(KNOWN_PROTOCOL_VERSIONS.contains(&record.protocol_version));

    for (position, chunk) in record.chunks.iter().enumerate() {
        let position = u32::try_from(position).unwrap_or(u32::MAX);
        if chunk.index != position {
            report.issues.push(RecordIssue::NonSequentialIndex {
                position,
                found: chunk.index,
            });
        }
        if chunk.sha256.len() != 64 || !chunk.sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            report
                .issues
                .push(RecordIssue::MalformedChunkHash { index: chunk.index });
        }
        if chunk.raw_len as usize > CHUNK_PAYLOAD_MAX {
            report.issues.push(RecordIssue::OversizedChunk {
                index: chunk.index,
                raw_len: chunk.raw_len,
            });
        }
        if let Err(err) = chunk.coordinate.validate() {
            report.issues.push(RecordIssue::InvalidCoordinate {
                index: chunk.index,
                reason: err.to_string(),
            });
        }
    }

    let summed: u64 = record.chunks.iter().map(|c| u64::from(c.raw_len)).sum();
    if summed != record.compressed_size {
        report.issues.push(RecordIssue::SizeSumMismatch {
            declared: record.compressed_size,
            summed,
        });
    }

    let expected = expected_chunk_count(record.compressed_size);
    let len = u32::try_from(record.chunks.len()).unwrap_or(u32::MAX);
    if record.chunk_count != len || record.chunk_count != expected {
        report.issues.push(RecordIssue::ChunkCountMismatch {
            declared: record.chunk_count,
            expected,
        });
    }

    report
}

/// `ceil(compressed_size / CHUNK_PAYLOAD_MAX)`, with a floor of one chunk.
#[must_use]
pub fn expected_chunk_count(compressed_size: u64) -> u32 {
    let max = CHUNK_PAYLOAD_MAX as u64;
    let count = compressed_size.div_ceil(max).max(1);
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkRecord, Compression, Coordinate, ENCODING_NAME, PROTOCOL_VERSION};

    fn record_with_chunks(sizes: &[u32]) -> FileRecord {
        let chunks: Vec<ChunkRecord> = sizes
            .iter()
            .enumerate()
            .map(|(i, len)| ChunkRecord {
                index: u32::try_from(i).unwrap(),
                coordinate: Coordinate::new("abc123", 1, 1, 1, 1).unwrap(),
                raw_len: *len,
                sha256: "00".repeat(32),
            })
            .collect();
        FileRecord {
            protocol_version: PROTOCOL_VERSION,
            original_name: "x".to_string(),
            original_size: 0,
            compressed_size: sizes.iter().map(|s| u64::from(*s)).sum(),
            compression: Compression::zstd_default(),
            file_sha256: "11".repeat(32),
            chunk_count: u32::try_from(sizes.len()).unwrap(),
            chunks,
            encoding: ENCODING_NAME.to_string(),
            signature: None,
            public_key_fingerprint: None,
        }
    }

    #[test]
    fn clean_record_passes() {
        let record = record_with_chunks(&[1850, 1850, 13]);
        assert!(verify_structure(&record).is_clean());
    }

    #[test]
    fn gap_in_indices_detected() {
        let mut record = record_with_chunks(&[1850, 1850, 13]);
        record.chunks[1].index = 5;
        let report = verify_structure(&record);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, RecordIssue::NonSequentialIndex { position: 1, found: 5 })));
    }

    #[test]
    fn size_sum_mismatch_detected() {
        let mut record = record_with_chunks(&[100]);
        record.compressed_size = 99;
        let report = verify_structure(&record);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, RecordIssue::SizeSumMismatch { .. })));
    }

    #[test]
    fn chunk_count_mismatch_detected() {
        let mut record = record_with_chunks(&[100]);
        record.chunk_count = 2;
        let report = verify_structure(&record);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, RecordIssue::ChunkCountMismatch { .. })));
    }

    #[test]
    fn malformed_hash_detected() {
        let mut record = record_with_chunks(&[100]);
        record.chunks[0].sha256 = "nothex".to_string();
        let report = verify_structure(&record);
        assert!(report
            .issues
            .iter()
            .any(|i| matches!(i, RecordIssue::MalformedChunkHash { index: 0 })));
    }

    #[test]
    fn expected_count_arithmetic() {
        assert_eq!(expected_chunk_count(0), 1);
        assert_eq!(expected_chunk_count(1), 1);
        assert_eq!(expected_chunk_count(1850), 1);
        assert_eq!(expected_chunk_count(1851), 2);
        assert_eq!(expected_chunk_count(3701), 3);
    }
}
