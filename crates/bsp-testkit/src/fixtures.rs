//! Small deterministic fixtures shared across the workspace's tests.

use bsp_core::{
    ChunkRecord, Compression, Coordinate, FileRecord, ENCODING_NAME, PROTOCOL_VERSION,
};

/// Deterministic pseudo-random bytes (xorshift), reproducible across runs.
#[must_use]
pub fn deterministic_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// A structurally sound single-chunk record with placeholder hashes.
#[must_use]
pub fn sample_record() -> FileRecord {
    FileRecord {
        protocol_version: PROTOCOL_VERSION,
        original_name: "fixture.bin".to_string(),
        original_size: 64,
        compressed_size: 73,
        compression: Compression::zstd_default(),
        file_sha256: "ab".repeat(32),
        chunk_count: 1,
        chunks: vec![ChunkRecord {
            index: 0,
            coordinate: Coordinate::new("0123abcd", 1, 2, 3, 4).expect("fixture coordinate"),
            raw_len: 73,
            sha256: "cd".repeat(32),
        }],
        encoding: ENCODING_NAME.to_string(),
        signature: None,
        public_key_fingerprint: None,
    }
}
