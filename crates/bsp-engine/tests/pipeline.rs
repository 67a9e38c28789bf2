//! End-to-end pipeline tests against the mock Library service.

use std::time::Duration;

use bsp_chunker::ChunkerError;
use bsp_core::{expected_chunk_count, CHUNK_PAYLOAD_MAX, PROTOCOL_VERSION};
use bsp_crypto::{generate_keypair, SignatureError};
use bsp_engine::{
    Download, Engine, EngineConfig, EngineError, Operation, OperationState,
};
use bsp_oracle::{OracleClient, OracleConfig};
use bsp_testkit::{deterministic_bytes, MockOracle};

fn test_engine(oracle: &MockOracle) -> Engine {
    let client = OracleClient::new(OracleConfig {
        base_url: oracle.base_url(),
        timeout: Duration::from_secs(5),
        max_attempts: 5,
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    })
    .unwrap();
    Engine::new(
        client,
        EngineConfig {
            search_concurrency: 4,
            verify_after_upload: true,
            chunk_pause: Duration::ZERO,
        },
    )
}

async fn roundtrip(input: &[u8]) -> (Engine, bsp_core::FileRecord, Download) {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let op = Operation::detached("upload");
    let record = engine.upload(input, "input.bin", None, &op).await.unwrap();

    let op = Operation::detached("download");
    let download = engine.download(&record, None, true, &op).await.unwrap();
    (engine, record, download)
}

#[tokio::test]
async fn small_file_roundtrip() {
    let input = vec![0x41u8; 100];
    let (_, record, download) = roundtrip(&input).await;

    assert_eq!(record.protocol_version, PROTOCOL_VERSION);
    assert_eq!(record.chunk_count, 1);
    assert_eq!(record.original_size, 100);
    assert!(download.verified);
    assert_eq!(download.bytes, input);
}

#[tokio::test]
async fn empty_file_roundtrip() {
    let (_, record, download) = roundtrip(&[]).await;
    // zstd of the empty input is non-empty, so there is still one chunk.
    assert_eq!(record.chunk_count, 1);
    assert!(record.compressed_size > 0);
    assert!(download.bytes.is_empty());
    assert!(download.verified);
}

#[tokio::test]
async fn multi_chunk_roundtrip() {
    // Incompressible input well past two chunk payloads.
    let input = deterministic_bytes(2 * CHUNK_PAYLOAD_MAX + 1, 7);
    let (_, record, download) = roundtrip(&input).await;

    assert!(record.chunk_count >= 3);
    assert_eq!(record.chunk_count, expected_chunk_count(record.compressed_size));
    let summed: u64 = record.chunks.iter().map(|c| u64::from(c.raw_len)).sum();
    assert_eq!(summed, record.compressed_size);

    let distinct: std::collections::HashSet<&str> =
        record.chunks.iter().map(|c| c.sha256.as_str()).collect();
    assert_eq!(distinct.len(), record.chunks.len());

    assert_eq!(download.bytes, input);
}

#[tokio::test]
async fn upload_survives_transient_oracle_failures() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);
    oracle.fail_next_searches(3);

    let op = Operation::detached("upload");
    let record = engine
        .upload(b"transient failure drill", "drill.bin", None, &op)
        .await
        .unwrap();
    assert_eq!(record.chunk_count, 1);
}

#[tokio::test]
async fn upload_fails_when_oracle_stays_down() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);
    oracle.fail_next_searches(50);

    let op = Operation::detached("upload");
    let err = engine
        .upload(b"the service is gone", "gone.bin", None, &op)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Oracle(bsp_oracle::OracleError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn tampered_chunk_hash_fails_strict_download() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let op = Operation::detached("upload");
    let mut record = engine
        .upload(b"strict mode drill", "strict.bin", None, &op)
        .await
        .unwrap();
    // Flip one hex digit of one chunk hash.
    let mut hash = record.chunks[0].sha256.clone().into_bytes();
    hash[0] = if hash[0] == b'0' { b'1' } else { b'0' };
    record.chunks[0].sha256 = String::from_utf8(hash).unwrap();

    let op = Operation::detached("download");
    let err = engine.download(&record, None, true, &op).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Chunker(ChunkerError::ChunkHashMismatch { index: 0 })
    ));
}

#[tokio::test]
async fn corrupted_page_fails_strict_download() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let input = b"silent corruption drill".repeat(10);
    let op = Operation::detached("upload");
    let record = engine.upload(&input, "corrupt.bin", None, &op).await.unwrap();
    // Corrupt the stored page itself; the hash check runs before
    // decompression, so strict mode refuses deterministically.
    assert!(oracle.corrupt_page(&record.chunks[0].coordinate));

    let op = Operation::detached("download");
    let err = engine.download(&record, None, true, &op).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Chunker(ChunkerError::ChunkHashMismatch { index: 0 })
    ));
}

#[tokio::test]
async fn record_hash_anomaly_degrades_in_non_strict_mode() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let input = b"non-strict degradation drill".repeat(10);
    let op = Operation::detached("upload");
    let mut record = engine.upload(&input, "warn.bin", None, &op).await.unwrap();
    // The stored pages are intact; only the record's hash entry lies.
    record.chunks[0].sha256 = "00".repeat(32);

    let op = Operation::detached("download");
    let download = engine.download(&record, None, false, &op).await.unwrap();
    assert_eq!(download.bytes, input);
    assert!(!download.verified);
    assert!(download
        .warnings
        .iter()
        .any(|w| matches!(w, ChunkerError::ChunkHashMismatch { index: 0 })));
}

#[tokio::test]
async fn signed_roundtrip_and_tamper_detection() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);
    let (private, public) = generate_keypair(1024).unwrap();

    let op = Operation::detached("upload");
    let mut record = engine
        .upload(b"signed pipeline drill", "signed.bin", Some(&private), &op)
        .await
        .unwrap();
    assert!(record.signature.is_some());
    assert!(record.public_key_fingerprint.is_some());

    let op = Operation::detached("download");
    let download = engine
        .download(&record, Some(&public), true, &op)
        .await
        .unwrap();
    assert!(download.verified);

    // Tamper after signing: strict verification must refuse.
    record.original_name = "renamed.bin".to_string();
    let op = Operation::detached("download");
    let err = engine
        .download(&record, Some(&public), true, &op)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Signature(SignatureError::BadSignature)
    ));
}

#[tokio::test]
async fn cancelled_before_start() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let (op, handle) = Operation::with_progress("upload");
    handle.cancel();
    let err = engine
        .upload(b"never starts", "cancelled.bin", None, &op)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(handle.progress().borrow().state, OperationState::Error);
}

#[tokio::test]
async fn progress_reaches_completion() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let (op, handle) = Operation::with_progress("upload");
    let record = engine
        .upload(b"progress drill", "progress.bin", None, &op)
        .await
        .unwrap();
    let sample = handle.progress().borrow().clone();
    assert_eq!(sample.state, OperationState::Completed);
    assert_eq!(sample.percent, 100);
    assert_eq!(record.chunk_count, 1);
}

#[tokio::test]
async fn oracle_stores_one_page_per_chunk() {
    let oracle = MockOracle::start().await;
    let engine = test_engine(&oracle);

    let input = deterministic_bytes(4000, 99);
    let op = Operation::detached("upload");
    let record = engine.upload(&input, "pages.bin", None, &op).await.unwrap();
    assert_eq!(oracle.stored_page_count(), record.chunks.len());
}
