//! The orchestrator: upload and download pipelines.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use bsp_chunker::{reassemble, split_input, Chunk, ChunkerError};
use bsp_codec::{decode_page, encode_page};
use bsp_core::{ChunkRecord, Compression, Coordinate, FileRecord, ENCODING_NAME,
    PROTOCOL_VERSION};
use bsp_crypto::{sign_and_attach, RsaPrivateKey, RsaPublicKey};
use bsp_oracle::{OracleClient, OracleError};

use crate::error::EngineError;
use crate::operation::Operation;
use crate::verify::verify_metadata;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Concurrent oracle calls per operation. Kept small to respect the
    /// external service.
    pub search_concurrency: usize,
    /// Fetch each page back after search and compare it to what was
    /// stored before accepting the coordinate.
    pub verify_after_upload: bool,
    /// Pause after each accepted chunk during upload.
    pub chunk_pause: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_concurrency: 4,
            verify_after_upload: true,
            chunk_pause: Duration::from_millis(1500),
        }
    }
}

/// Result of a download.
#[derive(Debug)]
pub struct Download {
    /// The reconstructed original bytes.
    pub bytes: Vec<u8>,
    /// Whether every integrity and signature check passed. Always true
    /// when the download ran in strict mode.
    pub verified: bool,
    /// Integrity anomalies observed in non-strict mode.
    pub warnings: Vec<ChunkerError>,
}

/// The storage orchestrator.
///
/// Holds the oracle client and configuration; each operation is
/// independent, sharing nothing but the client's connection pool.
#[derive(Debug, Clone)]
pub struct Engine {
    oracle: OracleClient,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine.
    #[must_use]
    pub const fn new(oracle: OracleClient, config: EngineConfig) -> Self {
        Self { oracle, config }
    }

    /// The configuration this engine runs with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the encode-side pipeline: compress, split, encode, acquire a
    /// coordinate per chunk, assemble and optionally sign the record.
    ///
    /// On any fatal error no partial record is emitted.
    ///
    /// # Errors
    ///
    /// [`EngineError::Chunker`] for input and compression failures,
    /// [`EngineError::Oracle`] after oracle retry exhaustion,
    /// [`EngineError::Cancelled`] if the operation was cancelled.
    pub async fn upload(
        &self,
        input: &[u8],
        original_name: &str,
        signing_key: Option<&RsaPrivateKey>,
        op: &Operation,
    ) -> Result<FileRecord, EngineError> {
        let result = self.upload_inner(input, original_name, signing_key, op).await;
        match &result {
            Ok(record) => {
                if let Some(tracker) = op.tracker() {
                    tracker.complete(format!("uploaded {} chunk(s)", record.chunk_count));
                }
            }
            Err(e) => {
                if let Some(tracker) = op.tracker() {
                    tracker.error(e.to_string());
                }
            }
        }
        result
    }

    async fn upload_inner(
        &self,
        input: &[u8],
        original_name: &str,
        signing_key: Option<&RsaPrivateKey>,
        op: &Operation,
    ) -> Result<FileRecord, EngineError> {
        op.check_cancelled()?;
        op.publish(2, "compressing");
        let plan = split_input(input)?;
        let total = plan.chunks.len();
        info!(
            operation_id = op.id(),
            original_size = plan.original_size,
            compressed_size = plan.compressed_size,
            chunks = total,
            "upload started"
        );

        op.publish(8, format!("encoding {total} chunk(s)"));
        let mut pages = Vec::with_capacity(total);
        for chunk in &plan.chunks {
            pages.push((chunk.index, encode_page(&chunk.bytes)?));
        }

        let semaphore = Arc::new(Semaphore::new(self.config.search_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        for (index, page) in pages {
            // Cancellation stops scheduling; in-flight calls drain below.
            if op.is_cancelled() {
                break;
            }
            let oracle = self.oracle.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = op.cancel_receiver();
            let verify = self.config.verify_after_upload;
            let pause = self.config.chunk_pause;
            join_set.spawn(async move {
                let _permit =
                    semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| EngineError::Internal {
                            reason: "search semaphore closed".to_string(),
                        })?;
                if *cancel.borrow() {
                    return Err(EngineError::Cancelled);
                }
                let coordinate = acquire_coordinate(&oracle, index, &page, verify).await?;
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                Ok((index, coordinate))
            });
        }

        let mut coordinates: Vec<Option<Coordinate>> = vec![None; total];
        let mut done = 0usize;
        let mut cancelled = false;
        while let Some(joined) = join_set.join_next().await {
            let result = joined.map_err(|e| EngineError::Internal {
                reason: format!("search task failed: {e}"),
            })?;
            match result {
                Ok((index, coordinate)) => {
                    coordinates[index as usize] = Some(coordinate);
                    done += 1;
                    let percent = 10 + (done * 85 / total.max(1));
                    op.publish(
                        u8::try_from(percent).unwrap_or(95),
                        format!("chunk {done}/{total} placed"),
                    );
                }
                Err(EngineError::Cancelled) => cancelled = true,
                Err(other) => return Err(other),
            }
        }
        if cancelled || op.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let chunks: Vec<ChunkRecord> = plan
            .chunks
            .iter()
            .zip(coordinates)
            .map(|(chunk, coordinate)| {
                coordinate
                    .ok_or_else(|| EngineError::Internal {
                        reason: format!("chunk {} has no coordinate", chunk.index),
                    })
                    .map(|coordinate| ChunkRecord {
                        index: chunk.index,
                        coordinate,
                        raw_len: chunk.raw_len(),
                        sha256: chunk.sha256_hex(),
                    })
            })
            .collect::<Result<_, _>>()?;

        let mut record = FileRecord {
            protocol_version: PROTOCOL_VERSION,
            original_name: original_name.to_string(),
            original_size: plan.original_size,
            compressed_size: plan.compressed_size,
            compression: Compression::zstd_default(),
            file_sha256: plan.file_sha256,
            chunk_count: u32::try_from(total).unwrap_or(u32::MAX),
            chunks,
            encoding: ENCODING_NAME.to_string(),
            signature: None,
            public_key_fingerprint: None,
        };

        if let Some(key) = signing_key {
            op.publish(97, "signing record");
            sign_and_attach(&mut record, key)?;
        }

        info!(operation_id = op.id(), chunks = total, "upload finished");
        Ok(record)
    }

    /// Run the decode-side pipeline: verify metadata, fetch every page,
    /// decode, reassemble, verify, decompress.
    ///
    /// # Errors
    ///
    /// Under strict mode every hash, length, schema, or signature anomaly
    /// is fatal; in either mode oracle exhaustion, codec failures, and an
    /// undecompressible stream are.
    pub async fn download(
        &self,
        record: &FileRecord,
        public_key: Option<&RsaPublicKey>,
        strict: bool,
        op: &Operation,
    ) -> Result<Download, EngineError> {
        let result = self.download_inner(record, public_key, strict, op).await;
        match &result {
            Ok(download) => {
                if let Some(tracker) = op.tracker() {
                    tracker.complete(format!(
                        "downloaded {} ({})",
                        record.original_name,
                        if download.verified { "verified" } else { "UNVERIFIED" }
                    ));
                }
            }
            Err(e) => {
                if let Some(tracker) = op.tracker() {
                    tracker.error(e.to_string());
                }
            }
        }
        result
    }

    async fn download_inner(
        &self,
        record: &FileRecord,
        public_key: Option<&RsaPublicKey>,
        strict: bool,
        op: &Operation,
    ) -> Result<Download, EngineError> {
        op.check_cancelled()?;
        op.publish(2, "verifying metadata");
        let report = verify_metadata(record, public_key, strict)?;
        if !report.is_clean() {
            warn!(
                operation_id = op.id(),
                issues = report.structural.issues.len(),
                signature = ?report.signature,
                "metadata anomalies, continuing without strict mode"
            );
        }

        let total = record.chunks.len();
        info!(
            operation_id = op.id(),
            name = %record.original_name,
            chunks = total,
            "download started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.search_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        for entry in &record.chunks {
            if op.is_cancelled() {
                break;
            }
            let oracle = self.oracle.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = op.cancel_receiver();
            let index = entry.index;
            let coordinate = entry.coordinate.clone();
            join_set.spawn(async move {
                let _permit =
                    semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| EngineError::Internal {
                            reason: "fetch semaphore closed".to_string(),
                        })?;
                if *cancel.borrow() {
                    return Err(EngineError::Cancelled);
                }
                let page = oracle.fetch(&coordinate).await?;
                Ok((index, page))
            });
        }

        let mut pages: Vec<Option<String>> = vec![None; total];
        let mut done = 0usize;
        let mut cancelled = false;
        while let Some(joined) = join_set.join_next().await {
            let result = joined.map_err(|e| EngineError::Internal {
                reason: format!("fetch task failed: {e}"),
            })?;
            match result {
                Ok((index, page)) => {
                    let slot = pages.get_mut(index as usize).ok_or_else(|| {
                        EngineError::Record(bsp_core::RecordError::Schema {
                            reason: format!("chunk index {index} out of range"),
                        })
                    })?;
                    *slot = Some(page);
                    done += 1;
                    let percent = 5 + (done * 80 / total.max(1));
                    op.publish(
                        u8::try_from(percent).unwrap_or(85),
                        format!("chunk {done}/{total} fetched"),
                    );
                }
                Err(EngineError::Cancelled) => cancelled = true,
                Err(other) => return Err(other),
            }
        }
        if cancelled || op.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        op.publish(90, "decoding and reassembling");
        let mut chunks = Vec::with_capacity(total);
        for (i, page) in pages.into_iter().enumerate() {
            let page = page.ok_or_else(|| EngineError::Internal {
                reason: format!("chunk {i} has no page"),
            })?;
            chunks.push(Chunk {
                index: u32::try_from(i).unwrap_or(u32::MAX),
                bytes: decode_page(&page)?,
            });
        }

        let reassembled = reassemble(chunks, record, strict)?;
        let verified = reassembled.verified && report.is_clean();

        info!(
            operation_id = op.id(),
            bytes = reassembled.bytes.len(),
            verified,
            "download finished"
        );
        Ok(Download {
            bytes: reassembled.bytes,
            verified,
            warnings: reassembled.warnings,
        })
    }
}

/// Search a page's coordinate, optionally fetching it back to confirm the
/// stored text matches before accepting.
async fn acquire_coordinate(
    oracle: &OracleClient,
    index: u32,
    page: &str,
    verify: bool,
) -> Result<Coordinate, EngineError> {
    const VERIFY_ATTEMPTS: u32 = 3;

    let mut attempt = 0;
    loop {
        attempt += 1;
        let coordinate = oracle.search(page).await?;
        if !verify {
            return Ok(coordinate);
        }
        let fetched = oracle.fetch(&coordinate).await?;
        if fetched == page {
            return Ok(coordinate);
        }
        if attempt >= VERIFY_ATTEMPTS {
            return Err(EngineError::Oracle(OracleError::Protocol {
                reason: format!("chunk {index}: page at {coordinate} does not match stored text"),
            }));
        }
        warn!(index, attempt, "post-upload verification mismatch, retrying");
    }
}
