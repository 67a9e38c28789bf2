//! Persisted metadata envelope: gzipped UTF-8 JSON.
//!
//! The outer JSON object is the [`FileRecord`] schema; the only framing is
//! gzip's own. On read the loader gates the protocol version against the
//! known set and, under strict mode, rejects unknown top-level fields.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use tracing::debug;

use crate::error::RecordError;
use crate::record::{FileRecord, KNOWN_FIELDS, KNOWN_PROTOCOL_VERSIONS};

/// Serialize a record to the persisted gzipped-JSON form.
///
/// # Errors
///
/// Returns [`RecordError::Json`] or [`RecordError::Io`] on serialization
/// or compression failure.
pub fn to_gzipped_json(record: &FileRecord) -> Result<Vec<u8>, RecordError> {
    let json = serde_json::to_vec(record)?;
    let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Parse a record from its persisted gzipped-JSON form.
///
/// The protocol version is always gated against `{1..=5}`. Under `strict`,
/// top-level fields outside the record schema are rejected as well.
///
/// # Errors
///
/// Returns [`RecordError::UnsupportedProtocolVersion`] for versions outside
/// the known set, [`RecordError::Schema`] for structural violations, and
/// [`RecordError::Io`]/[`RecordError::Json`] for transport-level failures.
pub fn from_gzipped_json(bytes: &[u8], strict: bool) -> Result<FileRecord, RecordError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;

    let value: serde_json::Value = serde_json::from_slice(&json)?;
    let object = value.as_object().ok_or_else(|| RecordError::Schema {
        reason: "top-level JSON value is not an object".to_string(),
    })?;

    let version = object
        .get("protocol_version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| RecordError::Schema {
            reason: "missing or non-integer protocol_version".to_string(),
        })?;
    if !KNOWN_PROTOCOL_VERSIONS.contains(&version) {
        return Err(RecordError::UnsupportedProtocolVersion { version });
    }

    if strict {
        for key in object.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                return Err(RecordError::Schema {
                    reason: format!("unknown top-level field {key:?}"),
                });
            }
        }
    }

    let record: FileRecord = serde_json::from_value(value)?;
    debug!(
        protocol_version = record.protocol_version,
        chunk_count = record.chunk_count,
        "loaded metadata record"
    );
    Ok(record)
}

/// Write a record to disk in the persisted form.
///
/// # Errors
///
/// Propagates serialization and filesystem errors.
pub fn save_record(record: &FileRecord, path: &Path) -> Result<(), RecordError> {
    let bytes = to_gzipped_json(record)?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved metadata record");
    Ok(())
}

/// Load a record from disk.
///
/// # Errors
///
/// Propagates filesystem errors and everything [`from_gzipped_json`]
/// rejects.
pub fn load_record(path: &Path, strict: bool) -> Result<FileRecord, RecordError> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    from_gzipped_json(&bytes, strict)
}
