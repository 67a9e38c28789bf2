//! Offline operations: metadata verification and the info summary.
//!
//! Both are pure: no network, no mutation. `info` additionally touches no
//! key material.

use std::fmt::Write as _;

use bsp_core::{verify_structure, FileRecord, RecordError, StructuralReport};
use bsp_crypto::{verify_record, RsaPublicKey, SignatureError};

use crate::error::EngineError;
use crate::format::format_size;

/// Outcome of the signature portion of metadata verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Signature present and verified against the supplied key.
    Verified,
    /// Signature present but no key was supplied to check it with.
    PresentUnchecked,
    /// No signature on the record and no key supplied.
    Absent,
    /// Key supplied but the record carries no signature.
    Missing,
    /// Signature present but verification failed.
    Invalid,
}

/// Combined result of `verify-metadata`.
#[derive(Debug, Clone)]
pub struct MetadataReport {
    /// Structural invariant checks.
    pub structural: StructuralReport,
    /// Signature check outcome.
    pub signature: SignatureStatus,
}

impl MetadataReport {
    /// Whether nothing objectionable was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.structural.is_clean()
            && matches!(
                self.signature,
                SignatureStatus::Verified
                    | SignatureStatus::Absent
                    | SignatureStatus::PresentUnchecked
            )
    }
}

/// Offline checks: schema invariants and, when a key is supplied, the
/// signature.
///
/// Under `strict` any structural issue or signature anomaly is promoted to
/// an error; otherwise the report carries the findings.
///
/// # Errors
///
/// Under strict mode: [`EngineError::Record`] for structural issues,
/// [`EngineError::Signature`] for a missing or invalid signature.
pub fn verify_metadata(
    record: &FileRecord,
    public_key: Option<&RsaPublicKey>,
    strict: bool,
) -> Result<MetadataReport, EngineError> {
    let structural = verify_structure(record);

    let signature = match (record.signature.as_ref(), public_key) {
        (Some(_), Some(key)) => match verify_record(record, key) {
            Ok(()) => SignatureStatus::Verified,
            Err(SignatureError::BadSignature) => SignatureStatus::Invalid,
            Err(other) => return Err(other.into()),
        },
        (Some(_), None) => SignatureStatus::PresentUnchecked,
        (None, Some(_)) => SignatureStatus::Missing,
        (None, None) => SignatureStatus::Absent,
    };

    if strict {
        if let Some(first) = structural.issues.first() {
            return Err(EngineError::Record(RecordError::Schema {
                reason: format!(
                    "{first} ({} structural issue(s) total)",
                    structural.issues.len()
                ),
            }));
        }
        match signature {
            SignatureStatus::Invalid => {
                return Err(EngineError::Signature(SignatureError::BadSignature));
            }
            SignatureStatus::Missing => {
                return Err(EngineError::Signature(SignatureError::MissingSignature));
            }
            _ => {}
        }
    }

    Ok(MetadataReport {
        structural,
        signature,
    })
}

/// Human-readable summary of a record. No network, no crypto.
#[must_use]
pub fn info(record: &FileRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File:            {}", record.original_name);
    let _ = writeln!(
        out,
        "Size:            {} ({} compressed)",
        format_size(record.original_size),
        format_size(record.compressed_size)
    );
    let _ = writeln!(
        out,
        "Compression:     {} level {}",
        record.compression.algorithm, record.compression.level
    );
    let _ = writeln!(out, "Encoding:        {}", record.encoding);
    let _ = writeln!(out, "Protocol:        v{}", record.protocol_version);
    let _ = writeln!(out, "File SHA-256:    {}", record.file_sha256);
    let _ = writeln!(
        out,
        "Signature:       {}",
        match (&record.signature, &record.public_key_fingerprint) {
            (Some(_), Some(fp)) => format!("present (key {})", &fp[..fp.len().min(16)]),
            (Some(_), None) => "present".to_string(),
            _ => "none".to_string(),
        }
    );
    let _ = writeln!(out, "Chunks:          {}", record.chunk_count);
    for chunk in &record.chunks {
        let _ = writeln!(
            out,
            "  [{:03}] {:>7} bytes | {}... | {}",
            chunk.index,
            chunk.raw_len,
            &chunk.sha256[..chunk.sha256.len().min(12)],
            chunk.coordinate.short()
        );
    }
    out
}
