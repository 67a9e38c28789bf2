//! `babel-storage verify-metadata` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use bsp_core::load_record;
use bsp_crypto::load_public_key_pem;
use bsp_engine::{verify_metadata, EngineError, SignatureStatus};

/// Arguments for the `verify-metadata` command.
#[derive(Args, Debug)]
pub struct VerifyMetadataArgs {
    /// Metadata file to verify.
    pub metadata: PathBuf,

    /// SubjectPublicKeyInfo PEM public key; enables signature
    /// verification.
    #[arg(long)]
    pub pubkey: Option<PathBuf>,

    /// Fatalize every schema or signature anomaly.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

/// Run the verify-metadata command. Offline: no network, no chunk data.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded or, under strict mode,
/// if any anomaly is found.
pub fn run(args: &VerifyMetadataArgs) -> Result<()> {
    let record = load_record(&args.metadata, args.strict).map_err(EngineError::from)?;
    let public_key = match &args.pubkey {
        Some(path) => Some(load_public_key_pem(path).map_err(EngineError::from)?),
        None => None,
    };

    let report = verify_metadata(&record, public_key.as_ref(), args.strict)?;

    println!("protocol version: v{}", record.protocol_version);
    println!("chunks:           {}", record.chunk_count);
    println!(
        "structure:        {}",
        if report.structural.is_clean() {
            "ok".to_string()
        } else {
            format!("{} issue(s)", report.structural.issues.len())
        }
    );
    for issue in &report.structural.issues {
        println!("  - {issue}");
    }
    println!(
        "signature:        {}",
        match report.signature {
            SignatureStatus::Verified => "verified",
            SignatureStatus::PresentUnchecked => "present (no key supplied)",
            SignatureStatus::Absent => "none",
            SignatureStatus::Missing => "MISSING (key supplied, record unsigned)",
            SignatureStatus::Invalid => "INVALID",
        }
    );

    if report.is_clean() {
        println!("metadata ok");
        Ok(())
    } else {
        // Non-strict mode reports and still exits with the integrity code.
        Err(EngineError::Record(bsp_core::RecordError::Schema {
            reason: "metadata verification found anomalies".to_string(),
        })
        .into())
    }
}
