//! `babel-storage download` command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bsp_core::load_record;
use bsp_crypto::load_public_key_pem;
use bsp_engine::EngineError;

use crate::context::{build_engine, start_operation};

/// Arguments for the `download` command.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Metadata file to reconstruct from.
    pub metadata: PathBuf,

    /// Destination for the reconstructed file.
    #[arg(long)]
    pub output: PathBuf,

    /// SubjectPublicKeyInfo PEM public key; enables signature
    /// verification.
    #[arg(long)]
    pub pubkey: Option<PathBuf>,

    /// Fatalize every hash, length, schema, or signature anomaly.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Suppress progress emission.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

/// Run the download command.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded, reconstruction fails,
/// or the output cannot be written.
pub async fn run(args: DownloadArgs, base_url: Option<String>) -> Result<()> {
    let record = load_record(&args.metadata, args.strict).map_err(EngineError::from)?;
    let public_key = match &args.pubkey {
        Some(path) => Some(load_public_key_pem(path).map_err(EngineError::from)?),
        None => None,
    };

    let engine = build_engine(base_url)?;
    let (op, _handle) = start_operation("download", args.quiet);

    let download = engine
        .download(&record, public_key.as_ref(), args.strict, &op)
        .await?;

    fs::write(&args.output, &download.bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if download.verified {
        println!(
            "downloaded {} -> {} ({} bytes, verified)",
            record.original_name,
            args.output.display(),
            download.bytes.len()
        );
    } else {
        println!(
            "downloaded {} -> {} ({} bytes, UNVERIFIED: {} anomaly(ies))",
            record.original_name,
            args.output.display(),
            download.bytes.len(),
            download.warnings.len()
        );
        for warning in &download.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(())
}
