//! `babel-storage upload` command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bsp_core::save_record;
use bsp_crypto::load_private_key_pem;
use bsp_engine::EngineError;

use crate::context::{build_engine, start_operation};

/// Arguments for the `upload` command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload.
    pub file: PathBuf,

    /// Output metadata file (gzipped JSON).
    #[arg(long)]
    pub metadata: PathBuf,

    /// PKCS#8 PEM private key; enables record signing.
    #[arg(long)]
    pub privkey: Option<PathBuf>,

    /// Suppress progress emission.
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

/// Run the upload command.
///
/// # Errors
///
/// Returns an error if the input or key cannot be read, the upload fails,
/// or the metadata cannot be written.
pub async fn run(args: UploadArgs, base_url: Option<String>) -> Result<()> {
    let input = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let original_name = args
        .file
        .file_name()
        .map_or_else(|| "unnamed".to_string(), |n| n.to_string_lossy().into_owned());

    let signing_key = match &args.privkey {
        Some(path) => Some(load_private_key_pem(path).map_err(EngineError::from)?),
        None => None,
    };

    let engine = build_engine(base_url)?;
    let (op, _handle) = start_operation("upload", args.quiet);

    let record = engine
        .upload(&input, &original_name, signing_key.as_ref(), &op)
        .await?;
    save_record(&record, &args.metadata).map_err(EngineError::from)?;

    println!(
        "uploaded {original_name}: {} chunk(s), metadata at {}",
        record.chunk_count,
        args.metadata.display()
    );
    Ok(())
}
