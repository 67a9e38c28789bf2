//! `babel-storage estimate` command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bsp_engine::{estimate, format_duration_secs, format_size, EngineError};

/// Arguments for the `estimate` command.
#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// File to estimate storage requirements for.
    pub file: PathBuf,
}

/// Run the estimate command. Compresses for real; no network.
///
/// # Errors
///
/// Returns an error if the file cannot be read or compression fails.
pub fn run(args: &EstimateArgs) -> Result<()> {
    let input = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let est = estimate(&input).map_err(EngineError::from)?;

    println!("original size:    {}", format_size(est.original_size));
    println!("compressed size:  {}", format_size(est.compressed_size));
    println!("chunks:           {}", est.chunk_count);
    println!("encoding factor:  {:.4} symbols/byte", est.encoding_overhead);
    println!("encoded size:     {}", format_size(est.estimated_encoded_size));
    println!(
        "upload time:      ~{}",
        format_duration_secs(est.estimated_upload_secs)
    );
    println!(
        "download time:    ~{}",
        format_duration_secs(est.estimated_download_secs)
    );
    Ok(())
}
