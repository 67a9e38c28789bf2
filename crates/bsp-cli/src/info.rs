//! `babel-storage info` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use bsp_core::load_record;
use bsp_engine::{info, EngineError};

/// Arguments for the `info` command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Metadata file to summarize.
    pub metadata: PathBuf,
}

/// Run the info command. No network, no crypto.
///
/// # Errors
///
/// Returns an error if the record cannot be loaded.
pub fn run(args: &InfoArgs) -> Result<()> {
    let record = load_record(&args.metadata, false).map_err(EngineError::from)?;
    print!("{}", info(&record));
    Ok(())
}
