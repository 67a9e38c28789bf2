//! babel-storage CLI entrypoint.
//!
//! Sub-commands map one-to-one onto the engine operations:
//! - `upload` - store a file, emit its metadata record
//! - `download` - reconstruct a file from its metadata record
//! - `verify-metadata` - offline structural and signature checks
//! - `info` - human-readable record summary
//! - `estimate` - predicted storage cost of a file
//! - `keygen` - generate an RSA-4096 signing key pair
//!
//! Exit codes: 0 success, 2 usage error, 3 integrity/signature failure,
//! 4 oracle failure, 1 anything else.

#![forbid(unsafe_code)]

mod context;
mod download;
mod estimate;
mod info;
mod keygen;
mod upload;
mod verify_metadata;

use clap::{Parser, Subcommand};

use bsp_chunker::ChunkerError;
use bsp_core::RecordError;
use bsp_engine::EngineError;

/// Store files as coordinates into the Library of Babel.
#[derive(Parser)]
#[command(name = "babel-storage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the Library service.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and write its metadata record.
    ///
    /// The record is the only artifact needed (and the only one kept) to
    /// get the file back; losing it loses the file.
    Upload(upload::UploadArgs),

    /// Reconstruct a file from a metadata record.
    Download(download::DownloadArgs),

    /// Verify a metadata record offline: schema invariants and, with
    /// --pubkey, the signature. No network.
    VerifyMetadata(verify_metadata::VerifyMetadataArgs),

    /// Print a human-readable summary of a metadata record.
    Info(info::InfoArgs),

    /// Estimate the storage cost of uploading a file.
    Estimate(estimate::EstimateArgs),

    /// Generate an RSA-4096 key pair for record signing.
    Keygen(keygen::KeygenArgs),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean for command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let base_url = cli.base_url;

    let result = match cli.command {
        Commands::Upload(args) => upload::run(args, base_url).await,
        Commands::Download(args) => download::run(args, base_url).await,
        Commands::VerifyMetadata(args) => verify_metadata::run(&args),
        Commands::Info(args) => info::run(&args),
        Commands::Estimate(args) => estimate::run(&args),
        Commands::Keygen(args) => keygen::run(&args),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Map a failure to the documented exit codes.
fn exit_code(err: &anyhow::Error) -> i32 {
    let Some(engine_error) = err.downcast_ref::<EngineError>() else {
        return 1;
    };
    match engine_error {
        EngineError::Codec(_) | EngineError::Signature(_) => 3,
        EngineError::Chunker(e) => match e {
            ChunkerError::ChunkHashMismatch { .. }
            | ChunkerError::ChunkLengthMismatch { .. }
            | ChunkerError::FileHashMismatch { .. }
            | ChunkerError::ChunkCountMismatch { .. } => 3,
            _ => 1,
        },
        EngineError::Record(e) => match e {
            RecordError::Schema { .. }
            | RecordError::UnsupportedProtocolVersion { .. }
            | RecordError::InvalidCoordinate { .. } => 3,
            _ => 1,
        },
        EngineError::Oracle(_) => 4,
        _ => 1,
    }
}
