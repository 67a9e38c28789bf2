//! Shared wiring: engine construction, progress printing, Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use bsp_engine::{Engine, EngineConfig, EngineError, Operation, OperationHandle, OperationState};
use bsp_oracle::{OracleClient, OracleConfig};
use tracing::warn;

/// Build an engine against the given (or default) service base URL.
pub fn build_engine(base_url: Option<String>) -> Result<Engine> {
    let config = base_url.map_or_else(OracleConfig::default, |base_url| OracleConfig {
        base_url,
        ..OracleConfig::default()
    });
    let client = OracleClient::new(config).map_err(EngineError::from)?;
    Ok(Engine::new(client, EngineConfig::default()))
}

/// Create an operation, honoring `--quiet`.
///
/// With progress enabled, samples are rendered to stderr and Ctrl-C
/// requests cancellation instead of killing the process mid-flight.
pub fn start_operation(kind: &str, quiet: bool) -> (Operation, Option<Arc<OperationHandle>>) {
    if quiet {
        return (Operation::detached(kind), None);
    }

    let (op, handle) = Operation::with_progress(kind);
    let handle = Arc::new(handle);

    let mut rx = handle.progress();
    tokio::spawn(async move {
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let sample = rx.borrow_and_update().clone();
            eprintln!("[{:>3}%] {}", sample.percent, sample.message);
            if matches!(
                sample.state,
                OperationState::Completed | OperationState::Error
            ) {
                break;
            }
        }
    });

    let cancel_handle = Arc::clone(&handle);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            cancel_handle.cancel();
        }
    });

    (op, Some(handle))
}
