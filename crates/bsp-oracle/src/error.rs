//! Oracle client error types.

use thiserror::Error;

/// Errors raised by the coordinate client.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Every retry attempt failed on transport or 5xx.
    #[error("oracle unavailable after {attempts} attempts: {last_error}")]
    Unavailable {
        /// Attempts made before giving up.
        attempts: u32,
        /// The final failure.
        last_error: String,
    },

    /// The service answered but not in the expected structure.
    #[error("oracle protocol error: {reason}")]
    Protocol {
        /// What deviated from the contract.
        reason: String,
    },

    /// The caller's page text is not a valid search input.
    #[error("invalid page text: {reason}")]
    InvalidPage {
        /// Which constraint failed.
        reason: String,
    },

    /// The caller's coordinate violates the domain constraints.
    #[error("invalid coordinate: {reason}")]
    InvalidCoordinate {
        /// Which constraint failed.
        reason: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}
