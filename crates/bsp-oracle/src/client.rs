//! HTTP client for the coordinate service.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use bsp_codec::is_alphabet_text;
use bsp_core::{Coordinate, PAGE_SIZE};

use crate::error::OracleError;
use crate::parse::{parse_browse_response, parse_search_response};

/// Default service base URL.
const DEFAULT_BASE_URL: &str = "https://libraryofbabel.info";

/// User agent announced on every request.
const USER_AGENT: &str = concat!("babel-storage/", env!("CARGO_PKG_VERSION"));

/// Client configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Service base URL; `{base}/search` and `{base}/browse` are derived
    /// from it.
    pub base_url: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Client for the Library of Babel coordinate service.
///
/// `search` and `fetch` retry transport errors and 5xx responses with
/// exponential backoff; 4xx responses and structural parse failures fail
/// immediately.
#[derive(Debug, Clone)]
pub struct OracleClient {
    client: Client,
    config: OracleConfig,
}

impl OracleClient {
    /// Create a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client against a non-default base URL, keeping the other
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, OracleError> {
        Self::new(OracleConfig {
            base_url: base_url.into(),
            ..OracleConfig::default()
        })
    }

    /// The configuration this client runs with.
    #[must_use]
    pub const fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Map a page text to the coordinate it lives at.
    ///
    /// The service is deterministic: the same input always returns the
    /// same coordinate.
    ///
    /// # Errors
    ///
    /// [`OracleError::InvalidPage`] for malformed input,
    /// [`OracleError::Unavailable`] after retry exhaustion,
    /// [`OracleError::Protocol`] for an unparseable response.
    pub async fn search(&self, page_text: &str) -> Result<Coordinate, OracleError> {
        if page_text.len() != PAGE_SIZE {
            return Err(OracleError::InvalidPage {
                reason: format!("length {} != {PAGE_SIZE}", page_text.len()),
            });
        }
        if !is_alphabet_text(page_text) {
            return Err(OracleError::InvalidPage {
                reason: "contains non-alphabet symbols".to_string(),
            });
        }

        let url = format!("{}/search", self.config.base_url);
        let html = self
            .request_with_retry("search", || {
                self.client.post(&url).form(&[("content", page_text)])
            })
            .await?;
        parse_search_response(&html)
    }

    /// Fetch the page text stored at a coordinate.
    ///
    /// # Errors
    ///
    /// [`OracleError::InvalidCoordinate`] for out-of-domain input,
    /// [`OracleError::Unavailable`] after retry exhaustion,
    /// [`OracleError::Protocol`] for an unparseable or malformed page.
    pub async fn fetch(&self, coordinate: &Coordinate) -> Result<String, OracleError> {
        coordinate
            .validate()
            .map_err(|e| OracleError::InvalidCoordinate {
                reason: e.to_string(),
            })?;

        let url = format!("{}/browse", self.config.base_url);
        let query = [
            ("hex", coordinate.hexagon.clone()),
            ("wall", coordinate.wall.to_string()),
            ("shelf", coordinate.shelf.to_string()),
            ("volume", coordinate.volume.to_string()),
            ("page", coordinate.page.to_string()),
        ];
        let html = self
            .request_with_retry("browse", || self.client.get(&url).query(&query))
            .await?;
        parse_browse_response(&html)
    }

    /// Issue a request, retrying transport errors and 5xx responses with
    /// exponential backoff. Returns the response body on 2xx.
    async fn request_with_retry(
        &self,
        operation: &str,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<String, OracleError> {
        let mut delay = self.config.initial_backoff;
        let mut attempts = 0;
        let mut last_error;

        loop {
            attempts += 1;
            debug!(operation, attempt = attempts, "oracle request");

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| OracleError::Protocol {
                            reason: format!("failed to read response body: {e}"),
                        });
                    }
                    if status.is_client_error() {
                        return Err(OracleError::Protocol {
                            reason: format!("{operation} returned {status}"),
                        });
                    }
                    last_error = format!("{operation} returned {status}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if !is_transport_error(&e) {
                        return Err(OracleError::Unavailable {
                            attempts,
                            last_error,
                        });
                    }
                }
            }

            if attempts >= self.config.max_attempts {
                return Err(OracleError::Unavailable {
                    attempts,
                    last_error,
                });
            }

            warn!(
                operation,
                attempt = attempts,
                delay_ms = delay.as_millis(),
                error = %last_error,
                "retrying oracle request"
            );
            tokio::time::sleep(delay).await;
            delay = std::cmp::min(delay * 2, self.config.max_backoff);
        }
    }
}

/// Whether a reqwest error is worth retrying.
fn is_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}
