//! HTTP client for the exposure lookup service
//!
//! One remote check per address, with the outcome classified into
//! clean/compromised/error. The client owns the single automatic retry for
//! rate-limited responses; the controller never retries.

use crate::lookup::error::{LookupError, LookupResult};
use crate::lookup::types::{Breach, Paste, PasteOutcome, ScanOutcome};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Default service endpoint (Have I Been Pwned v3 API).
pub const DEFAULT_BASE_URL: &str = "https://haveibeenpwned.com/api/v3";

const API_KEY_HEADER: &str = "hibp-api-key";
const AGENT_STRING: &str = concat!("breachscan/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout. Bounds in-flight latency; there is no cancellation
/// of a request already on the wire.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry delay used when a rate-limited response carries no advice.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);
const RETRY_AFTER_MIN: Duration = Duration::from_secs(1);
const RETRY_AFTER_MAX: Duration = Duration::from_secs(60);

/// Clamp a server-advised retry delay into the accepted window,
/// falling back to the default when absent.
fn clamp_retry_after(advised: Option<Duration>) -> Duration {
    advised
        .unwrap_or(DEFAULT_RETRY_AFTER)
        .clamp(RETRY_AFTER_MIN, RETRY_AFTER_MAX)
}

/// Parse the Retry-After header (seconds form) if present.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Run a lookup operation, sleeping out one rate-limit response before a
/// single reissue. A second rate-limit response is returned to the caller —
/// this bounds worst-case latency per item.
async fn retry_rate_limited<T, F, Fut>(operation_name: &str, mut operation: F) -> LookupResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LookupResult<T>>,
{
    match operation().await {
        Err(LookupError::RateLimited { retry_after }) => {
            let delay = clamp_retry_after(retry_after);
            log::warn!(
                "Rate limited during {}, retrying once in {:?}",
                operation_name,
                delay
            );
            tokio::time::sleep(delay).await;
            operation().await
        }
        result => result,
    }
}

/// Client for the remote exposure lookup service.
///
/// Stateless across calls apart from the shared transport session and its
/// default headers (API credential, identifying agent string).
pub struct BreachClient {
    http: reqwest::Client,
    base_url: String,
}

impl BreachClient {
    /// Create a client against the default service endpoint.
    pub fn new(api_key: &str) -> LookupResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a specific endpoint (used by tests).
    pub fn with_base_url(api_key: &str, base_url: impl Into<String>) -> LookupResult<Self> {
        let mut headers = HeaderMap::new();
        let key_value =
            HeaderValue::from_str(api_key).map_err(|e| LookupError::ClientBuild {
                message: format!("API key is not a valid header value: {e}"),
            })?;
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT_STRING));

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| LookupError::ClientBuild {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check an address against the breach index.
    ///
    /// Never fails: every outcome, including transport failures and an
    /// exhausted rate-limit retry, is folded into the returned record.
    pub async fn check_breaches(&self, email: &str) -> ScanOutcome {
        let url = format!(
            "{}/breachedaccount/{}?truncateResponse=false",
            self.base_url, email
        );

        let attempt =
            retry_rate_limited("breach lookup", || self.get_records::<Breach>(url.clone())).await;

        match attempt {
            Ok(Some(breaches)) if !breaches.is_empty() => ScanOutcome::compromised(breaches),
            Ok(_) => ScanOutcome::clean(),
            Err(e @ LookupError::RateLimited { .. }) => {
                log::warn!("Rate limit exhausted for {}", email);
                ScanOutcome::error(e.to_string())
            }
            Err(e @ LookupError::Unauthorized) => {
                log::error!("Credential rejected while checking {}", email);
                ScanOutcome::error(e.to_string())
            }
            Err(e) => {
                log::error!("Breach lookup failed for {}: {}", email, e);
                ScanOutcome::error(e.to_string())
            }
        }
    }

    /// Check an address against the paste index.
    ///
    /// A secondary signal: any failure collapses to an empty outcome.
    pub async fn check_pastes(&self, email: &str) -> PasteOutcome {
        let url = format!("{}/pasteaccount/{}", self.base_url, email);

        match self.get_records::<Paste>(url).await {
            Ok(Some(pastes)) => PasteOutcome::new(pastes),
            Ok(None) => PasteOutcome::default(),
            Err(e) => {
                log::debug!("Paste lookup failed for {}: {}", email, e);
                PasteOutcome::default()
            }
        }
    }

    /// Issue one GET and map the HTTP outcome.
    ///
    /// `Ok(None)` is the not-found (clean) case; rate limits, credential
    /// failures and unexpected statuses become typed errors.
    async fn get_records<T: DeserializeOwned>(&self, url: String) -> LookupResult<Option<Vec<T>>> {
        let response = self.http.get(&url).send().await?;

        match response.status().as_u16() {
            200 => {
                let records: Vec<T> = response.json().await.map_err(|e| LookupError::Payload {
                    message: format!("failed to parse response body: {e}"),
                })?;
                Ok(Some(records))
            }
            404 => Ok(None),
            429 => Err(LookupError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            }),
            401 => Err(LookupError::Unauthorized),
            status => Err(LookupError::UnexpectedStatus { status }),
        }
    }
}
