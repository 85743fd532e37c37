//! Lookup seam consumed by the batch controller
//!
//! The controller only ever sees this trait; the real HTTP client and the
//! scripted test doubles are interchangeable behind it.

use crate::lookup::client::BreachClient;
use crate::lookup::types::{PasteOutcome, ScanOutcome};
use async_trait::async_trait;

/// One remote exposure check per address, failure-free by contract:
/// every problem surfaces inside the returned outcome.
#[async_trait]
pub trait ExposureLookup: Send + Sync {
    async fn check_breaches(&self, email: &str) -> ScanOutcome;
    async fn check_pastes(&self, email: &str) -> PasteOutcome;
}

#[async_trait]
impl ExposureLookup for BreachClient {
    async fn check_breaches(&self, email: &str) -> ScanOutcome {
        BreachClient::check_breaches(self, email).await
    }

    async fn check_pastes(&self, email: &str) -> PasteOutcome {
        BreachClient::check_pastes(self, email).await
    }
}
