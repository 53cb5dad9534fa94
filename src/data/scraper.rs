//! Fetcher capability and the simulated court scraper
//!
//! The resolver only depends on the [`Fetcher`] trait. [`SimulatedScraper`]
//! stands in for a real court website: it waits, then randomly succeeds with a
//! canned case document or fails with a "not found" message.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use super::{CaseIdentifier, Document};

/// Default probability that a simulated scrape succeeds
pub const DEFAULT_SUCCESS_RATE: f64 = 0.8;

/// Default simulated network delay in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 1500;

/// Message returned by a failed simulated scrape
pub const NOT_FOUND_MESSAGE: &str = "Live scrape failed: Case not found on the source website.";

/// Errors reported by a fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source could not produce the case; carries a user-facing message
    #[error("{0}")]
    Failed(String),
}

/// Retrieves the document for a case from its live source
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the case document
    ///
    /// The returned document is stored verbatim by the caller.
    async fn fetch(&self, case: &CaseIdentifier) -> Result<Document, FetchError>;
}

/// Placeholder scraper with a random outcome
#[derive(Debug, Clone)]
pub struct SimulatedScraper {
    /// Probability in `0.0..=1.0` that a scrape succeeds
    success_rate: f64,
    /// How long each scrape takes
    delay: Duration,
}

impl SimulatedScraper {
    /// Creates a scraper with the default 80% success rate and 1.5s delay
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SUCCESS_RATE, Duration::from_millis(DEFAULT_DELAY_MS))
    }

    /// Creates a scraper with a custom success rate and delay
    ///
    /// The success rate is clamped to `0.0..=1.0`; NaN counts as zero.
    pub fn with_settings(success_rate: f64, delay: Duration) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            success_rate,
            delay,
        }
    }

    /// Builds the document a successful scrape returns
    fn case_document(case: &CaseIdentifier) -> Document {
        json!({
            "source": "Live Scrape",
            "status": "Pending",
            "parties": format!(
                "{} {}/{}: John Doe vs The State",
                case.kind, case.number, case.year
            ),
            "nextHearingDate": "25-09-2025",
            "filingDate": format!("15-03-{}", case.year),
            "history": [
                {
                    "date": "20-08-2025",
                    "business": "Arguments heard. Adjourned.",
                    "orderLink": "#"
                }
            ]
        })
    }
}

impl Default for SimulatedScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for SimulatedScraper {
    async fn fetch(&self, case: &CaseIdentifier) -> Result<Document, FetchError> {
        info!(
            case_type = %case.kind,
            number = %case.number,
            year = %case.year,
            "Scraping live source"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        // gen_bool panics outside 0..=1, which with_settings rules out
        let succeeded = rand::thread_rng().gen_bool(self.success_rate);
        if succeeded {
            Ok(Self::case_document(case))
        } else {
            Err(FetchError::Failed(NOT_FOUND_MESSAGE.to_string()))
        }
    }
}
