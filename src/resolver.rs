//! Cache-first resolution of case documents
//!
//! `CaseResolver` answers a case lookup from the cache store while the stored
//! record is younger than the freshness window, and otherwise asks the fetcher
//! for a live copy and persists it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{CacheError, CacheStore};
use crate::data::{CaseIdentifier, Fetcher, Provenance, Resolved};

/// Default freshness window in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Errors that can occur while resolving a case
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The fetcher reported a failure; the message is shown to the user as is
    #[error("{0}")]
    FetchFailed(String),

    /// The case identifier was rejected before any lookup
    #[error("Invalid case identifier: {0}")]
    MalformedRequest(String),

    /// The cache store could not be read or written
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Records younger than this are served from cache
    pub freshness_window: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }
}

/// Returns true if a record written at `last_updated` is still fresh at `now`
///
/// The window is exclusive: a record exactly `window` old is stale.
pub fn is_fresh(last_updated: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now - last_updated < window
}

/// Orchestrates the cache store and the fetcher
pub struct CaseResolver {
    store: CacheStore,
    fetcher: Arc<dyn Fetcher>,
    config: ResolverConfig,
}

impl CaseResolver {
    pub fn new(store: CacheStore, fetcher: Arc<dyn Fetcher>, config: ResolverConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Resolves a case against the current wall-clock time
    pub async fn resolve(&self, case: &CaseIdentifier) -> Result<Resolved, ResolveError> {
        self.resolve_at(case, Utc::now()).await
    }

    /// Resolves a case as if the current time were `now`
    ///
    /// # Behavior
    /// - Rejects invalid identifiers before touching the store
    /// - Returns the cached document if its record is fresh at `now`
    /// - Otherwise fetches live; a successful result is persisted and returned
    /// - A failed fetch is returned as `FetchFailed` and nothing is written
    /// - A live result that cannot be persisted is returned as `Cache`
    pub async fn resolve_at(
        &self,
        case: &CaseIdentifier,
        now: DateTime<Utc>,
    ) -> Result<Resolved, ResolveError> {
        case.validate().map_err(ResolveError::MalformedRequest)?;
        let case_id = case.case_id();

        match self.store.get(&case_id)? {
            Some(record) if is_fresh(record.last_updated, now, self.config.freshness_window) => {
                info!(case_id = %case_id, last_updated = %record.last_updated, "Cache hit");
                return Ok(Resolved {
                    document: record.data,
                    provenance: Provenance::Cache,
                });
            }
            Some(record) => {
                info!(case_id = %case_id, last_updated = %record.last_updated, "Cache stale, fetching live");
            }
            None => {
                info!(case_id = %case_id, "Cache miss, fetching live");
            }
        }

        let document = match self.fetcher.fetch(case).await {
            Ok(document) => document,
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "Live fetch failed");
                return Err(ResolveError::FetchFailed(e.to_string()));
            }
        };

        if let Err(e) = self.store.put(&case_id, &document) {
            warn!(case_id = %case_id, error = %e, "Failed to cache live result");
            return Err(e.into());
        }

        Ok(Resolved {
            document,
            provenance: Provenance::Live,
        })
    }
}
