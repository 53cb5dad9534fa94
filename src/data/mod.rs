//! Core data models for casecache
//!
//! This module contains the types shared by the cache store, the resolver and
//! the HTTP layer: the case identifier triple, the stored record and the
//! provenance tag attached to every resolved document.

pub mod scraper;

pub use scraper::{FetchError, Fetcher, SimulatedScraper};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque JSON document as returned by a fetcher and stored verbatim
pub type Document = serde_json::Value;

/// Maximum length of a single identifier field
const MAX_FIELD_LEN: usize = 64;

/// Identifies a single court case
///
/// The JSON shape matches the request body of `POST /api/scrape`, so `kind`
/// is (de)serialized as `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseIdentifier {
    /// Case type, e.g. "CRL"
    #[serde(rename = "type")]
    pub kind: String,
    /// Case number
    pub number: String,
    /// Filing year
    pub year: String,
}

impl CaseIdentifier {
    pub fn new(kind: impl Into<String>, number: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            number: number.into(),
            year: year.into(),
        }
    }

    /// Returns the storage key, `"{type}-{number}-{year}"`
    pub fn case_id(&self) -> String {
        format!("{}-{}-{}", self.kind, self.number, self.year)
    }

    /// Checks every field before the identifier is used as a storage key
    ///
    /// Fields must be non-empty and only contain ASCII alphanumerics or one of
    /// `._()`. Excluding `-` keeps the case id unambiguous, and excluding path
    /// separators keeps it a safe file name.
    ///
    /// # Returns
    /// * `Ok(())` if all three fields are acceptable
    /// * `Err(String)` describing the first offending field
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("type", &self.kind),
            ("number", &self.number),
            ("year", &self.year),
        ] {
            if value.trim().is_empty() {
                return Err(format!("Field '{}' must not be empty", name));
            }
            if value.len() > MAX_FIELD_LEN {
                return Err(format!(
                    "Field '{}' must be at most {} characters",
                    name, MAX_FIELD_LEN
                ));
            }
            if let Some(c) = value.chars().find(|c| !is_allowed_char(*c)) {
                return Err(format!("Field '{}' contains invalid character '{}'", name, c));
            }
        }
        Ok(())
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '(' | ')')
}

/// A cached case document as persisted by the cache store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Storage key, see [`CaseIdentifier::case_id`]
    pub case_id: String,
    /// The document returned by the last successful fetch
    pub data: Document,
    /// When the document was written
    pub last_updated: DateTime<Utc>,
}

/// Where a resolved document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Served from a fresh cache entry
    Cache,
    /// Fetched live and then persisted
    Live,
}

/// Value of the `source` field written into documents served from cache
pub const CACHE_SOURCE_LABEL: &str = "Database Cache";

/// A document together with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: Document,
    pub provenance: Provenance,
}

impl Resolved {
    /// Converts into the body returned to clients
    ///
    /// Cached object documents get `"source": "Database Cache"`. Live documents
    /// are passed through as the fetcher returned them.
    pub fn into_response_body(self) -> Document {
        let mut document = self.document;
        if self.provenance == Provenance::Cache {
            if let Some(object) = document.as_object_mut() {
                object.insert(
                    "source".to_string(),
                    Document::String(CACHE_SOURCE_LABEL.to_string()),
                );
            }
        }
        document
    }
}
