//! Cache store for persisting case documents to disk
//!
//! Provides a `CacheStore` that keeps one JSON file per case id together with
//! the time it was last written. Freshness is decided by the caller.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{CaseRecord, Document};

/// Name of the subdirectory holding case records
const CASES_DIR: &str = "cases";

/// Errors that can occur when reading or writing the cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A record could not be serialized
    #[error("Failed to serialize cache record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The temporary file could not be moved into place
    #[error("Failed to persist cache record: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Returns the XDG data directory for casecache, if one can be determined
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "casecache").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Durable store of case records
///
/// Records live under `<data_dir>/cases/<case_id>.json` (on Linux the default
/// data dir is `~/.local/share/casecache/`). Every operation opens its own file
/// handle and writes go through a temporary file plus rename, so a clone of the
/// store can be shared freely between concurrent requests and the last writer
/// wins.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where record files are stored
    cases_dir: PathBuf,
}

impl CacheStore {
    /// Creates a CacheStore in the XDG-compliant data directory
    ///
    /// Returns `None` if the data directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        default_data_dir().map(Self::with_dir)
    }

    /// Creates a CacheStore rooted at a custom data directory
    pub fn with_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            cases_dir: data_dir.as_ref().join(CASES_DIR),
        }
    }

    /// Returns the directory holding the record files
    pub fn cases_dir(&self) -> &Path {
        &self.cases_dir
    }

    /// Returns the path to the record file for the given case id
    fn record_path(&self, case_id: &str) -> PathBuf {
        self.cases_dir.join(format!("{}.json", case_id))
    }

    /// Reads the record for a case id, regardless of its age
    ///
    /// # Returns
    /// * `Ok(Some(CaseRecord))` if a readable record exists
    /// * `Ok(None)` if there is no record, or the file is not a valid record
    /// * `Err(CacheError)` if the file exists but cannot be read
    pub fn get(&self, case_id: &str) -> Result<Option<CaseRecord>, CacheError> {
        let path = self.record_path(case_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<CaseRecord>(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // Treated as a miss; the next successful write replaces it
                warn!(case_id = case_id, error = %e, "Ignoring unreadable cache record");
                Ok(None)
            }
        }
    }

    /// Upserts the record for a case id, stamped with the current time
    pub fn put(&self, case_id: &str, data: &Document) -> Result<CaseRecord, CacheError> {
        self.put_at(case_id, data, Utc::now())
    }

    /// Upserts the record for a case id with an explicit write time
    ///
    /// Any previous record for the same case id is fully replaced.
    pub fn put_at(
        &self,
        case_id: &str,
        data: &Document,
        last_updated: DateTime<Utc>,
    ) -> Result<CaseRecord, CacheError> {
        fs::create_dir_all(&self.cases_dir)?;

        let record = CaseRecord {
            case_id: case_id.to_string(),
            data: data.clone(),
            last_updated,
        };
        let json = serde_json::to_string_pretty(&record)?;

        let mut tmp = NamedTempFile::new_in(&self.cases_dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.record_path(case_id))?;

        debug!(
            case_id = case_id,
            last_updated = %last_updated,
            "Cache write"
        );
        Ok(record)
    }
}
