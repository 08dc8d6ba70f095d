//! Flat-file JSON result store: read-all on first access, rewrite-all on add.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::migration::Migration;

use super::{ResultStore, StoreError, StoreResult, StoredResult};

/// On-disk record layout.
///
/// The flat file does not carry the description snapshot, only the fields
/// needed to reconstruct run history.
#[derive(Debug, Serialize, Deserialize)]
struct JsonRecord {
    ts: DateTime<Utc>,
    num: u32,
    name: String,
    source: String,
    digest: String,
    outcome: bool,
}

/// JSON-file implementation of [`ResultStore`].
///
/// The whole result sequence lives in one file, loaded into memory on first
/// access and rewritten in full on every [`ResultStore::add`]. Writes are
/// O(n) and read-then-rewrite is not atomic, so exactly one process may use
/// a given store file at a time; concurrent writers can lose records.
pub struct JsonStore {
    path: PathBuf,
    results: Option<Vec<StoredResult>>,
    by_key: HashMap<(u32, String), Vec<usize>>,
}

impl JsonStore {
    /// Creates a store over the file at `path` without touching disk yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            results: None,
            by_key: HashMap::new(),
        }
    }

    fn loaded(&mut self) -> StoreResult<&[StoredResult]> {
        if self.results.is_none() {
            let results = self.read_file()?;
            for (idx, record) in results.iter().enumerate() {
                self.by_key
                    .entry((record.num, record.name.clone()))
                    .or_default()
                    .push(idx);
            }
            debug!(path = %self.path.display(), records = results.len(), "loaded result store");
            self.results = Some(results);
        }
        Ok(self.results.as_deref().unwrap_or_default())
    }

    fn read_file(&self) -> StoreResult<Vec<StoredResult>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: err,
                });
            }
        };

        let records: Vec<JsonRecord> =
            serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
                path: self.path.clone(),
                source: err,
            })?;

        Ok(records.into_iter().map(StoredResult::from).collect())
    }

    fn save(&self) -> StoreResult<()> {
        let records: Vec<JsonRecord> = self
            .results
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(JsonRecord::from)
            .collect();

        let raw = serde_json::to_string_pretty(&records).map_err(|err| StoreError::Corrupt {
            path: self.path.clone(),
            source: err,
        })?;

        fs::write(&self.path, raw).map_err(|err| StoreError::Io {
            path: self.path.clone(),
            source: err,
        })
    }
}

impl ResultStore for JsonStore {
    fn all_results(&mut self) -> StoreResult<Vec<StoredResult>> {
        Ok(self.loaded()?.to_vec())
    }

    fn add(&mut self, migration: &Migration, outcome: bool) -> StoreResult<()> {
        let record = StoredResult {
            ts: Utc::now(),
            num: migration.num(),
            name: migration.name().to_string(),
            short: None,
            long: None,
            source: migration.source()?.to_string(),
            digest: migration.digest()?.to_string(),
            outcome,
        };

        self.loaded()?;
        let results = self.results.get_or_insert_with(Vec::new);
        self.by_key
            .entry((record.num, record.name.clone()))
            .or_default()
            .push(results.len());
        results.push(record);
        self.save()
    }

    fn find(&mut self, num: u32, name: &str) -> StoreResult<Vec<StoredResult>> {
        self.loaded()?;
        let results = self.results.as_deref().unwrap_or_default();
        let indexes = self
            .by_key
            .get(&(num, name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(indexes.iter().map(|&idx| results[idx].clone()).collect())
    }
}

impl From<JsonRecord> for StoredResult {
    fn from(record: JsonRecord) -> Self {
        Self {
            ts: record.ts,
            num: record.num,
            name: record.name,
            short: None,
            long: None,
            source: record.source,
            digest: record.digest,
            outcome: record.outcome,
        }
    }
}

impl From<&StoredResult> for JsonRecord {
    fn from(record: &StoredResult) -> Self {
        Self {
            ts: record.ts,
            num: record.num,
            name: record.name.clone(),
            source: record.source.clone(),
            digest: record.digest.clone(),
            outcome: record.outcome,
        }
    }
}
