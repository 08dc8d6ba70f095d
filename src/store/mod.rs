//! Result-store abstraction and its two backends.

/// Flat-file JSON backend.
pub mod json;
/// MongoDB document backend.
#[cfg(feature = "mongo")]
pub mod mongo;

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::migration::{Migration, MigrationError};

/// Errors raised by result-store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persisted file exists but does not decode.
    #[error("result store {} is corrupt", .path.display())]
    Corrupt {
        /// Store file that failed to decode.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Reading or rewriting the store file failed.
    #[error("result store I/O error at {}", .path.display())]
    Io {
        /// Store file involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Document-store client error (connection, index, query, insert).
    #[cfg(feature = "mongo")]
    #[error("document store error")]
    Mongo(#[from] mongodb::error::Error),
    /// The selected backend is not compiled into this build.
    #[error("store backend {0:?} is not available in this build")]
    BackendUnavailable(&'static str),
    /// Snapshotting the migration's fields for a record failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// One durable record of a single execution attempt.
///
/// Records are append-only: once written they are never edited or deleted.
/// `num` and `name` are denormalized copies of the identity, and the
/// remaining fields snapshot the migration as it looked when it ran. The
/// flat-file backend does not persist `short`/`long`; the document backend
/// does.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    /// Attempt time.
    pub ts: DateTime<Utc>,
    /// Ordinal of the migration that ran.
    pub num: u32,
    /// Name of the migration that ran.
    pub name: String,
    /// One-line description snapshot, when the backend persists it.
    pub short: Option<String>,
    /// Long description snapshot, when the backend persists it.
    pub long: Option<String>,
    /// Source text snapshot.
    pub source: String,
    /// SHA-256 digest of the source snapshot.
    pub digest: String,
    /// True when the attempt succeeded.
    pub outcome: bool,
}

/// Append-only authority over migration run history.
///
/// The store is the single writer and single source of truth for "has this
/// identity ever succeeded"; no other component infers success on its own.
/// Methods take `&mut self` because both backends defer work to first use
/// (file load, connection establishment).
pub trait ResultStore {
    /// Every record, ordered by timestamp ascending.
    fn all_results(&mut self) -> StoreResult<Vec<StoredResult>>;

    /// Appends a record for `migration` stamped with the current time.
    fn add(&mut self, migration: &Migration, outcome: bool) -> StoreResult<()>;

    /// Records whose `(num, name)` match, in timestamp order.
    fn find(&mut self, num: u32, name: &str) -> StoreResult<Vec<StoredResult>> {
        Ok(self
            .all_results()?
            .into_iter()
            .filter(|r| r.num == num && r.name == name)
            .collect())
    }

    /// Outcome of the most recent record for `(num, name)`.
    ///
    /// Last-write-wins: a failure followed by a success reads as success,
    /// and a success followed by a forced failing re-run reads as failure.
    /// `false` when no record exists.
    fn last_outcome(&mut self, num: u32, name: &str) -> StoreResult<bool> {
        Ok(self
            .find(num, name)?
            .last()
            .map(|r| r.outcome)
            .unwrap_or(false))
    }
}

/// Opens the backend selected by `config`.
///
/// This is the only place backend dispatch happens; everything downstream
/// works through the [`ResultStore`] trait.
pub fn open(config: &DatabaseConfig) -> StoreResult<Box<dyn ResultStore>> {
    match config {
        DatabaseConfig::Json { path } => Ok(Box::new(json::JsonStore::new(path))),
        #[cfg(feature = "mongo")]
        DatabaseConfig::Mongo {
            host,
            port,
            name,
            collection,
        } => Ok(Box::new(mongo::MongoStore::new(
            host, *port, name, collection,
        ))),
        #[cfg(not(feature = "mongo"))]
        DatabaseConfig::Mongo { .. } => Err(StoreError::BackendUnavailable("mongo")),
    }
}
