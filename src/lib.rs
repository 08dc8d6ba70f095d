//! Ordered, run-once migration tracking with durable result history.
//!
//! Migrations are plain files named `<num>-<name>.<ext>` in one directory.
//! Each is executed at most meaningfully once: every attempt is appended to a
//! result store (flat JSON file or MongoDB collection), and a migration whose
//! most recent record is a success is skipped on later invocations unless
//! forced. Batches always execute in `(num, name)` order and stop at the
//! first failure, which is itself durably recorded.
//!
//! # Examples
//!
//! Run everything that has not succeeded yet, recording history in a flat
//! file:
//! ```no_run
//! use std::path::Path;
//!
//! use waymark::{config::DatabaseConfig, runner, store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let database = DatabaseConfig::Json {
//!     path: ".waymark_db.json".into(),
//! };
//! let mut store = store::open(&database)?;
//! let report = runner::migrate_all(store.as_mut(), Path::new("migrations"))?;
//! std::process::exit(if report.is_clean() { 0 } else { 1 });
//! # }
//! ```
//!
//! Run two specific migrations, one by ordinal and one by name:
//! ```no_run
//! use std::path::Path;
//!
//! use waymark::{config::DatabaseConfig, runner, store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let database = DatabaseConfig::Json {
//!     path: ".waymark_db.json".into(),
//! };
//! let mut store = store::open(&database)?;
//! let targets = vec!["2".to_string(), "add-users".to_string()];
//! let report = runner::migrate(store.as_mut(), Path::new("migrations"), &targets, false)?;
//! for entry in &report.entries {
//!     println!("{}-{} {:?}", entry.num, entry.name, entry.status);
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

/// Settings file model and backend selection.
pub mod config;
/// Directory scan and identity materialization.
pub mod discover;
/// Migration identity with lazy source, digest, and descriptions.
pub mod migration;
/// Orchestrator: target resolution, admission, ordered execution.
pub mod runner;
/// Project and migration scaffolding.
pub mod scaffold;
/// Executable-unit seam and the shell implementation.
pub mod script;
/// Result-store trait and backends.
pub mod store;
