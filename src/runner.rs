//! Execution orchestrator: resolves targets, admits a batch, runs it in order.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::discover::{self, DiscoverError};
use crate::migration::Migration;
use crate::store::{ResultStore, StoreError};

/// Errors that abort an invocation before or between executions.
///
/// A migration's own failure is not represented here: it is recorded in the
/// store, surfaced as a [`RunStatus::Failed`] entry, and stops the batch.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A requested target matched no discovered migration.
    #[error("migration {0:?} not found")]
    NotFound(String),
    /// A requested target matched more than one discovered migration.
    #[error("target {0:?} matches more than one migration")]
    Ambiguous(String),
    /// Discovery failed.
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    /// The result store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shape of one user-supplied target token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `<num>-<name>`: both halves constrained.
    Exact {
        /// Required ordinal.
        num: u32,
        /// Required name.
        name: String,
    },
    /// All digits: ordinal constrained, name free.
    Num(u32),
    /// Anything else: name constrained, ordinal free.
    Name(String),
}

impl Target {
    /// Classifies `token` into its matching shape.
    ///
    /// A digits-only prefix before the first `-` makes an exact pair, a
    /// digits-only token matches by ordinal, and everything else matches by
    /// name — including names that themselves contain dashes.
    pub fn parse(token: &str) -> Self {
        if let Some((prefix, name)) = token.split_once('-') {
            if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(num) = prefix.parse() {
                    return Self::Exact {
                        num,
                        name: name.to_string(),
                    };
                }
            }
        }
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(num) = token.parse() {
                return Self::Num(num);
            }
        }
        Self::Name(token.to_string())
    }

    /// True when `migration` satisfies every constrained half.
    pub fn matches(&self, migration: &Migration) -> bool {
        match self {
            Self::Exact { num, name } => migration.num() == *num && migration.name() == name,
            Self::Num(num) => migration.num() == *num,
            Self::Name(name) => migration.name() == name,
        }
    }
}

/// Per-item outcome reported for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Admitted and ran to completion.
    Succeeded,
    /// Resolved but not admitted: already succeeded and not forced.
    Skipped,
    /// Admitted, ran, and failed; the batch stopped here.
    Failed,
}

/// One line of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    /// Ordinal of the migration.
    pub num: u32,
    /// Name of the migration.
    pub name: String,
    /// What happened to it.
    pub status: RunStatus,
}

/// Ordered per-item statuses produced by one invocation.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Entries in the order they were decided.
    pub entries: Vec<RunEntry>,
}

impl RunReport {
    /// True when no entry failed — the caller's zero exit code.
    pub fn is_clean(&self) -> bool {
        !self.entries.iter().any(|e| e.status == RunStatus::Failed)
    }

    fn push(&mut self, migration: &Migration, status: RunStatus) {
        self.entries.push(RunEntry {
            num: migration.num(),
            name: migration.name().to_string(),
            status,
        });
    }
}

/// Last known state of one migration, derived from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No record exists.
    Unattempted,
    /// The most recent record succeeded.
    Succeeded,
    /// The most recent record failed.
    Failed,
}

/// One row of [`list`] output.
#[derive(Debug)]
pub struct ListEntry {
    /// The discovered migration; descriptions load lazily through it.
    pub migration: Migration,
    /// State derived from the store's history.
    pub state: RunState,
}

/// Runs the migrations named by `targets`.
///
/// Every token is resolved before anything executes: an unknown or ambiguous
/// target aborts the whole invocation with zero executions. Resolved
/// candidates are skipped when their last recorded outcome is success,
/// unless `force` is set. The admitted set then executes in identity order
/// regardless of the order tokens were supplied, stopping at the first
/// failure.
pub fn migrate(
    store: &mut dyn ResultStore,
    dir: &Path,
    targets: &[String],
    force: bool,
) -> Result<RunReport, RunnerError> {
    let all = discover::list_all(dir)?;
    let mut report = RunReport::default();
    let mut admitted: Vec<&Migration> = Vec::new();

    for token in targets {
        let target = Target::parse(token);
        let matches: Vec<&Migration> = all.iter().filter(|m| target.matches(m)).collect();
        match matches.as_slice() {
            [] => return Err(RunnerError::NotFound(token.clone())),
            [migration] => {
                if force || !store.last_outcome(migration.num(), migration.name())? {
                    admitted.push(*migration);
                } else {
                    info!(migration = %migration, "skipping: already succeeded");
                    report.push(migration, RunStatus::Skipped);
                }
            }
            _ => return Err(RunnerError::Ambiguous(token.clone())),
        }
    }

    admitted.sort();
    for migration in admitted {
        if !run_one(store, migration, &mut report)? {
            break;
        }
    }
    Ok(report)
}

/// Runs every discovered migration whose last outcome is not success.
///
/// Iterates the discovery order (identity order) and decides skip/run per
/// item as encountered, stopping at the first failure.
pub fn migrate_all(store: &mut dyn ResultStore, dir: &Path) -> Result<RunReport, RunnerError> {
    let all = discover::list_all(dir)?;
    let mut report = RunReport::default();

    for migration in &all {
        if store.last_outcome(migration.num(), migration.name())? {
            info!(migration = %migration, "skipping: already succeeded");
            report.push(migration, RunStatus::Skipped);
        } else if !run_one(store, migration, &mut report)? {
            break;
        }
    }
    Ok(report)
}

/// Lists every discovered migration with its state from run history.
pub fn list(store: &mut dyn ResultStore, dir: &Path) -> Result<Vec<ListEntry>, RunnerError> {
    let all = discover::list_all(dir)?;
    let mut entries = Vec::with_capacity(all.len());

    for migration in all {
        let history = store.find(migration.num(), migration.name())?;
        let state = match history.last() {
            None => RunState::Unattempted,
            Some(last) if last.outcome => RunState::Succeeded,
            Some(_) => RunState::Failed,
        };
        entries.push(ListEntry { migration, state });
    }
    Ok(entries)
}

/// Executes one admitted migration and records the outcome.
///
/// The record is appended whether the run succeeded or failed; only then is
/// the outcome inspected. Returns `false` when the batch must stop.
fn run_one(
    store: &mut dyn ResultStore,
    migration: &Migration,
    report: &mut RunReport,
) -> Result<bool, RunnerError> {
    info!(migration = %migration, "running");
    let outcome = migration.run();
    store.add(migration, outcome.is_ok())?;

    match outcome {
        Ok(()) => {
            report.push(migration, RunStatus::Succeeded);
            Ok(true)
        }
        Err(err) => {
            error!(migration = %migration, error = %err, "migration failed");
            report.push(migration, RunStatus::Failed);
            Ok(false)
        }
    }
}
