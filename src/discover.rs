//! Directory scan that turns migration files into identities.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::migration::{Migration, MigrationError};

/// Errors raised while scanning a migrations directory.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The directory exists but could not be listed.
    #[error("failed to list migrations directory {}", .path.display())]
    ReadDir {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A candidate file could not be parsed into an identity.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Lists candidate migration file names in `dir`, sorted lexicographically.
///
/// Entries starting with `.` and entries without an extension are excluded.
/// A missing directory is not an error: it degrades to an empty list, since
/// "no migrations yet" is a normal state for a fresh project.
pub fn candidate_files(dir: &Path) -> Result<Vec<String>, DiscoverError> {
    let entries = match dir.read_dir() {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "migrations directory does not exist");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(DiscoverError::ReadDir {
                path: dir.to_path_buf(),
                source: err,
            });
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DiscoverError::ReadDir {
            path: dir.to_path_buf(),
            source: err,
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(dir = %dir.display(), "skipping non-UTF-8 entry");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => names.push(name),
            _ => continue,
        }
    }
    names.sort();
    Ok(names)
}

/// Discovers every migration in `dir`, sorted by identity order.
///
/// Each candidate file must parse; the first invalid name or unsupported
/// extension aborts the scan. The returned order is the execution order —
/// `num` ascending, ties by `name` — not raw file-name order, so numbering
/// past the zero-padding width still sorts numerically.
pub fn list_all(dir: &Path) -> Result<Vec<Migration>, DiscoverError> {
    let mut migrations = candidate_files(dir)?
        .iter()
        .map(|name| Migration::from_file(dir, name))
        .collect::<Result<Vec<_>, _>>()?;
    migrations.sort();
    Ok(migrations)
}
