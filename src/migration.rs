//! Migration identity: numbered, named units of work discovered on disk.

use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::script::{self, Script};

/// Errors raised while materializing a migration from its file.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File name does not follow the `<num>-<name>.<ext>` convention.
    #[error("invalid migration file name {0:?}")]
    InvalidFileName(String),
    /// No script kind claims the file's extension.
    #[error("unsupported migration extension {0:?}")]
    UnsupportedExtension(String),
    /// Source file could not be read back after discovery.
    #[error("failed to read migration source {}", .path.display())]
    SourceUnreadable {
        /// Path of the vanished or unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One discoverable migration.
///
/// Identity is the `(num, name)` pair parsed from the file name; everything
/// else (source text, digest, descriptions) is loaded lazily on first access
/// and cached for the lifetime of the value. Two migrations compare equal
/// when `num` and `name` match, and order by `num` ascending with ties broken
/// by `name`.
pub struct Migration {
    dir: PathBuf,
    file_name: String,
    num: u32,
    name: String,
    script: &'static dyn Script,
    source: OnceCell<String>,
    digest: OnceCell<String>,
    doc: OnceCell<(String, String)>,
}

impl Migration {
    /// Parses `file_name` inside `dir` into a migration.
    ///
    /// The extension must be claimed by a registered script kind, and the
    /// stem must be `<num>-<name>` where `num` parses as an unsigned integer.
    /// The first `-` splits the stem, so names may themselves contain dashes.
    pub fn from_file(dir: &Path, file_name: &str) -> Result<Self, MigrationError> {
        let (stem, ext) = file_name
            .rsplit_once('.')
            .ok_or_else(|| MigrationError::InvalidFileName(file_name.to_string()))?;

        let script = script::for_extension(ext)
            .ok_or_else(|| MigrationError::UnsupportedExtension(ext.to_string()))?;

        let (num, name) = stem
            .split_once('-')
            .and_then(|(prefix, name)| Some((prefix.parse::<u32>().ok()?, name)))
            .ok_or_else(|| MigrationError::InvalidFileName(file_name.to_string()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
            num,
            name: name.to_string(),
            script,
            source: OnceCell::new(),
            digest: OnceCell::new(),
            doc: OnceCell::new(),
        })
    }

    /// Ordinal parsed from the file-name prefix.
    pub fn num(&self) -> u32 {
        self.num
    }

    /// Name parsed from the file-name stem after the first `-`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name this migration was discovered under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the migration file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Full source text, read on first access.
    pub fn source(&self) -> Result<&str, MigrationError> {
        if let Some(source) = self.source.get() {
            return Ok(source);
        }
        let text = fs::read_to_string(self.path()).map_err(|err| {
            MigrationError::SourceUnreadable {
                path: self.path(),
                source: err,
            }
        })?;
        Ok(self.source.get_or_init(|| text))
    }

    /// Lowercase hex SHA-256 of the source text.
    ///
    /// Recorded with every result for bookkeeping; never used for equality.
    pub fn digest(&self) -> Result<&str, MigrationError> {
        if let Some(digest) = self.digest.get() {
            return Ok(digest);
        }
        let digest = format!("{:x}", Sha256::digest(self.source()?.as_bytes()));
        Ok(self.digest.get_or_init(|| digest))
    }

    /// One-line description from the leading documentation block.
    pub fn short(&self) -> Result<&str, MigrationError> {
        Ok(&self.doc_parts()?.0)
    }

    /// Remainder of the documentation block after the first line.
    pub fn long(&self) -> Result<&str, MigrationError> {
        Ok(&self.doc_parts()?.1)
    }

    /// Executes the migration body and reports success or failure.
    pub fn run(&self) -> Result<(), script::ScriptError> {
        self.script.run(&self.path())
    }

    fn doc_parts(&self) -> Result<&(String, String), MigrationError> {
        if let Some(parts) = self.doc.get() {
            return Ok(parts);
        }
        let raw = self.script.doc(self.source()?);
        let raw = raw.trim();
        let parts = match raw.split_once('\n') {
            Some((short, long)) => (short.trim().to_string(), long.trim().to_string()),
            None => (raw.to_string(), String::new()),
        };
        Ok(self.doc.get_or_init(|| parts))
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("num", &self.num)
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.num, self.name)
    }
}

impl PartialEq for Migration {
    fn eq(&self, other: &Self) -> bool {
        self.num == other.num && self.name == other.name
    }
}

impl Eq for Migration {}

impl PartialOrd for Migration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Migration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.num
            .cmp(&other.num)
            .then_with(|| self.name.cmp(&other.name))
    }
}
