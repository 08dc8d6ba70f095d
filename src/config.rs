//! Settings file model: migrations directory, templates, backend selection.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings {}", .path.display())]
    Read {
        /// Settings file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid TOML or misses required keys.
    #[error("failed to parse settings {}", .path.display())]
    Parse {
        /// Settings file involved.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Resolved settings shared by every operation.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Where migrations live and how new ones are numbered.
    pub migrations: MigrationsConfig,
    /// Template directory for scaffolding new migrations, when configured.
    pub templates: Option<TemplatesConfig>,
    /// Which result-store backend records run history.
    pub database: DatabaseConfig,
}

/// The `[migrations]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    /// Directory scanned for migration files.
    pub path: PathBuf,
    /// Zero-padding width used when numbering generated file names.
    #[serde(default = "default_digits")]
    pub digits: usize,
}

/// The `[templates]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding migration templates.
    pub path: PathBuf,
    /// Template used when none is named explicitly.
    pub default: Option<String>,
}

/// The `[database]` section, dispatched on the `backend` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// Flat-file JSON log.
    Json {
        /// Path of the store file.
        path: PathBuf,
    },
    /// MongoDB collection, one document per result.
    Mongo {
        /// Server host.
        #[serde(default = "default_host")]
        host: String,
        /// Server port.
        #[serde(default = "default_port")]
        port: u16,
        /// Database name. Required.
        name: String,
        /// Collection name.
        #[serde(default = "default_collection")]
        collection: String,
    },
}

impl Settings {
    /// Reads and parses the settings file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        toml::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

fn default_digits() -> usize {
    3
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    27017
}

fn default_collection() -> String {
    "migrations".to_string()
}
