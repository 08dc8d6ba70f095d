//! Scaffolding: project initialization and new-migration generation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::migration::Migration;

/// Errors raised while scaffolding files.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Refusing to overwrite an existing settings file.
    #[error("settings file {} already exists", .0.display())]
    ConfigExists(PathBuf),
    /// The named template file does not exist.
    #[error("template {} does not exist", .0.display())]
    TemplateMissing(PathBuf),
    /// A file or directory could not be written.
    #[error("failed to write {}", .path.display())]
    Io {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Scanning the migrations directory for the next ordinal failed.
    #[error(transparent)]
    Discover(#[from] crate::discover::DiscoverError),
}

const CONFIG_TEMPLATE: &str = r#"[migrations]
path = "@migrations@"
# digits = 3

[templates]
path = "@templates@"
default = "default.sh"

[database]
backend = "json"
path = ".waymark_db.json"

# [database]
# backend = "mongo"
# host = "localhost"
# port = 27017
# name = ""
# collection = "migrations"
"#;

const TEMPLATE_DEFAULT: &str = r#"#!/bin/sh
# <empty description>
#
# <empty long description>

set -e
"#;

/// Next free ordinal for a new migration: highest existing `num` plus one.
pub fn next_num(migrations: &[Migration]) -> u32 {
    migrations.iter().map(Migration::num).max().unwrap_or(0) + 1
}

/// Creates a new migration file from `template`.
///
/// The new file lands in `dir` as `<num>-<name>.<ext>`, with `num` zero-padded
/// to `digits` and the extension taken from the template. Returns the path of
/// the created file.
pub fn create(
    dir: &Path,
    digits: usize,
    template: &Path,
    name: &str,
) -> Result<PathBuf, ScaffoldError> {
    if !template.is_file() {
        return Err(ScaffoldError::TemplateMissing(template.to_path_buf()));
    }
    let body = fs::read_to_string(template).map_err(|err| ScaffoldError::Io {
        path: template.to_path_buf(),
        source: err,
    })?;

    let ext = template
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("sh");

    let migrations = crate::discover::list_all(dir)?;
    let num = next_num(&migrations);
    let file_name = format!("{num:0digits$}-{name}.{ext}");

    let path = dir.join(file_name);
    fs::write(&path, body).map_err(|err| ScaffoldError::Io {
        path: path.clone(),
        source: err,
    })?;
    Ok(path)
}

/// Initializes a project: settings file, migrations and templates directories,
/// and a default template.
///
/// Fails if a settings file already exists. An existing default template is
/// left alone with a warning.
pub fn init(
    config_path: &Path,
    migrations_dir: &Path,
    templates_dir: &Path,
) -> Result<(), ScaffoldError> {
    if config_path.exists() {
        return Err(ScaffoldError::ConfigExists(config_path.to_path_buf()));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| ScaffoldError::Io {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
    }

    let config = CONFIG_TEMPLATE
        .replace("@migrations@", &migrations_dir.display().to_string())
        .replace("@templates@", &templates_dir.display().to_string());
    fs::write(config_path, config).map_err(|err| ScaffoldError::Io {
        path: config_path.to_path_buf(),
        source: err,
    })?;

    for dir in [migrations_dir, templates_dir] {
        fs::create_dir_all(dir).map_err(|err| ScaffoldError::Io {
            path: dir.to_path_buf(),
            source: err,
        })?;
    }

    let default_template = templates_dir.join("default.sh");
    if default_template.exists() {
        warn!(path = %default_template.display(), "default template already exists, keeping it");
    } else {
        fs::write(&default_template, TEMPLATE_DEFAULT).map_err(|err| ScaffoldError::Io {
            path: default_template,
            source: err,
        })?;
    }
    Ok(())
}
