//! Executable-unit seam: how a migration's body is documented and run.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Errors raised while executing a migration body.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The interpreter process could not be started at all.
    #[error("failed to spawn {}", .path.display())]
    Spawn {
        /// Script that failed to start.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The script ran and exited unsuccessfully.
    #[error("{} exited with {status}", .path.display())]
    Failed {
        /// Script that failed.
        path: PathBuf,
        /// Reported exit status.
        status: ExitStatus,
    },
}

/// One kind of executable migration body.
///
/// A script kind knows how to pull the leading documentation block out of a
/// source file and how to execute the file as a blocking child process. There
/// is no partial-success signal: `run` either returns `Ok` or an error.
pub trait Script: Send + Sync {
    /// Extracts the leading documentation block from `source`.
    ///
    /// Returns an empty string when the file carries no documentation.
    fn doc(&self, source: &str) -> String;

    /// Executes the script at `path` to completion.
    fn run(&self, path: &Path) -> Result<(), ScriptError>;
}

/// POSIX shell migration body, run as `sh <path>`.
#[derive(Debug, Clone, Copy)]
pub struct ShellScript;

static SHELL: ShellScript = ShellScript;

/// Resolves a file extension to its script kind.
///
/// Currently exactly one kind is registered: `sh`.
pub fn for_extension(ext: &str) -> Option<&'static dyn Script> {
    match ext {
        "sh" => Some(&SHELL),
        _ => None,
    }
}

impl Script for ShellScript {
    /// Leading `#` comment lines, with the shebang skipped.
    ///
    /// Collection stops at the first non-comment line, so only the block at
    /// the very top of the file counts as documentation.
    fn doc(&self, source: &str) -> String {
        let mut lines = Vec::new();
        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("#!") {
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            if let Some(rest) = trimmed.strip_prefix('#') {
                lines.push(rest.strip_prefix(' ').unwrap_or(rest));
            } else if trimmed.is_empty() && lines.is_empty() {
                continue;
            } else {
                break;
            }
        }
        lines.join("\n")
    }

    fn run(&self, path: &Path) -> Result<(), ScriptError> {
        let status = Command::new("sh")
            .arg(path)
            .status()
            .map_err(|err| ScriptError::Spawn {
                path: path.to_path_buf(),
                source: err,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ScriptError::Failed {
                path: path.to_path_buf(),
                status,
            })
        }
    }
}
