//! Error types for tally operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// All possible tally errors.
#[derive(Debug)]
pub enum TallyError {
    /// The named project is not in the ledger.
    ProjectNotFound(String),
    /// A project with this name already exists.
    ProjectExists(String),
    /// The named version is not in the project's ledger record.
    VersionNotFound { project: String, version: String },
    /// A seed source path (external file or prior version file) is missing.
    SourceMissing(PathBuf),
    /// A recorded version file is missing on disk.
    FileMissing(PathBuf),
    /// Diff was requested but a version was never committed.
    MissingCommit { project: String, version: String },
    /// The git command failed or no repository is available.
    Git { args: String, detail: String },
    /// An I/O error occurred.
    Io(io::Error),
    /// JSON serialization/deserialization failed.
    Json(serde_json::Error),
}

impl fmt::Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TallyError::ProjectNotFound(name) => write!(f, "project '{name}' not found"),
            TallyError::ProjectExists(name) => write!(f, "project '{name}' already exists"),
            TallyError::VersionNotFound { project, version } => {
                write!(f, "version '{version}' not found in project '{project}'")
            }
            TallyError::SourceMissing(path) => {
                write!(f, "seed source not found: {}", path.display())
            }
            TallyError::FileMissing(path) => {
                write!(f, "file missing on disk: {}", path.display())
            }
            TallyError::MissingCommit { project, version } => {
                write!(
                    f,
                    "version '{version}' of project '{project}' has no recorded commit, cannot diff"
                )
            }
            TallyError::Git { args, detail } => write!(f, "git {args} failed: {detail}"),
            TallyError::Io(e) => write!(f, "I/O error: {e}"),
            TallyError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for TallyError {}

impl From<io::Error> for TallyError {
    fn from(e: io::Error) -> Self {
        TallyError::Io(e)
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(e: serde_json::Error) -> Self {
        TallyError::Json(e)
    }
}

/// Convenience alias for Results in tally.
pub type TallyResult<T> = Result<T, TallyError>;
