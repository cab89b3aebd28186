//! On-disk layout of project directories and version files.
//!
//! Every version file lives at `projects/<project>/<project>_<version>.sh`,
//! so the mapping project x version -> path is derivable without the
//! ledger. The ledger stores the path anyway, for auditability and so a
//! commit id can be recorded against it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TallyResult;

/// Directory under the workspace root that holds all projects.
pub const PROJECTS_DIR: &str = "projects";

/// Extension of seeded version files.
pub const VERSION_EXT: &str = "sh";

/// Manages project directories and version file paths for one workspace.
pub struct ProjectStore {
    workspace: PathBuf,
}

impl ProjectStore {
    pub fn new(workspace: &Path) -> Self {
        Self {
            workspace: workspace.to_path_buf(),
        }
    }

    /// Absolute path of a project's directory.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.workspace.join(PROJECTS_DIR).join(project)
    }

    /// Create the project's directory. Idempotent at the filesystem
    /// level; the ledger-level uniqueness check is the caller's job and
    /// must run before this.
    pub fn create(&self, project: &str) -> TallyResult<PathBuf> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Deterministic workspace-relative path for a version file. Pure,
    /// no I/O.
    pub fn rel_path(project: &str, version: &str) -> String {
        format!("{PROJECTS_DIR}/{project}/{project}_{version}.{VERSION_EXT}")
    }

    /// Resolve a workspace-relative path to an absolute one.
    pub fn abs_path(&self, rel: &str) -> PathBuf {
        self.workspace.join(rel)
    }

    /// True if the version file for project/version exists on disk.
    pub fn file_exists(&self, project: &str, version: &str) -> bool {
        self.abs_path(&Self::rel_path(project, version)).exists()
    }
}
