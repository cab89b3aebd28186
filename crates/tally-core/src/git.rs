//! Git adapter: shells out to the `git` command-line tool.
//!
//! All commands run synchronously with the workspace root as working
//! directory. Commit identifiers are opaque strings; callers truncate
//! to 8 characters for display only, never for lookup. Nothing is
//! retried. Git's own internal locking serializes concurrent git
//! invocations; this adapter adds no lock layer of its own.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{TallyError, TallyResult};

/// Wrapper around the `git` CLI for one workspace.
pub struct GitAdapter {
    workspace: PathBuf,
}

impl GitAdapter {
    pub fn new(workspace: &Path) -> Self {
        Self {
            workspace: workspace.to_path_buf(),
        }
    }

    /// True if a repository exists at the workspace root.
    pub fn is_ready(&self) -> bool {
        self.workspace.join(".git").exists()
    }

    /// Initialize a repository at the workspace root if none exists.
    /// Idempotent. Only called in front of staging operations; read-only
    /// operations must fail instead of auto-creating a repository.
    pub fn ensure_repository(&self, verbose: bool) -> TallyResult<()> {
        if self.is_ready() {
            return Ok(());
        }
        self.output(&["init"])?;
        if verbose {
            println!("initialized git repository at workspace root");
        }
        Ok(())
    }

    /// Run git with captured output; returns trimmed stdout.
    ///
    /// A spawn failure or non-zero exit is one uniform `Git` error with
    /// the command's stderr as detail.
    pub fn output(&self, args: &[&str]) -> TallyResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workspace)
            .output()
            .map_err(|e| TallyError::Git {
                args: args.join(" "),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(TallyError::Git {
                args: args.join(" "),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stage the given paths and commit; returns the new commit id.
    ///
    /// Lazily initializes the repository first. Any failure (including
    /// "nothing to commit") surfaces as one `Git` error; the caller logs
    /// it and moves on without retrying.
    pub fn stage_and_commit(&self, paths: &[&str], message: &str) -> TallyResult<String> {
        self.ensure_repository(false)?;

        let mut add_args = vec!["add"];
        add_args.extend_from_slice(paths);
        self.output(&add_args)?;
        self.output(&["commit", "-m", message])?;
        // Read the id back only after the commit succeeded.
        self.output(&["rev-parse", "HEAD"])
    }

    /// Create a named tag pointing at a commit.
    pub fn tag(&self, name: &str, commit: &str) -> TallyResult<()> {
        self.output(&["tag", name, commit])?;
        Ok(())
    }

    /// Textual diff between two commit identifiers; empty string when
    /// the commits match. Fails if no repository exists or either id is
    /// invalid; never initializes a repository.
    pub fn diff(&self, commit_a: &str, commit_b: &str) -> TallyResult<String> {
        if !self.is_ready() {
            return Err(TallyError::Git {
                args: "diff".to_string(),
                detail: "no git repository in workspace".to_string(),
            });
        }
        self.output(&["diff", commit_a, commit_b])
    }

    /// Run an arbitrary git command with inherited stdio so interactive
    /// commands work; returns the process exit code. Requires an existing
    /// repository (use ensure_repository/init first).
    pub fn passthrough(&self, args: &[String]) -> TallyResult<i32> {
        if !self.is_ready() {
            return Err(TallyError::Git {
                args: args.join(" "),
                detail: "no git repository in workspace".to_string(),
            });
        }
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.workspace)
            .status()
            .map_err(|e| TallyError::Git {
                args: args.join(" "),
                detail: e.to_string(),
            })?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Init a repo and set the identity commits need.
    fn ready_adapter(dir: &Path) -> GitAdapter {
        let git = GitAdapter::new(dir);
        git.ensure_repository(false).unwrap();
        git.output(&["config", "user.email", "test@test.com"]).unwrap();
        git.output(&["config", "user.name", "Test"]).unwrap();
        git
    }

    #[test]
    fn test_ensure_repository_idempotent() {
        let dir = tempdir().unwrap();
        let git = GitAdapter::new(dir.path());
        assert!(!git.is_ready());
        git.ensure_repository(false).unwrap();
        assert!(git.is_ready());
        git.ensure_repository(false).unwrap();
        assert!(git.is_ready());
    }

    #[test]
    fn test_stage_and_commit_returns_id() {
        let dir = tempdir().unwrap();
        let git = ready_adapter(dir.path());

        fs::write(dir.path().join("a.txt"), "aaa").unwrap();
        let commit = git.stage_and_commit(&["a.txt"], "add a").unwrap();
        assert_eq!(commit.len(), 40);
        assert!(commit.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_commit_nothing_fails() {
        let dir = tempdir().unwrap();
        let git = ready_adapter(dir.path());

        fs::write(dir.path().join("a.txt"), "aaa").unwrap();
        git.stage_and_commit(&["a.txt"], "add a").unwrap();

        // Second commit with no changes staged.
        let result = git.stage_and_commit(&["a.txt"], "again");
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_and_diff() {
        let dir = tempdir().unwrap();
        let git = ready_adapter(dir.path());

        fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        let c1 = git.stage_and_commit(&["a.txt"], "one").unwrap();
        fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        let c2 = git.stage_and_commit(&["a.txt"], "two").unwrap();

        git.tag("demo_v1", &c1).unwrap();
        let tags = git.output(&["tag"]).unwrap();
        assert!(tags.lines().any(|t| t == "demo_v1"));

        let diff = git.diff(&c1, &c2).unwrap();
        assert!(diff.contains("-one"));
        assert!(diff.contains("+two"));

        let same = git.diff(&c1, &c1).unwrap();
        assert!(same.is_empty());
    }

    #[test]
    fn test_diff_without_repo_fails() {
        let dir = tempdir().unwrap();
        let git = GitAdapter::new(dir.path());
        let result = git.diff("aaaa", "bbbb");
        assert!(matches!(result, Err(TallyError::Git { .. })));
        // Must not have auto-created a repository.
        assert!(!git.is_ready());
    }

    #[test]
    fn test_passthrough_without_repo_fails() {
        let dir = tempdir().unwrap();
        let git = GitAdapter::new(dir.path());
        let result = git.passthrough(&["status".to_string()]);
        assert!(result.is_err());
        assert!(!git.is_ready());
    }

    #[test]
    fn test_passthrough_exit_code() {
        let dir = tempdir().unwrap();
        let git = ready_adapter(dir.path());
        let code = git.passthrough(&["status".to_string()]).unwrap();
        assert_eq!(code, 0);
    }
}
