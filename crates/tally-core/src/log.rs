//! Per-project append-only log under `docs/`.
//!
//! The log is operator-facing prose, external to the ledger: entries
//! are never parsed back. Optionally committed when the project is
//! git-enabled.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{TallyError, TallyResult};
use crate::git::GitAdapter;
use crate::ledger::{now_iso, LedgerStore};

/// Path of a project's log file: `docs/<PROJECT_UPPER>_LOG.md`.
pub fn log_path(workspace: &Path, project: &str) -> PathBuf {
    workspace
        .join("docs")
        .join(format!("{}_LOG.md", project.to_uppercase()))
}

/// Result of appending a log entry.
#[derive(Debug, Clone)]
pub struct LogOutcome {
    /// Absolute path of the log file.
    pub path: PathBuf,
    /// Whether the log file was committed.
    pub committed: bool,
    /// Why a requested commit was skipped, if it was.
    pub skipped: Option<String>,
    /// Non-fatal git problem to surface to the operator.
    pub git_warning: Option<String>,
}

/// Append a timestamped entry to the project's log, creating the file
/// (with a heading) on first use. With `commit`, also stages and
/// commits the log file when the project is git-enabled; otherwise the
/// commit is skipped with a notice. The entry itself is the core
/// mutation: once it is on disk, a failed commit is reported as a
/// warning in the outcome, never as an error.
pub fn append_entry<S: LedgerStore>(
    workspace: &Path,
    ledger: &S,
    project: &str,
    message: &str,
    commit: bool,
) -> TallyResult<LogOutcome> {
    let doc = ledger.load()?;
    let record = doc
        .projects
        .get(project)
        .ok_or_else(|| TallyError::ProjectNotFound(project.to_string()))?;

    let path = log_path(workspace, project);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let entry = format!("- [{}] {message}\n", now_iso());
    if !path.exists() {
        fs::write(&path, format!("# {project} Log\n\n{entry}"))?;
    } else {
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(entry.as_bytes())?;
    }

    let mut committed = false;
    let mut skipped = None;
    let mut git_warning = None;
    if commit {
        if record.git_enabled {
            let rel = format!("docs/{}_LOG.md", project.to_uppercase());
            let git = GitAdapter::new(workspace);
            match git.stage_and_commit(&[rel.as_str()], &format!("{project} log: {message}")) {
                Ok(_) => committed = true,
                Err(e) => git_warning = Some(e.to_string()),
            }
        } else {
            skipped = Some("git not enabled for this project".to_string());
        }
    }

    Ok(LogOutcome {
        path,
        committed,
        skipped,
        git_warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::JsonLedgerStore;
    use crate::workspace::Workspace;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_then_appends() {
        let dir = tempdir().unwrap();
        let ws = Workspace::open(dir.path());
        ws.create_project("demo", "", false).unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let first = append_entry(dir.path(), &store, "demo", "started", false).unwrap();
        assert!(first.path.ends_with("docs/DEMO_LOG.md"));
        let text = fs::read_to_string(&first.path).unwrap();
        assert!(text.starts_with("# demo Log\n"));
        assert!(text.contains("started"));

        append_entry(dir.path(), &store, "demo", "continued", false).unwrap();
        let text = fs::read_to_string(&first.path).unwrap();
        // One heading, one line per entry.
        assert_eq!(text.matches("# demo Log").count(), 1);
        assert_eq!(text.matches("- [").count(), 2);
        assert!(text.contains("continued"));
    }

    #[test]
    fn test_append_unknown_project() {
        let dir = tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        let result = append_entry(dir.path(), &store, "ghost", "msg", false);
        assert!(matches!(result, Err(TallyError::ProjectNotFound(_))));
    }

    #[test]
    fn test_commit_failure_is_warning() {
        let dir = tempdir().unwrap();
        let ws = Workspace::open(dir.path());
        // A bogus .git file makes every git command fail while looking
        // like a repository, so nothing re-initializes it.
        fs::write(dir.path().join(".git"), "not a repo").unwrap();
        ws.create_project("demo", "", true).unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let outcome = append_entry(dir.path(), &store, "demo", "entry one", true).unwrap();
        assert!(!outcome.committed);
        assert!(outcome.git_warning.is_some());

        // The entry landed despite the failed commit.
        let text = fs::read_to_string(&outcome.path).unwrap();
        assert!(text.contains("entry one"));
    }

    #[test]
    fn test_commit_skipped_without_git() {
        let dir = tempdir().unwrap();
        let ws = Workspace::open(dir.path());
        ws.create_project("demo", "", false).unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let outcome = append_entry(dir.path(), &store, "demo", "msg", true).unwrap();
        assert!(!outcome.committed);
        assert!(outcome.skipped.is_some());
    }
}
