//! The ledger: persistent project/version metadata.
//!
//! A single JSON document at the workspace root (`ledger.json`) maps
//! project name -> project record -> version name -> version record.
//! Loaders tolerate unknown extra fields so older binaries can read
//! ledgers written by newer ones.
//!
//! Persistence is whole-document load-mutate-save. There is no locking:
//! concurrent invocations against the same workspace can lose each
//! other's updates (last save wins). A single invocation is the only
//! supported writer.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::TallyResult;
use crate::fsutil::atomic_write;

/// Name of the ledger file at the workspace root.
pub const LEDGER_FILE: &str = "ledger.json";

/// Current local time in the ledger's timestamp format (ISO-8601,
/// seconds precision).
pub fn now_iso() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Metadata for one named revision of a project's file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Workspace-relative path of the version file.
    pub filename: String,
    /// Creation timestamp (ISO-8601, seconds precision).
    pub created_at: String,
    #[serde(default)]
    pub description: String,
    /// Version this one's content was copied from, if any. A soft
    /// reference: the source may later disappear without invalidating it.
    #[serde(default)]
    pub copied_from: Option<String>,
    /// Advisory dependency list; stored, never interpreted.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Set every time the version is run, regardless of exit code.
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// Populated only after a successful commit of this version.
    #[serde(default)]
    pub git_commit: Option<String>,
}

/// Metadata for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Creation timestamp (ISO-8601, seconds precision).
    pub created_at: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub git_enabled: bool,
    /// Stored for future use; nothing reads these yet.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Version name -> record. BTreeMap keeps keys in lexicographic
    /// order, which is what "latest" means in this design.
    #[serde(default)]
    pub versions: BTreeMap<String, VersionRecord>,
}

impl ProjectRecord {
    /// The lexicographically greatest version name, if any.
    ///
    /// This is a naming-order heuristic, not a recency guarantee:
    /// "v9" sorts after "v10".
    pub fn latest_version(&self) -> Option<&str> {
        self.versions.keys().next_back().map(String::as_str)
    }
}

/// The full ledger document.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// Map of project name -> project record.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectRecord>,
}

/// Storage backend for the ledger document.
///
/// Every operation is a whole-document transaction: `load()`, mutate,
/// `save()`. File-backed in production, in-memory in tests.
pub trait LedgerStore {
    /// Read the persisted document, or a fresh empty one if absent.
    /// Malformed persisted data is an error, never silently recovered.
    fn load(&self) -> TallyResult<Ledger>;

    /// Serialize and overwrite the persisted document.
    fn save(&self, ledger: &Ledger) -> TallyResult<()>;
}

/// JSON-file-backed ledger store.
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    /// Store backed by `<workspace>/ledger.json`.
    pub fn new(workspace: &Path) -> Self {
        Self {
            path: workspace.join(LEDGER_FILE),
        }
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self) -> TallyResult<Ledger> {
        if !self.path.exists() {
            return Ok(Ledger::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let ledger: Ledger = serde_json::from_str(&data)?;
        Ok(ledger)
    }

    fn save(&self, ledger: &Ledger) -> TallyResult<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

/// In-memory ledger store for tests.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledger: RefCell<Ledger>,
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> TallyResult<Ledger> {
        Ok(self.ledger.borrow().clone())
    }

    fn save(&self, ledger: &Ledger) -> TallyResult<()> {
        *self.ledger.borrow_mut() = ledger.clone();
        Ok(())
    }
}
