//! Workspace — the main entry point for tally operations.
//!
//! A Workspace ties together the ledger store, project store, seeder,
//! and git adapter. Every operation validates its preconditions against
//! the ledger before touching the filesystem, and saves the ledger as a
//! whole document afterwards. Git failures downstream of a successful
//! ledger write never roll it back; an absent `git_commit` on a record
//! is the visible marker of incomplete git sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{TallyError, TallyResult};
use crate::git::GitAdapter;
use crate::ledger::{now_iso, Ledger, LedgerStore, JsonLedgerStore, ProjectRecord, VersionRecord, LEDGER_FILE};
use crate::seed::{self, SeedSource};
use crate::store::ProjectStore;

/// A tally workspace rooted at one directory.
pub struct Workspace<S: LedgerStore> {
    root: PathBuf,
    ledger: S,
    store: ProjectStore,
    git: GitAdapter,
}

/// Result of creating a project.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// Absolute path of the new project directory.
    pub path: PathBuf,
    /// Commit id when the project is git-enabled and the commit succeeded.
    pub commit: Option<String>,
    /// Non-fatal git problem to surface to the operator.
    pub git_warning: Option<String>,
}

/// Result of adding a version.
#[derive(Debug, Clone)]
pub struct AddVersionOutcome {
    /// Workspace-relative path of the new version file.
    pub filename: String,
    /// How the file's content was seeded.
    pub provenance: String,
    /// Commit id recorded in the ledger, when git is enabled and the
    /// commit succeeded.
    pub commit: Option<String>,
    /// Whether the `<project>_<version>` tag was created.
    pub tag_created: bool,
    /// Non-fatal git problem to surface to the operator.
    pub git_warning: Option<String>,
}

/// Result of running a version file.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Workspace-relative path of the file that ran.
    pub filename: String,
    /// The child process's exit code.
    pub exit_code: i32,
}

/// Result of diffing two committed versions.
#[derive(Debug, Clone)]
pub struct DiffOutcome {
    pub commit_a: String,
    pub commit_b: String,
    /// Unified diff text; empty when the commits match.
    pub text: String,
}

impl Workspace<JsonLedgerStore> {
    /// Open the workspace rooted at the given directory, with the
    /// ledger persisted to `<root>/ledger.json`.
    pub fn open(root: &Path) -> Self {
        Self::with_store(root, JsonLedgerStore::new(root))
    }
}

impl<S: LedgerStore> Workspace<S> {
    /// Workspace with an injected ledger backend (in-memory in tests).
    pub fn with_store(root: &Path, ledger: S) -> Self {
        Self {
            root: root.to_path_buf(),
            ledger,
            store: ProjectStore::new(root),
            git: GitAdapter::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The workspace's git adapter, for passthrough and init commands.
    pub fn git(&self) -> &GitAdapter {
        &self.git
    }

    /// Load the full ledger document.
    pub fn ledger(&self) -> TallyResult<Ledger> {
        self.ledger.load()
    }

    /// Load one project's record.
    pub fn project(&self, name: &str) -> TallyResult<ProjectRecord> {
        let ledger = self.ledger.load()?;
        ledger
            .projects
            .get(name)
            .cloned()
            .ok_or_else(|| TallyError::ProjectNotFound(name.to_string()))
    }

    /// Create a project: directory + ledger record, optionally a commit.
    ///
    /// The ledger-level uniqueness check runs before any filesystem
    /// mutation; a duplicate name leaves disk and ledger untouched.
    pub fn create_project(
        &self,
        name: &str,
        description: &str,
        git_enabled: bool,
    ) -> TallyResult<CreateOutcome> {
        let mut ledger = self.ledger.load()?;
        if ledger.projects.contains_key(name) {
            return Err(TallyError::ProjectExists(name.to_string()));
        }

        let path = self.store.create(name)?;
        ledger.projects.insert(
            name.to_string(),
            ProjectRecord {
                created_at: now_iso(),
                description: description.to_string(),
                git_enabled,
                tags: Vec::new(),
                versions: BTreeMap::new(),
            },
        );
        self.ledger.save(&ledger)?;

        let mut commit = None;
        let mut git_warning = None;
        if git_enabled {
            let dir_spec = format!("projects/{name}/");
            match self
                .git
                .stage_and_commit(&[LEDGER_FILE, dir_spec.as_str()], &format!("Create project {name}"))
            {
                Ok(id) => commit = Some(id),
                Err(e) => git_warning = Some(e.to_string()),
            }
        }

        Ok(CreateOutcome {
            path,
            commit,
            git_warning,
        })
    }

    /// Add a new version to a project.
    ///
    /// Seeds the file, records it with `git_commit: None`, then (for
    /// git-enabled projects) commits the file plus the ledger, tags the
    /// commit `<project>_<version>`, and writes the commit id back into
    /// the record. Seeding failures happen before any mutation; tag
    /// failures are reported but do not undo the commit or the record.
    pub fn add_version(
        &self,
        project: &str,
        version: &str,
        description: &str,
        dependencies: Vec<String>,
        copied_from: Option<String>,
        source: &SeedSource,
    ) -> TallyResult<AddVersionOutcome> {
        let mut ledger = self.ledger.load()?;
        let record = ledger
            .projects
            .get(project)
            .cloned()
            .ok_or_else(|| TallyError::ProjectNotFound(project.to_string()))?;

        self.store.create(project)?;
        let rel = ProjectStore::rel_path(project, version);
        let dest = self.store.abs_path(&rel);
        let seeded = seed::seed(&self.root, &record, project, version, &dest, source)?;

        // Seed-derived lineage wins over a manual override.
        let lineage = seeded.copied_from.clone().or(copied_from);
        let target = ledger
            .projects
            .get_mut(project)
            .ok_or_else(|| TallyError::ProjectNotFound(project.to_string()))?;
        target.versions.insert(
            version.to_string(),
            VersionRecord {
                filename: rel.clone(),
                created_at: now_iso(),
                description: description.to_string(),
                copied_from: lineage,
                dependencies,
                last_run: None,
                notes: String::new(),
                git_commit: None,
            },
        );
        self.ledger.save(&ledger)?;

        let mut commit = None;
        let mut tag_created = false;
        let mut git_warning = None;

        if record.git_enabled {
            let subject = if description.is_empty() {
                "New version"
            } else {
                description
            };
            let msg = format!("{project} {version}: {subject} ({})", seeded.provenance);
            match self.git.stage_and_commit(&[rel.as_str(), LEDGER_FILE], &msg) {
                Ok(id) => {
                    let tag_name = format!("{project}_{version}");
                    match self.git.tag(&tag_name, &id) {
                        Ok(()) => tag_created = true,
                        Err(e) => git_warning = Some(e.to_string()),
                    }

                    // Re-read so the persisted id lands on the freshest
                    // document, then record it.
                    let mut ledger = self.ledger.load()?;
                    if let Some(vr) = ledger
                        .projects
                        .get_mut(project)
                        .and_then(|p| p.versions.get_mut(version))
                    {
                        vr.git_commit = Some(id.clone());
                    }
                    self.ledger.save(&ledger)?;
                    commit = Some(id);
                }
                Err(e) => git_warning = Some(e.to_string()),
            }
        }

        Ok(AddVersionOutcome {
            filename: rel,
            provenance: seeded.provenance,
            commit,
            tag_created,
            git_warning,
        })
    }

    /// Run a version's file as a subprocess with inherited stdio.
    ///
    /// `last_run` is stamped unconditionally, even on non-zero exit;
    /// the child's exit code is the operation's result, not an error.
    pub fn run_version(&self, project: &str, version: &str) -> TallyResult<RunOutcome> {
        let mut ledger = self.ledger.load()?;
        let meta = ledger
            .projects
            .get(project)
            .ok_or_else(|| TallyError::ProjectNotFound(project.to_string()))?
            .versions
            .get(version)
            .ok_or_else(|| TallyError::VersionNotFound {
                project: project.to_string(),
                version: version.to_string(),
            })?;

        let filename = meta.filename.clone();
        let abs = self.root.join(&filename);
        if !abs.exists() {
            return Err(TallyError::FileMissing(abs));
        }

        let status = Command::new(&abs).current_dir(&self.root).status()?;
        let exit_code = status.code().unwrap_or(-1);

        if let Some(vr) = ledger
            .projects
            .get_mut(project)
            .and_then(|p| p.versions.get_mut(version))
        {
            vr.last_run = Some(now_iso());
        }
        self.ledger.save(&ledger)?;

        Ok(RunOutcome {
            filename,
            exit_code,
        })
    }

    /// Diff two versions via their recorded commits.
    ///
    /// Strictly a git operation: a version without a recorded commit is
    /// a MissingCommit failure, never a content diff of the files.
    pub fn diff_versions(
        &self,
        project: &str,
        version_a: &str,
        version_b: &str,
    ) -> TallyResult<DiffOutcome> {
        let ledger = self.ledger.load()?;
        let record = ledger
            .projects
            .get(project)
            .ok_or_else(|| TallyError::ProjectNotFound(project.to_string()))?;

        let commit_of = |version: &str| -> TallyResult<String> {
            let meta =
                record
                    .versions
                    .get(version)
                    .ok_or_else(|| TallyError::VersionNotFound {
                        project: project.to_string(),
                        version: version.to_string(),
                    })?;
            meta.git_commit
                .clone()
                .ok_or_else(|| TallyError::MissingCommit {
                    project: project.to_string(),
                    version: version.to_string(),
                })
        };

        let commit_a = commit_of(version_a)?;
        let commit_b = commit_of(version_b)?;
        let text = self.git.diff(&commit_a, &commit_b)?;

        Ok(DiffOutcome {
            commit_a,
            commit_b,
            text,
        })
    }
}
