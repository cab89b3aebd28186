//! Version file seeding.
//!
//! A new version file's initial content comes from exactly one seed
//! source. The caller picks the source up front; there is no implicit
//! precedence logic in here. Each strategy returns a short provenance
//! string that ends up in the commit message and operator output.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TallyError, TallyResult};
use crate::fsutil::{copy_mode, make_executable};
use crate::ledger::{now_iso, ProjectRecord};

/// Header metadata lines are only rewritten within this many lines from
/// the top of the file.
const HEADER_SCAN_LINES: usize = 6;

/// How to produce a new version file's content.
#[derive(Debug, Clone)]
pub enum SeedSource {
    /// Byte-for-byte copy of an existing file outside the workspace.
    ExternalPath(PathBuf),
    /// Copy from a named existing version in the same project.
    PriorVersion(String),
    /// Synthesized header plus caller-supplied body text.
    InlineContent(String),
    /// Copy from the lexicographically greatest existing version, or a
    /// blank template when the project has none.
    AutoLatest,
    /// Minimal runnable greeting template.
    Blank,
}

/// What the seeder did, for the ledger record and the commit message.
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    /// Human-readable description of how the file was seeded.
    pub provenance: String,
    /// Lineage established by the seeding itself, if any.
    pub copied_from: Option<String>,
}

/// Materialize the version file at `dest` from the given source.
///
/// Fails before writing anything when the source is missing, so a
/// failed seed leaves no file behind.
pub fn seed(
    workspace: &Path,
    record: &ProjectRecord,
    project: &str,
    version: &str,
    dest: &Path,
    source: &SeedSource,
) -> TallyResult<SeedOutcome> {
    match source {
        SeedSource::ExternalPath(src) => {
            if !src.exists() {
                return Err(TallyError::SourceMissing(src.clone()));
            }
            fs::copy(src, dest)?;
            Ok(SeedOutcome {
                provenance: format!("from external file {}", src.display()),
                copied_from: None,
            })
        }
        SeedSource::PriorVersion(name) => {
            copy_from_version(workspace, record, project, version, name, dest)?;
            Ok(SeedOutcome {
                provenance: format!("auto-copied from {name}"),
                copied_from: Some(name.clone()),
            })
        }
        SeedSource::InlineContent(body) => {
            write_templated(project, version, dest, body)?;
            Ok(SeedOutcome {
                provenance: "inline content".to_string(),
                copied_from: None,
            })
        }
        SeedSource::AutoLatest => match record.latest_version() {
            Some(latest) => {
                let latest = latest.to_string();
                copy_from_version(workspace, record, project, version, &latest, dest)?;
                Ok(SeedOutcome {
                    provenance: format!("auto-copied from latest ({latest})"),
                    copied_from: Some(latest),
                })
            }
            None => seed(workspace, record, project, version, dest, &SeedSource::Blank),
        },
        SeedSource::Blank => {
            let body = format!("echo 'Hello from {project} {version}!'\n");
            write_templated(project, version, dest, &body)?;
            Ok(SeedOutcome {
                provenance: "blank template".to_string(),
                copied_from: None,
            })
        }
    }
}

/// Write a fresh header block plus body and mark the file executable.
fn write_templated(project: &str, version: &str, dest: &Path, body: &str) -> TallyResult<()> {
    let content = format!(
        "#!/bin/sh\n# Project: {project}\n# Version: {version}\n# Created: {}\n\n{body}",
        now_iso()
    );
    fs::write(dest, content)?;
    make_executable(dest)?;
    Ok(())
}

/// Copy an existing version's file, refresh its header lines, and carry
/// over its permission bits.
fn copy_from_version(
    workspace: &Path,
    record: &ProjectRecord,
    project: &str,
    version: &str,
    from: &str,
    dest: &Path,
) -> TallyResult<()> {
    let prev = record
        .versions
        .get(from)
        .ok_or_else(|| TallyError::VersionNotFound {
            project: project.to_string(),
            version: from.to_string(),
        })?;

    let prev_file = workspace.join(&prev.filename);
    if !prev_file.exists() {
        return Err(TallyError::SourceMissing(prev_file));
    }

    let text = fs::read_to_string(&prev_file)?;
    let rewritten = rewrite_header(&text, project, version);
    fs::write(dest, rewritten)?;
    copy_mode(&prev_file, dest)?;
    Ok(())
}

/// Update `# Version:` / `# Created:` lines near the top of a copied
/// file; the `# Project:` line is re-stamped with the (same) project
/// name. Only simple `# Key: value` lines are touched.
fn rewrite_header(text: &str, project: &str, version: &str) -> String {
    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    for line in lines.iter_mut().take(HEADER_SCAN_LINES) {
        if line.starts_with("# Version:") {
            *line = format!("# Version: {version}");
        } else if line.starts_with("# Created:") {
            *line = format!("# Created: {}", now_iso());
        } else if line.starts_with("# Project:") {
            *line = format!("# Project: {project}");
        }
    }
    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsutil::is_executable;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn empty_record() -> ProjectRecord {
        ProjectRecord {
            created_at: now_iso(),
            description: String::new(),
            git_enabled: false,
            tags: Vec::new(),
            versions: BTreeMap::new(),
        }
    }

    #[test]
    fn test_blank_template() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("demo_v1.sh");
        let outcome = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v1",
            &dest,
            &SeedSource::Blank,
        )
        .unwrap();

        assert_eq!(outcome.provenance, "blank template");
        assert_eq!(outcome.copied_from, None);

        let content = fs::read_to_string(&dest).unwrap();
        assert!(content.starts_with("#!/bin/sh\n"));
        assert!(content.contains("# Project: demo"));
        assert!(content.contains("# Version: v1"));
        assert!(content.contains("Hello from demo v1!"));
        assert!(is_executable(&dest));
    }

    #[test]
    fn test_inline_content() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("demo_v1.sh");
        let outcome = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v1",
            &dest,
            &SeedSource::InlineContent("echo hi\n".to_string()),
        )
        .unwrap();

        assert_eq!(outcome.provenance, "inline content");
        let content = fs::read_to_string(&dest).unwrap();
        assert!(content.ends_with("echo hi\n"));
        assert!(content.contains("# Created: "));
        assert!(is_executable(&dest));
    }

    #[test]
    fn test_external_path_missing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("demo_v1.sh");
        let result = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v1",
            &dest,
            &SeedSource::ExternalPath(dir.path().join("nope.sh")),
        );
        assert!(matches!(result, Err(TallyError::SourceMissing(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_external_path_copies_bytes() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.sh");
        fs::write(&src, "#!/bin/sh\nexit 0\n").unwrap();
        let dest = dir.path().join("demo_v1.sh");

        let outcome = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v1",
            &dest,
            &SeedSource::ExternalPath(src.clone()),
        )
        .unwrap();

        assert!(outcome.provenance.starts_with("from external file"));
        assert_eq!(fs::read(&dest).unwrap(), fs::read(&src).unwrap());
    }

    #[test]
    fn test_prior_version_rewrites_header_only() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("projects/demo")).unwrap();

        let mut record = empty_record();
        let v1_dest = dir.path().join("projects/demo/demo_v1.sh");
        seed(
            dir.path(),
            &record,
            "demo",
            "v1",
            &v1_dest,
            &SeedSource::InlineContent("echo body\necho more\n".to_string()),
        )
        .unwrap();
        record.versions.insert(
            "v1".to_string(),
            crate::ledger::VersionRecord {
                filename: "projects/demo/demo_v1.sh".to_string(),
                created_at: now_iso(),
                description: String::new(),
                copied_from: None,
                dependencies: Vec::new(),
                last_run: None,
                notes: String::new(),
                git_commit: None,
            },
        );

        let v2_dest = dir.path().join("projects/demo/demo_v2.sh");
        let outcome = seed(
            dir.path(),
            &record,
            "demo",
            "v2",
            &v2_dest,
            &SeedSource::PriorVersion("v1".to_string()),
        )
        .unwrap();

        assert_eq!(outcome.copied_from.as_deref(), Some("v1"));

        let v1_text = fs::read_to_string(&v1_dest).unwrap();
        let v2_text = fs::read_to_string(&v2_dest).unwrap();
        assert!(v2_text.contains("# Version: v2"));

        // Everything below the header lines is byte-identical.
        let tail = |t: &str| t.lines().skip(4).collect::<Vec<_>>().join("\n");
        assert_eq!(tail(&v1_text), tail(&v2_text));
        // Executable bit carried over from the source.
        assert_eq!(is_executable(&v1_dest), is_executable(&v2_dest));
    }

    #[test]
    fn test_prior_version_unknown_name() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("demo_v2.sh");
        let result = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v2",
            &dest,
            &SeedSource::PriorVersion("ghost".to_string()),
        );
        assert!(matches!(result, Err(TallyError::VersionNotFound { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_auto_latest_falls_back_to_blank() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("demo_v1.sh");
        let outcome = seed(
            dir.path(),
            &empty_record(),
            "demo",
            "v1",
            &dest,
            &SeedSource::AutoLatest,
        )
        .unwrap();
        assert_eq!(outcome.provenance, "blank template");
    }
}
