//! Workspace summary report and sanity check cycle.
//!
//! The report is a markdown snapshot of one project: ledger metadata,
//! repository status, health warnings, and the results of a small
//! check cycle (list, run the latest version, git status). Written to
//! `report.md` at the workspace root. Git failures are rendered inline
//! rather than aborting the report.

use std::fs;
use std::path::PathBuf;

use crate::error::TallyResult;
use crate::ledger::{now_iso, LedgerStore};
use crate::log::log_path;
use crate::workspace::Workspace;

/// Name of the generated report file at the workspace root.
pub const REPORT_FILE: &str = "report.md";

/// Run the sanity check cycle for a project and return markdown lines:
/// list the project, run its lexicographically-latest version, and
/// capture `git status`.
pub fn run_check_cycle<S: LedgerStore>(
    ws: &Workspace<S>,
    project: &str,
) -> TallyResult<Vec<String>> {
    let record = ws.project(project)?;
    let mut lines = Vec::new();
    lines.push(format!("# Check Cycle Results for {project}\n"));

    lines.push("### Step 1 - List Project".to_string());
    lines.push(format!(
        "project listed: {} version(s)\n",
        record.versions.len()
    ));

    lines.push("### Step 2 - Run Latest Version".to_string());
    match record.latest_version() {
        Some(latest) => {
            let latest = latest.to_string();
            match ws.run_version(project, &latest) {
                Ok(outcome) if outcome.exit_code == 0 => {
                    lines.push(format!("ran latest version ({latest}) successfully\n"));
                }
                Ok(outcome) => {
                    lines.push(format!(
                        "latest version ({latest}) exited with code {}\n",
                        outcome.exit_code
                    ));
                }
                Err(e) => lines.push(format!("error running version {latest}: {e}\n")),
            }
        }
        None => lines.push("no versions found\n".to_string()),
    }

    lines.push("### Step 3 - Git Status".to_string());
    let status = ws
        .git()
        .output(&["status", "-sb"])
        .unwrap_or_else(|_| "(git status failed)".to_string());
    lines.push(format!("```\n{status}\n```\n"));

    Ok(lines)
}

/// Generate `report.md` for a project at the workspace root and return
/// its path. With `include_code`, version file contents are embedded.
pub fn generate_report<S: LedgerStore>(
    ws: &Workspace<S>,
    project: &str,
    include_code: bool,
) -> TallyResult<PathBuf> {
    let record = ws.project(project)?;
    let git = ws.git();
    let mut lines = Vec::new();

    lines.push(format!("# Report - {project}"));
    lines.push(format!("Generated: {}\n", now_iso()));
    lines.push(format!("**Description:** {}\n", record.description));
    lines.push(format!("**Git enabled:** {}\n", record.git_enabled));
    lines.push(format!("**Workspace:** {}", ws.root().display()));
    lines.push("---\n".to_string());

    let status = git
        .output(&["status", "-sb"])
        .unwrap_or_else(|_| "(git status failed)".to_string());
    let commits = git
        .output(&["log", "--oneline", "-5"])
        .unwrap_or_else(|_| "(git log failed)".to_string());
    let tags = git
        .output(&["tag"])
        .map(|t| if t.is_empty() { "(no tags)".to_string() } else { t })
        .unwrap_or_else(|_| "(no tags)".to_string());
    lines.push("## Repo Status".to_string());
    lines.push(format!("{status}\n"));
    lines.push("## Recent Commits".to_string());
    lines.push(format!("{commits}\n"));
    lines.push("## Tags".to_string());
    lines.push(format!("{tags}\n"));
    lines.push("---\n".to_string());

    lines.push("## Versions".to_string());
    for (name, meta) in &record.versions {
        lines.push(format!(
            "- {name}: {} (created {})",
            meta.description, meta.created_at
        ));
        lines.push(format!("  - file: {}", meta.filename));
        lines.push(format!("  - copied_from: {:?}", meta.copied_from));
        lines.push(format!("  - git_commit: {:?}", meta.git_commit));
        lines.push(format!("  - last_run: {:?}\n", meta.last_run));

        if include_code {
            let path = ws.root().join(&meta.filename);
            match fs::read_to_string(&path) {
                Ok(code) => {
                    lines.push("```sh".to_string());
                    lines.push(code.trim().to_string());
                    lines.push("```\n".to_string());
                }
                Err(e) => lines.push(format!("could not read {}: {e}\n", path.display())),
            }
        }
    }

    lines.push("## Project Log".to_string());
    let log_file = log_path(ws.root(), project);
    if log_file.exists() {
        lines.push(fs::read_to_string(&log_file)?);
    } else {
        lines.push("(no log yet)\n".to_string());
    }
    lines.push("---\n".to_string());

    lines.push("## Health Warnings".to_string());
    if record.versions.is_empty() {
        lines.push("no versions found".to_string());
    } else {
        let missing: Vec<&str> = record
            .versions
            .iter()
            .filter(|(_, m)| m.git_commit.is_none())
            .map(|(v, _)| v.as_str())
            .collect();
        if missing.is_empty() {
            lines.push("all versions have git commits".to_string());
        } else {
            lines.push(format!("versions missing commits: {}", missing.join(", ")));
        }
        if let Some(latest) = record.latest_version() {
            if record.versions[latest].last_run.is_some() {
                lines.push(format!("- latest version ({latest}) was run"));
            } else {
                lines.push(format!("- latest version ({latest}) has not been run"));
            }
        }
    }
    if log_file.exists() {
        lines.push("- project log present".to_string());
    } else {
        lines.push("- project log missing".to_string());
    }

    lines.push("\n---\n".to_string());
    lines.extend(run_check_cycle(ws, project)?);

    let out = ws.root().join(REPORT_FILE);
    fs::write(&out, lines.join("\n"))?;
    Ok(out)
}
