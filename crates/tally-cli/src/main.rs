//! tally CLI — the operator interface to tally.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tally_core::ledger::JsonLedgerStore;
use tally_core::seed::SeedSource;
use tally_core::{log, report, Workspace};

#[derive(Parser)]
#[command(name = "tally", about = "tally — local project/version bookkeeping with git commits, tags, and diffs", version)]
struct Cli {
    /// Workspace root (defaults to the current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project.
    Create {
        project: String,

        /// Project description.
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Enable git commits for this project.
        #[arg(long)]
        git: bool,
    },

    /// List projects, or the versions of one project.
    List {
        /// Project name (optional).
        project: Option<String>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Save a new version (creates file + ledger entry + commit + tag).
    SaveVersion {
        project: String,
        version: String,

        /// Version description (also the commit message body).
        #[arg(long, short = 'm', default_value = "")]
        message: String,

        /// Seed content from an existing file (wins over the other
        /// seed flags).
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Copy content from an existing version of this project.
        #[arg(long)]
        from_version: Option<String>,

        /// Inline content string for the version file.
        #[arg(long)]
        content: Option<String>,

        /// Record lineage manually (ignored when seeding sets it).
        #[arg(long)]
        copied_from: Option<String>,

        /// Comma-separated dependencies to record.
        #[arg(long, value_delimiter = ',')]
        deps: Option<Vec<String>>,
    },

    /// Run a specific version; exits with the child's exit code.
    Run { project: String, version: String },

    /// Show the git diff between two committed versions.
    Diff {
        project: String,
        version1: String,
        version2: String,
    },

    /// Run a raw git command inside the workspace.
    Git {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        git_args: Vec<String>,
    },

    /// Initialize the workspace git repository.
    InitGit,

    /// Append to the project log.
    Log {
        project: String,

        /// Log message (wrap in quotes).
        message: String,

        /// Also commit the log file to git.
        #[arg(long)]
        commit: bool,
    },

    /// Generate report.md summarizing a project.
    Report {
        project: String,

        /// Embed version file contents in the report.
        #[arg(long)]
        include_code: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let root = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().unwrap_or_else(|e| {
            eprintln!("error: cannot determine current directory: {e}");
            process::exit(1);
        }),
    };
    let ws = Workspace::open(&root);

    let result = match cli.command {
        Commands::Create {
            project,
            description,
            git,
        } => cmd_create(&ws, &project, &description, git),
        Commands::List { project, format } => cmd_list(&ws, project.as_deref(), &format),
        Commands::SaveVersion {
            project,
            version,
            message,
            from_file,
            from_version,
            content,
            copied_from,
            deps,
        } => cmd_save_version(
            &ws,
            &project,
            &version,
            &message,
            from_file,
            from_version,
            content,
            copied_from,
            deps.unwrap_or_default(),
        ),
        Commands::Run { project, version } => cmd_run(&ws, &project, &version),
        Commands::Diff {
            project,
            version1,
            version2,
        } => cmd_diff(&ws, &project, &version1, &version2),
        Commands::Git { git_args } => cmd_git(&ws, &git_args),
        Commands::InitGit => cmd_init_git(&ws),
        Commands::Log {
            project,
            message,
            commit,
        } => cmd_log(&root, &project, &message, commit),
        Commands::Report {
            project,
            include_code,
        } => cmd_report(&ws, &project, include_code),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn cmd_create(
    ws: &Workspace<JsonLedgerStore>,
    project: &str,
    description: &str,
    git: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = ws.create_project(project, description, git)?;
    println!(
        "project '{project}' created at {} (git_enabled={git})",
        outcome.path.display()
    );
    if let Some(commit) = outcome.commit {
        println!("  committed: {}", &commit[..8.min(commit.len())]);
    }
    if let Some(warning) = outcome.git_warning {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn cmd_list(
    ws: &Workspace<JsonLedgerStore>,
    project: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match project {
        Some(name) => {
            let record = ws.project(name)?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }
            println!("{name} (created {})", record.created_at);
            println!("  description: {}", record.description);
            println!("  git_enabled: {}", record.git_enabled);
            if record.versions.is_empty() {
                println!("  versions: (none)");
            } else {
                println!("  versions:");
                for (v, meta) in &record.versions {
                    println!("    - {v} -> {} (created {})", meta.filename, meta.created_at);
                }
            }
        }
        None => {
            let ledger = ws.ledger()?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&ledger)?);
                return Ok(());
            }
            if ledger.projects.is_empty() {
                println!("no projects yet");
                return Ok(());
            }
            println!("projects:");
            for (name, record) in &ledger.projects {
                println!(
                    "  - {name} (versions: {}, created {})",
                    record.versions.len(),
                    record.created_at
                );
            }
        }
    }
    Ok(())
}

/// Seed flags combine by precedence rather than conflicting: external
/// file > prior version > inline content > automatic copy-from-latest
/// (itself falling back to a blank template on a fresh project).
fn resolve_seed_source(
    from_file: Option<PathBuf>,
    from_version: Option<String>,
    content: Option<String>,
) -> SeedSource {
    if let Some(path) = from_file {
        SeedSource::ExternalPath(path)
    } else if let Some(v) = from_version {
        SeedSource::PriorVersion(v)
    } else if let Some(body) = content {
        SeedSource::InlineContent(body)
    } else {
        SeedSource::AutoLatest
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_save_version(
    ws: &Workspace<JsonLedgerStore>,
    project: &str,
    version: &str,
    message: &str,
    from_file: Option<PathBuf>,
    from_version: Option<String>,
    content: Option<String>,
    copied_from: Option<String>,
    deps: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = resolve_seed_source(from_file, from_version, content);
    let outcome = ws.add_version(project, version, message, deps, copied_from, &source)?;
    match &outcome.commit {
        Some(commit) => println!(
            "version '{version}' added, committed, and tagged as {project}_{version} ({}, commit={})",
            outcome.provenance,
            &commit[..8.min(commit.len())]
        ),
        None => println!("version '{version}' added ({})", outcome.provenance),
    }
    if outcome.commit.is_some() && !outcome.tag_created {
        eprintln!("warning: commit succeeded but tagging failed");
    }
    if let Some(warning) = outcome.git_warning {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn cmd_run(
    ws: &Workspace<JsonLedgerStore>,
    project: &str,
    version: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = ws.project(project)?;
    if let Some(meta) = record.versions.get(version) {
        println!("running: {}", meta.filename);
    }
    let outcome = ws.run_version(project, version)?;
    if outcome.exit_code == 0 {
        println!("run finished OK");
    } else {
        eprintln!("run exited with code {}", outcome.exit_code);
    }
    process::exit(outcome.exit_code);
}

fn cmd_diff(
    ws: &Workspace<JsonLedgerStore>,
    project: &str,
    version1: &str,
    version2: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = ws.diff_versions(project, version1, version2)?;
    println!(
        "diff between {version1} ({}) and {version2} ({}):\n",
        &outcome.commit_a[..8.min(outcome.commit_a.len())],
        &outcome.commit_b[..8.min(outcome.commit_b.len())]
    );
    if outcome.text.is_empty() {
        println!("no differences found");
    } else {
        println!("{}", outcome.text);
    }
    Ok(())
}

fn cmd_git(
    ws: &Workspace<JsonLedgerStore>,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let code = ws.git().passthrough(args)?;
    process::exit(code);
}

fn cmd_init_git(ws: &Workspace<JsonLedgerStore>) -> Result<(), Box<dyn std::error::Error>> {
    ws.git().ensure_repository(true)?;
    println!("workspace git ready");
    Ok(())
}

fn cmd_log(
    root: &Path,
    project: &str,
    message: &str,
    commit: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonLedgerStore::new(root);
    let outcome = log::append_entry(root, &store, project, message, commit)?;
    println!("log updated: {}", outcome.path.display());
    if outcome.committed {
        println!("log committed to git");
    }
    if let Some(reason) = outcome.skipped {
        println!("commit skipped: {reason}");
    }
    if let Some(warning) = outcome.git_warning {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn cmd_report(
    ws: &Workspace<JsonLedgerStore>,
    project: &str,
    include_code: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = report::generate_report(ws, project, include_code)?;
    println!("report generated at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_flags_combine_by_precedence() {
        let source = resolve_seed_source(
            Some(PathBuf::from("ext.sh")),
            Some("v1".to_string()),
            Some("echo x".to_string()),
        );
        assert!(matches!(source, SeedSource::ExternalPath(_)));

        let source = resolve_seed_source(None, Some("v1".to_string()), Some("echo x".to_string()));
        assert!(matches!(source, SeedSource::PriorVersion(_)));

        let source = resolve_seed_source(None, None, Some("echo x".to_string()));
        assert!(matches!(source, SeedSource::InlineContent(_)));

        assert!(matches!(
            resolve_seed_source(None, None, None),
            SeedSource::AutoLatest
        ));
    }

    #[test]
    fn test_save_version_accepts_combined_seed_flags() {
        let cli = Cli::try_parse_from([
            "tally",
            "save-version",
            "demo",
            "v2",
            "--from-file",
            "ext.sh",
            "--content",
            "echo x",
        ])
        .unwrap();
        match cli.command {
            Commands::SaveVersion {
                from_file, content, ..
            } => {
                assert!(from_file.is_some());
                assert!(content.is_some());
            }
            _ => panic!("expected save-version"),
        }
    }
}
