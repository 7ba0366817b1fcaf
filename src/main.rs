use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use field_migrator::config::{load_from_path, MigrationManifest};
use field_migrator::driver::{self, FileRun, RunSummary, WriteMode};
use field_migrator::pipeline::Pipeline;
use field_migrator::record::RecordName;
use field_migrator::report::FileStatus;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const ROOT_ENV: &str = "FIELD_MIGRATOR_ROOT";

#[derive(Parser)]
#[command(name = "field-migrator")]
#[command(about = "Idempotent structural migrations for event record declarations", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every file listed in the manifest(s)
    Apply {
        /// Root the manifest paths are relative to
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Manifest to run (otherwise every .toml in migrations/)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Show what would change without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report files that still need migrating; exits 1 if any do
    Check {
        #[arg(short, long)]
        root: Option<PathBuf>,

        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Migrate a single file without a manifest
    File {
        path: PathBuf,

        /// Record family declared in the file, e.g. BlocklistNfsFields
        #[arg(long)]
        record: String,

        /// Write the result back (default is a dry run)
        #[arg(short, long)]
        write: bool,

        #[arg(short, long)]
        diff: bool,
    },

    /// List manifest entries and the struct names they target
    List {
        #[arg(short, long)]
        root: Option<PathBuf>,

        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            root,
            manifest,
            dry_run,
            diff,
            format,
        } => cmd_apply(root, manifest, dry_run, diff, format),

        Commands::Check { root, manifest } => cmd_check(root, manifest),

        Commands::File {
            path,
            record,
            write,
            diff,
        } => cmd_file(&path, &record, write, diff),

        Commands::List { root, manifest } => cmd_list(root, manifest),
    }
}

/// stderr subscriber; `RUST_LOG` wins over `-v`.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,field_migrator={level}",
            level = level.as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Resolve the migration root.
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. FIELD_MIGRATOR_ROOT environment variable
/// 3. Current directory
fn resolve_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return path
            .canonicalize()
            .with_context(|| format!("root does not exist: {}", path.display()));
    }

    if let Ok(env_path) = env::var(ROOT_ENV) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: {ROOT_ENV} is set but path doesn't exist: {env_path}").yellow()
        );
    }

    Ok(env::current_dir()?)
}

/// Discover `.toml` manifests.
///
/// Discovery order:
/// 1. `<root>/migrations`
/// 2. `./migrations` relative to the current working directory
fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let cwd_dir = env::current_dir().ok().map(|cwd| cwd.join("migrations"));
    let candidates = std::iter::once(root.join("migrations")).chain(cwd_dir);

    for dir in candidates {
        if !dir.is_dir() {
            continue;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();

        if !files.is_empty() {
            return Ok(files);
        }
    }

    anyhow::bail!(
        "No .toml manifests found in either {}/migrations or ./migrations",
        root.display()
    )
}

fn load_manifests(root: &Path, manifest: Option<PathBuf>) -> Result<Vec<(PathBuf, MigrationManifest)>> {
    let paths = match manifest {
        Some(path) => vec![path],
        None => discover_manifests(root)?,
    };
    paths
        .into_iter()
        .map(|path| {
            let manifest = load_from_path(&path)?;
            Ok((path, manifest))
        })
        .collect()
}

fn run_manifests(root: &Path, manifest: Option<PathBuf>, mode: WriteMode) -> Result<Vec<(PathBuf, RunSummary)>> {
    Ok(load_manifests(root, manifest)?
        .into_iter()
        .map(|(path, manifest)| {
            let summary = driver::migrate_manifest(&manifest, root, mode);
            (path, summary)
        })
        .collect())
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (migrated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_run(run: &FileRun, dry_run: bool, show_diff: bool) {
    let path = run.outcome.path.display();
    match &run.outcome.status {
        FileStatus::Updated => {
            let verb = if dry_run { "Would update" } else { "Updated" };
            println!("{} {verb} {path}", "✓".green());
            if show_diff {
                display_diff(&run.outcome.path, &run.original, &run.final_text);
            }
        }
        FileStatus::Unchanged => {
            println!("{} No changes needed for {path}", "-".dimmed());
        }
        FileStatus::Failed { reason } => {
            println!("{} Error processing {path}: {reason}", "✗".red());
        }
    }
}

fn cmd_apply(
    root: Option<PathBuf>,
    manifest: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    format: OutputFormat,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mode = if dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Write
    };

    let results = run_manifests(&root, manifest, mode)?;
    let mut updated = 0;
    let mut total = 0;
    let mut failed = 0;

    if format == OutputFormat::Json {
        let reports: Vec<_> = results
            .iter()
            .map(|(path, summary)| {
                serde_json::json!({
                    "manifest": path,
                    "summary": summary.to_report(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        failed = results.iter().map(|(_, s)| s.failed()).sum();
    } else {
        println!("Root: {}", root.display());
        if dry_run {
            println!("{}", "[DRY RUN - no files will be written]".cyan());
        }

        for (path, summary) in &results {
            println!("Running {}...", path.display());
            for run in &summary.runs {
                print_run(run, dry_run, show_diff);
            }
            updated += summary.updated();
            total += summary.total();
            failed += summary.failed();
        }

        println!();
        println!("Processed {updated}/{total} files successfully");
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(root: Option<PathBuf>, manifest: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let results = run_manifests(&root, manifest, WriteMode::DryRun)?;

    let mut done = Vec::new();
    let mut pending = Vec::new();
    let mut failed = Vec::new();

    for run in results.iter().flat_map(|(_, s)| &s.runs) {
        match &run.outcome.status {
            FileStatus::Unchanged => done.push(run),
            FileStatus::Updated => pending.push(run),
            FileStatus::Failed { reason } => failed.push((run, reason)),
        }
    }

    println!("{}", "Migration Status Report".bold());
    println!("Root: {}", root.display());
    println!();

    if !done.is_empty() {
        println!("{} {} ({} files)", "✓".green(), "MIGRATED".green().bold(), done.len());
        for run in &done {
            println!("  - {}", run.outcome.path.display());
        }
        println!();
    }

    if !pending.is_empty() {
        println!("{} {} ({} files)", "⊙".yellow(), "PENDING".yellow().bold(), pending.len());
        for run in &pending {
            println!("  - {} ({})", run.outcome.path.display(), run.record);
        }
        println!();
    }

    if !failed.is_empty() {
        println!("{} {} ({} files)", "✗".red(), "FAILED".red().bold(), failed.len());
        for (run, reason) in &failed {
            println!("  - {} ({})", run.outcome.path.display(), reason.dimmed());
        }
        println!();
    }

    if !pending.is_empty() || !failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_file(path: &Path, record: &str, write: bool, show_diff: bool) -> Result<()> {
    let record = RecordName::new(record)?;
    let mode = if write {
        WriteMode::Write
    } else {
        WriteMode::DryRun
    };

    let run = driver::migrate_file(&Pipeline::session_fields(), path, &record, mode);
    print_run(&run, !write, show_diff);

    if run.outcome.status.is_failure() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list(root: Option<PathBuf>, manifest: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;

    for (path, manifest) in load_manifests(&root, manifest)? {
        let name = if manifest.meta.name.is_empty() {
            path.display().to_string()
        } else {
            manifest.meta.name.clone()
        };
        println!("{}", name.bold());
        if let Some(description) = &manifest.meta.description {
            println!("  {}", description.dimmed());
        }

        for (file, record) in manifest.entries(&root) {
            println!("  {} ({})", file.display(), record.to_string().cyan());
            println!(
                "    {} <- {}, event {}",
                record.current(),
                record.previous(),
                record.canonical()
            );
        }
        println!();
    }

    Ok(())
}
