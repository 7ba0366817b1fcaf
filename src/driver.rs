//! Batch driver: runs the pipeline over every file a manifest lists.

use crate::config::MigrationManifest;
use crate::edit::atomic_write;
use crate::pipeline::Pipeline;
use crate::record::RecordName;
use crate::report::{self, FileOutcome, FileStatus};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Whether updated files are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Write,
    DryRun,
}

/// One processed file. On failure `final_text` equals `original`.
#[derive(Debug, Clone)]
pub struct FileRun {
    pub outcome: FileOutcome,
    pub record: RecordName,
    pub original: String,
    pub final_text: String,
}

impl FileRun {
    pub fn is_updated(&self) -> bool {
        self.outcome.status == FileStatus::Updated
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub runs: Vec<FileRun>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.runs.iter().filter(|r| pred(&r.outcome.status)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|s| *s == FileStatus::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| *s == FileStatus::Unchanged)
    }

    pub fn failed(&self) -> usize {
        self.count(FileStatus::is_failure)
    }

    pub fn total(&self) -> usize {
        self.runs.len()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &FileOutcome> {
        self.runs.iter().map(|r| &r.outcome)
    }

    pub fn to_report(&self) -> SummaryReport<'_> {
        SummaryReport {
            files: self.outcomes().collect(),
            updated: self.updated(),
            unchanged: self.unchanged(),
            failed: self.failed(),
            total: self.total(),
        }
    }
}

/// Serializable view of a [`RunSummary`].
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub files: Vec<&'a FileOutcome>,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub total: usize,
}

/// Run the pipeline over in-memory text. Nothing is written.
pub fn migrate_text(pipeline: &Pipeline, path: &Path, text: &str, record: &RecordName) -> FileRun {
    let result = pipeline.run(text, record);
    let outcome = report::report(path, &result);
    let final_text = match result {
        Ok(run) => run.final_text,
        Err(_) => text.to_string(),
    };
    FileRun {
        outcome,
        record: record.clone(),
        original: text.to_string(),
        final_text,
    }
}

/// Read, migrate and (in [`WriteMode::Write`]) persist one file.
///
/// Read and write failures become [`FileStatus::Failed`]; they never abort
/// the caller's batch.
pub fn migrate_file(pipeline: &Pipeline, path: &Path, record: &RecordName, mode: WriteMode) -> FileRun {
    let original = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            return FileRun {
                outcome: FileOutcome::failed(path, e.to_string()),
                record: record.clone(),
                original: String::new(),
                final_text: String::new(),
            };
        }
    };

    let mut run = migrate_text(pipeline, path, &original, record);
    match &run.outcome.status {
        FileStatus::Updated if mode == WriteMode::Write => {
            if let Err(e) = atomic_write(path, run.final_text.as_bytes()) {
                warn!(path = %path.display(), error = %e, "failed to write file");
                run.outcome = FileOutcome::failed(path, e.to_string());
                run.final_text = run.original.clone();
            } else {
                info!(path = %path.display(), %record, "updated");
            }
        }
        FileStatus::Updated => info!(path = %path.display(), %record, "would update"),
        FileStatus::Unchanged => info!(path = %path.display(), %record, "no changes needed"),
        FileStatus::Failed { reason } => warn!(path = %path.display(), %record, %reason, "failed"),
    }
    run
}

/// Process every manifest entry in order.
pub fn migrate_manifest(manifest: &MigrationManifest, root: &Path, mode: WriteMode) -> RunSummary {
    let pipeline = Pipeline::session_fields();
    let runs = manifest
        .entries(root)
        .into_iter()
        .map(|(path, record)| migrate_file(&pipeline, &path, &record, mode))
        .collect();
    RunSummary { runs }
}
