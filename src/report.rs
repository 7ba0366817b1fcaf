use crate::pipeline::{PipelineError, PipelineResult};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Final status of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one step changed the file
    Updated,
    /// Every step was a no-op
    Unchanged,
    /// The file was left untouched because of an error
    Failed { reason: String },
}

impl FileStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, FileStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FileStatus::Failed {
                reason: reason.into(),
            },
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.status {
            FileStatus::Updated => write!(f, "Updated {path}"),
            FileStatus::Unchanged => write!(f, "No changes needed for {path}"),
            FileStatus::Failed { reason } => write!(f, "Error processing {path}: {reason}"),
        }
    }
}

/// Classify a pipeline run over `path`.
pub fn report(path: &Path, result: &Result<PipelineResult, PipelineError>) -> FileOutcome {
    let status = match result {
        Ok(run) if run.changed => FileStatus::Updated,
        Ok(_) => FileStatus::Unchanged,
        Err(e) => FileStatus::Failed {
            reason: e.to_string(),
        },
    };
    FileOutcome {
        path: path.to_path_buf(),
        status,
    }
}
