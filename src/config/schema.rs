use crate::record::RecordName;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A migration manifest: which files to rewrite, and which record family
/// each one declares.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct MigrationManifest {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl MigrationManifest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.files.is_empty() {
            issues.push(ValidationIssue::EmptyFileList);
        }

        let mut seen = HashSet::new();
        for entry in &self.files {
            let path = entry.path.trim();
            if path.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    path: None,
                    field: "path",
                });
            } else if !seen.insert(path) {
                issues.push(ValidationIssue::DuplicatePath {
                    path: path.to_string(),
                });
            }

            if entry.record.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    path: non_empty(path),
                    field: "record",
                });
            } else if let Err(e) = RecordName::new(entry.record.as_str()) {
                issues.push(ValidationIssue::InvalidRecord {
                    path: non_empty(path),
                    message: e.to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Directory the entry paths are relative to.
    pub fn base_dir(&self, root: &Path) -> PathBuf {
        match self.meta.base_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => root.join(dir),
            _ => root.to_path_buf(),
        }
    }

    /// Entries with resolved paths and parsed record names, in manifest order.
    ///
    /// Entries whose record name does not parse are skipped; [`validate`]
    /// reports them.
    ///
    /// [`validate`]: MigrationManifest::validate
    pub fn entries(&self, root: &Path) -> Vec<(PathBuf, RecordName)> {
        let base = self.base_dir(root);
        self.files
            .iter()
            .filter_map(|entry| {
                let record = RecordName::new(entry.record.as_str()).ok()?;
                Some((base.join(entry.path.trim()), record))
            })
            .collect()
    }
}

fn non_empty(path: &str) -> Option<String> {
    (!path.is_empty()).then(|| path.to_string())
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub record: String,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyFileList,
    MissingField {
        path: Option<String>,
        field: &'static str,
    },
    InvalidRecord {
        path: Option<String>,
        message: String,
    },
    DuplicatePath {
        path: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyFileList => write!(f, "manifest lists no files"),
            ValidationIssue::MissingField { path, field } => match path {
                Some(path) => write!(f, "entry '{path}' missing required field '{field}'"),
                None => write!(f, "entry missing required field '{field}'"),
            },
            ValidationIssue::InvalidRecord { path, message } => match path {
                Some(path) => write!(f, "entry '{path}' has invalid record: {message}"),
                None => write!(f, "entry has invalid record: {message}"),
            },
            ValidationIssue::DuplicatePath { path } => {
                write!(f, "file '{path}' is listed more than once")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, record: &str) -> FileEntry {
        FileEntry {
            path: path.to_string(),
            record: record.to_string(),
        }
    }

    #[test]
    fn collects_every_issue() {
        let manifest = MigrationManifest {
            meta: Metadata::default(),
            files: vec![
                entry("a.rs", "AFields"),
                entry("a.rs", "AFields"),
                entry("", "BFields"),
                entry("c.rs", ""),
                entry("d.rs", "not an ident"),
            ],
        };
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.issues.contains(&ValidationIssue::DuplicatePath {
            path: "a.rs".to_string()
        }));
        assert!(err.issues.contains(&ValidationIssue::MissingField {
            path: None,
            field: "path"
        }));
        assert!(err.issues.contains(&ValidationIssue::MissingField {
            path: Some("c.rs".to_string()),
            field: "record"
        }));
        assert!(matches!(
            err.issues.last(),
            Some(ValidationIssue::InvalidRecord { path: Some(p), .. }) if p == "d.rs"
        ));
    }

    #[test]
    fn empty_manifest_is_invalid() {
        let err = MigrationManifest::default().validate().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::EmptyFileList]);
        assert_eq!(err.to_string(), "manifest lists no files");
    }

    #[test]
    fn entries_resolve_against_base_dir() {
        let manifest = MigrationManifest {
            meta: Metadata {
                base_dir: Some("src/event".to_string()),
                ..Metadata::default()
            },
            files: vec![entry("nfs.rs", "BlocklistNfsFields")],
        };
        let entries = manifest.entries(Path::new("/repo"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Path::new("/repo/src/event/nfs.rs"));
        assert_eq!(entries[0].1.as_str(), "BlocklistNfsFields");
    }
}
