use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The splice primitive: byte-span replacement with verification.
///
/// Every transform step compiles its changes down to a set of `Edit`s against
/// the text it was handed. Intelligence lives in region location, not in
/// application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at byte {byte_start}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        expected: String,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("edits overlap: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("byte range [{byte_start}, {byte_end}) splits a UTF-8 character")]
    NotCharBoundary { byte_start: usize, byte_end: usize },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Pure insertion at `at`.
    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self::new(at, at, new_text, "")
    }

    /// Replace `[byte_start, byte_end)` of `text`, capturing the current span
    /// as the expected before-text.
    pub fn replace(
        text: &str,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
    ) -> Self {
        let before = text.get(byte_start..byte_end).unwrap_or_default();
        Self::new(byte_start, byte_end, new_text, before)
    }

    /// Remove `[byte_start, byte_end)` of `text`.
    pub fn delete(text: &str, byte_start: usize, byte_end: usize) -> Self {
        Self::replace(text, byte_start, byte_end, String::new())
    }

    /// Validate the edit against the current text.
    ///
    /// Returns the current text at [byte_start, byte_end) if validation succeeds.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: content.len(),
            });
        }

        let current = content
            .get(self.byte_start..self.byte_end)
            .ok_or(EditError::NotCharBoundary {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
            })?;

        // Already applied
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                expected: format!("{:?}", self.expected_before),
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply multiple edits to the same text in one pass.
    ///
    /// Every edit is validated against the original text before anything is
    /// spliced; edits are then applied bottom-to-top to avoid offset
    /// invalidation. Either all edits land or none do.
    pub fn apply_batch(content: &str, edits: Vec<Edit>) -> Result<String, EditError> {
        if edits.is_empty() {
            return Ok(content.to_string());
        }

        // Descending by span; ties go last-first so that insertions sharing an
        // offset end up in their given order.
        let mut indexed: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            b.byte_start
                .cmp(&a.byte_start)
                .then(b.byte_end.cmp(&a.byte_end))
                .then(ib.cmp(ia))
        });
        let edits: Vec<Edit> = indexed.into_iter().map(|(_, edit)| edit).collect();

        for edit in &edits {
            edit.validate(content)?;
        }

        // For non-overlapping regions: earlier edit's end <= later edit's start
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::Overlap {
                    first_start: earlier.byte_start,
                    first_end: earlier.byte_end,
                    second_start: later.byte_start,
                    second_end: later.byte_end,
                });
            }
        }

        let mut out = content.to_string();
        for edit in &edits {
            if out[edit.byte_start..edit.byte_end] == edit.new_text {
                continue;
            }
            out.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }

        Ok(out)
    }
}

/// Atomic file write: tempfile + fsync + rename, then an mtime bump so
/// incremental builds notice the change.
///
/// Either the full write succeeds or the file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Tempfile in same directory to ensure same filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    // The tempfile is created 0600; keep the target's mode.
    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    bump_mtime(path);

    Ok(())
}

/// Touch `path` so incremental builds see the rewrite. Runs after the content
/// is persisted, so a failure is logged rather than returned.
fn bump_mtime(path: &Path) {
    if let Err(e) = filetime::set_file_mtime(path, filetime::FileTime::now()) {
        tracing::warn!(path = %path.display(), error = %e, "could not bump mtime");
    }
}
