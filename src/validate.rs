//! Syntax validation for rewritten files.
//!
//! A migration must never turn a parsing file into a non-parsing one. Files
//! that did not parse to begin with (fragments, macro-heavy sources) are
//! accepted as-is; only newly introduced syntax errors are refused.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("rewrite introduced a syntax error: {message}")]
    SyntaxIntroduced { message: String },
}

/// Whether `source` parses as a Rust file.
pub fn parses(source: &str) -> bool {
    syn::parse_file(source).is_ok()
}

/// Refuse `edited` if it fails to parse while `original` parsed.
pub fn validate_edit(original: &str, edited: &str) -> Result<(), ValidationError> {
    if !parses(original) {
        return Ok(());
    }
    syn::parse_file(edited)
        .map(|_| ())
        .map_err(|e| ValidationError::SyntaxIntroduced {
            message: e.to_string(),
        })
}
