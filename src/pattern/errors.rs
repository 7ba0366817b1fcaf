use crate::pattern::PatternKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid {kind} pattern: {message}")]
    InvalidPattern { kind: PatternKind, message: String },

    #[error("{kind} matched {count} locations, expected at most 1")]
    AmbiguousMatch { kind: PatternKind, count: usize },

    #[error("{kind} at byte {offset} opens a block that is never closed")]
    UnclosedBlock { kind: PatternKind, offset: usize },

    #[error("sub-pattern matched {count} times inside {kind} region, expected 1")]
    AmbiguousCapture { kind: PatternKind, count: usize },
}
