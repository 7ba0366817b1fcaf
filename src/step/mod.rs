//! Transform steps: `{anchor, guard, injector}` units the pipeline runs in order.
//!
//! A step never fails for lack of a target. The outcomes are:
//!
//! - [`StepOutcome::AlreadyApplied`] - the guard's post-condition marker is present
//! - [`StepOutcome::NoMatch`] - the anchor does not occur in this file
//! - [`StepOutcome::Applied`] - edits were spliced in
//!
//! An anchor that matches but lacks the structure the injector needs is a
//! [`StepError::MalformedMatch`], which aborts the whole file.

pub mod constructors;
pub mod formatters;
pub mod import;
pub mod structs;

pub use constructors::{PlainConstructor, UpgradeConstructor};
pub use formatters::{DisplayFormat, SyslogFormat};
pub use import::AddImport;
pub use structs::{CanonicalStruct, VersionedStruct};

use crate::cache;
use crate::edit::{Edit, EditError};
use crate::pattern::{scanner, Anchor, MatchError, PatternKind, Region};
use crate::record::RecordName;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("malformed {kind} match: {detail}")]
    MalformedMatch { kind: PatternKind, detail: String },

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("edit failed: {0}")]
    Edit(#[from] EditError),
}

impl StepError {
    pub fn malformed(kind: PatternKind, detail: impl Into<String>) -> Self {
        StepError::MalformedMatch {
            kind,
            detail: detail.into(),
        }
    }
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StepOutcome carries the rewritten text"]
pub enum StepOutcome {
    /// Edits were spliced in; carries the new text
    Applied(String),
    /// The step's post-condition already holds
    AlreadyApplied,
    /// The anchor does not occur in this text
    NoMatch,
}

impl StepOutcome {
    pub fn status(&self) -> StepStatus {
        match self {
            StepOutcome::Applied(_) => StepStatus::Applied,
            StepOutcome::AlreadyApplied => StepStatus::AlreadyApplied,
            StepOutcome::NoMatch => StepStatus::NoMatch,
        }
    }
}

/// [`StepOutcome`] without the text, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    AlreadyApplied,
    NoMatch,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Applied => write!(f, "applied"),
            StepStatus::AlreadyApplied => write!(f, "already applied"),
            StepStatus::NoMatch => write!(f, "no match"),
        }
    }
}

/// Where a guard looks for its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardScope {
    /// The whole text, checked before matching
    Document,
    /// The matched region's body, checked after matching
    Region,
}

/// What a guard looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Literal(&'static str),
    Pattern(&'static str),
}

/// Idempotency guard: the post-condition marker a step's own edits leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    pub scope: GuardScope,
    pub marker: Marker,
}

impl Guard {
    pub const fn document(marker: Marker) -> Self {
        Self {
            scope: GuardScope::Document,
            marker,
        }
    }

    pub const fn region(marker: Marker) -> Self {
        Self {
            scope: GuardScope::Region,
            marker,
        }
    }

    /// Whether the marker occurs in `haystack` outside comments and string
    /// literals.
    pub fn is_satisfied(&self, haystack: &str, kind: PatternKind) -> Result<bool, MatchError> {
        let non_code = scanner::non_code_spans(haystack);
        let in_code = |at: usize| !scanner::in_spans(&non_code, at);

        match self.marker {
            Marker::Literal(marker) => Ok(haystack.match_indices(marker).any(|(at, _)| in_code(at))),
            Marker::Pattern(pattern) => {
                let re = cache::get_or_compile(pattern).map_err(|e| {
                    MatchError::InvalidPattern {
                        kind,
                        message: e.to_string(),
                    }
                })?;
                let found = re.find_iter(haystack).any(|m| in_code(m.start()));
                Ok(found)
            }
        }
    }
}

/// One named, composable structural edit.
///
/// Implementors supply the anchor, the guard and the injector; [`apply`]
/// sequences them.
///
/// [`apply`]: TransformStep::apply
pub trait TransformStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> PatternKind;

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError>;

    fn guard(&self) -> Guard;

    /// Synthesize the edits for a located region. All offsets are absolute
    /// positions in `text`.
    fn edits(&self, text: &str, region: &Region, record: &RecordName)
        -> Result<Vec<Edit>, StepError>;

    /// Guard, match, inject, splice.
    fn apply(&self, text: &str, record: &RecordName) -> Result<StepOutcome, StepError> {
        let guard = self.guard();
        if guard.scope == GuardScope::Document && guard.is_satisfied(text, self.kind())? {
            return Ok(StepOutcome::AlreadyApplied);
        }

        let Some(region) = self.anchor(record)?.find(text)? else {
            return Ok(StepOutcome::NoMatch);
        };

        if guard.scope == GuardScope::Region && guard.is_satisfied(region.body(text), self.kind())? {
            return Ok(StepOutcome::AlreadyApplied);
        }

        let edits = self.edits(text, &region, record)?;
        if edits.is_empty() {
            return Err(StepError::malformed(
                self.kind(),
                "matched region produced no edits",
            ));
        }

        let rewritten = Edit::apply_batch(text, edits)?;
        if rewritten == text {
            return Ok(StepOutcome::AlreadyApplied);
        }
        Ok(StepOutcome::Applied(rewritten))
    }
}

/// The session-field migration, in its declared order.
pub fn session_field_steps() -> Vec<Box<dyn TransformStep>> {
    vec![
        Box::new(AddImport::ts_nanoseconds()),
        Box::new(VersionedStruct),
        Box::new(UpgradeConstructor),
        Box::new(SyslogFormat),
        Box::new(CanonicalStruct),
        Box::new(DisplayFormat),
        Box::new(PlainConstructor),
    ]
}
