//! Ordered step execution over one document.

use crate::record::RecordName;
use crate::step::{self, StepError, StepOutcome, StepStatus, TransformStep};
use crate::validate::{self, ValidationError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

/// A failure inside the pipeline, tagged with the step that raised it.
#[derive(Error, Debug)]
#[error("step `{step}` failed: {source}")]
pub struct PipelineError {
    pub step: &'static str,
    #[source]
    pub source: PipelineFailure,
}

#[derive(Error, Debug)]
pub enum PipelineFailure {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Per-step status for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PipelineResult {
    pub final_text: String,
    pub changed: bool,
    pub steps: Vec<StepReport>,
}

impl PipelineResult {
    pub fn applied_steps(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .filter(|r| r.status == StepStatus::Applied)
            .map(|r| r.step)
    }
}

/// An ordered sequence of transform steps.
///
/// Each step sees the output of the one before it. Any step error abandons
/// the whole document: the caller gets the error, never a half-rewritten
/// text.
pub struct Pipeline {
    steps: Vec<Box<dyn TransformStep>>,
    validate_output: bool,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn TransformStep>>) -> Self {
        Self {
            steps,
            validate_output: true,
        }
    }

    /// The session-field migration in its declared order.
    pub fn session_fields() -> Self {
        Self::new(step::session_field_steps())
    }

    /// Skip the syntax check of the final text.
    pub fn without_validation(mut self) -> Self {
        self.validate_output = false;
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn run(&self, text: &str, record: &RecordName) -> Result<PipelineResult, PipelineError> {
        let mut current = text.to_string();
        let mut reports = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let outcome = step.apply(&current, record).map_err(|e| PipelineError {
                step: step.name(),
                source: e.into(),
            })?;

            let status = outcome.status();
            debug!(step = step.name(), %record, %status, "step finished");
            if let StepOutcome::Applied(next) = outcome {
                trace!(step = step.name(), before = current.len(), after = next.len());
                current = next;
            }
            reports.push(StepReport {
                step: step.name(),
                status,
            });
        }

        let changed = current != text;
        if changed && self.validate_output {
            validate::validate_edit(text, &current).map_err(|e| PipelineError {
                step: "validate",
                source: e.into(),
            })?;
        }

        Ok(PipelineResult {
            final_text: current,
            changed,
            steps: reports,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::session_fields()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .field("validate_output", &self.validate_output)
            .finish()
    }
}
