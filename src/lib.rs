//! Field Migrator: idempotent structural migrations for Rust event records
//!
//! Rewrites the declarations of a record family so its structs, constructors
//! and formatters carry a fixed set of session fields. Every rewrite is a
//! pattern-anchored, guarded step: running the migration twice leaves the
//! file exactly as the first run did.
//!
//! # Architecture
//!
//! All rewrites compile down to a single primitive: [`Edit`], a verified
//! byte-span replacement. A [`step::TransformStep`] locates a region with a
//! [`pattern::Anchor`], checks its idempotency guard, and synthesizes edits
//! from the builders in [`inject`]. A [`Pipeline`] threads a document through
//! the steps in order and refuses any result that no longer parses.
//!
//! # Safety
//!
//! - A step that finds its anchor but not the expected structure fails the
//!   whole file; nothing is partially rewritten
//! - Ambiguous anchors (more than one candidate) fail rather than guess
//! - Atomic file writes (tempfile + fsync + rename)
//! - Newline convention and indentation follow the surrounding code
//!
//! # Example
//!
//! ```
//! use field_migrator::{Pipeline, RecordName};
//!
//! let source = "use chrono::{DateTime, Utc};\n";
//! let record = RecordName::new("BlocklistNfsFields").unwrap();
//!
//! let result = Pipeline::session_fields().run(source, &record).unwrap();
//! assert!(result.changed);
//! assert_eq!(
//!     result.final_text,
//!     "use chrono::{DateTime, Utc, serde::ts_nanoseconds};\n"
//! );
//! ```

pub mod cache;
pub mod config;
pub mod driver;
pub mod edit;
pub mod inject;
pub mod pattern;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod step;
pub mod validate;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, MigrationManifest};
pub use driver::{migrate_file, migrate_manifest, migrate_text, FileRun, RunSummary, WriteMode};
pub use edit::{atomic_write, Edit, EditError, EditVerification};
pub use pattern::{Anchor, MatchError, PatternKind, Region};
pub use pipeline::{Pipeline, PipelineError, PipelineFailure, PipelineResult, StepReport};
pub use record::{RecordName, RecordNameError};
pub use report::{report, FileOutcome, FileStatus};
pub use step::{StepError, StepOutcome, StepStatus, TransformStep};
pub use validate::ValidationError;
