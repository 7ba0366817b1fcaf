use crate::edit::Edit;
use crate::inject::{self, LineStyle};
use crate::pattern::{Anchor, MatchError, PatternKind, Region};
use crate::record::RecordName;
use crate::step::{Guard, Marker, StepError, TransformStep};
use regex::Regex;
use std::sync::LazyLock;

// `proto: u8,` then the i64 `start_time`/`end_time` pair, any visibility.
static PROTO_THEN_I64_TIMESTAMPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bproto\s*:\s*u8\s*,(?P<sep>\s+)",
        r"(?P<vis>(?:pub(?:\([^)]*\))?\s+)?)start_time\s*:\s*i64\s*,\s*",
        r"(?:pub(?:\([^)]*\))?\s+)?end_time\s*:\s*i64\s*,",
    ))
    .expect("invalid proto/timestamp field regex")
});

static I64_TIMESTAMPS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bproto\s*:\s*u8\s*,\s*(?:pub(?:\([^)]*\))?\s+)?start_time\s*:\s*i64\s*,",
        r"(?P<sep>\s+)(?P<vis>(?:pub(?:\([^)]*\))?\s+)?)end_time\s*:\s*i64\s*,",
    ))
    .expect("invalid timestamp field regex")
});

/// Extend `<Record>V0_42`: the i64 timestamps become nanosecond-serialized
/// `DateTime<Utc>` fields, followed by the session fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionedStruct;

impl TransformStep for VersionedStruct {
    fn name(&self) -> &'static str {
        "versioned-struct"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::StructBody
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        Anchor::struct_body(&record.current())
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("duration:"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let cap = region
            .capture(text, &PROTO_THEN_I64_TIMESTAMPS)?
            .ok_or_else(|| {
                StepError::malformed(
                    self.kind(),
                    "expected `proto: u8` followed by `start_time: i64` and `end_time: i64`",
                )
            })?;

        let sep = cap.text(text, "sep");
        let vis = inject::visibility(cap.text(text, "vis"));
        let style = LineStyle::continuing(text, sep, &inject::nested_indent(text, region.start));

        let mut lines = inject::typed_timestamp_fields(&vis);
        lines.extend(inject::session_field_decls(&vis));

        let from = cap.group("sep").map_or(cap.start(), |r| r.start);
        Ok(vec![Edit::replace(
            text,
            from,
            cap.end(),
            format!("{}{}", style.lead_in(sep), style.join(&lines)),
        )])
    }
}

/// Extend the canonical event struct: the session fields go right after
/// `end_time`. Its timestamps stay i64.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalStruct;

impl TransformStep for CanonicalStruct {
    fn name(&self) -> &'static str {
        "canonical-struct"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::StructBody
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        Anchor::struct_body(record.canonical())
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("duration:"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let cap = region.capture(text, &I64_TIMESTAMPS)?.ok_or_else(|| {
            StepError::malformed(
                self.kind(),
                "expected `proto: u8, start_time: i64, end_time: i64` field sequence",
            )
        })?;

        let vis = inject::visibility(cap.text(text, "vis"));
        let style = LineStyle::continuing(
            text,
            cap.text(text, "sep"),
            &inject::nested_indent(text, region.start),
        );

        Ok(vec![Edit::insert(
            cap.end(),
            style.prefixed(&inject::session_field_decls(&vis)),
        )])
    }
}
