use crate::cache;
use crate::edit::Edit;
use crate::inject::{self, LineStyle};
use crate::pattern::{Anchor, MatchError, PatternKind, Region};
use crate::record::RecordName;
use crate::step::{Guard, Marker, StepError, TransformStep};
use regex::Regex;
use std::sync::LazyLock;

static UPGRADE_INITIALIZERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bproto\s*:\s*value\.proto\s*,(?P<sep>\s+)",
        r"start_time(?:\s*:\s*start_time)?\s*,\s*end_time\s*:\s*value\.end_time\s*,",
    ))
    .expect("invalid upgrade initializer regex")
});

static FIELDS_INITIALIZERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bproto\s*:\s*fields\.proto\s*,(?P<sep>\s+)",
        r"start_time\s*:\s*fields\.start_time\s*,\s*end_time\s*:\s*fields\.end_time\s*,",
    ))
    .expect("invalid fields initializer regex")
});

/// Rewrite `MigrateFrom<<Record>V0_41> for <Record>V0_42`.
///
/// The constructor gains the timestamp conversions and the duration, and the
/// `Self { .. }` literal initializes every new field.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeConstructor;

impl UpgradeConstructor {
    fn opener(record: &RecordName) -> Result<Regex, MatchError> {
        let pattern = format!(
            r"\bfn\s+new\s*\(\s*value\s*:\s*{}\s*,\s*start_time\s*:\s*i64\s*,?\s*\)\s*->\s*Self\s*\{{",
            regex::escape(&record.previous())
        );
        cache::get_or_compile(&pattern).map_err(|e| MatchError::InvalidPattern {
            kind: PatternKind::ConstructorBody,
            message: e.to_string(),
        })
    }
}

impl TransformStep for UpgradeConstructor {
    fn name(&self) -> &'static str {
        "upgrade-constructor"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::ConstructorBody
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        let migrate_from = format!(r"MigrateFrom\s*<\s*{}\s*>", regex::escape(&record.previous()));
        Anchor::trait_impl(self.kind(), &migrate_from, &record.current())
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("start_time_dt"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let opener = region
            .capture(text, &Self::opener(record)?)?
            .ok_or_else(|| {
                StepError::malformed(
                    self.kind(),
                    format!(
                        "expected `fn new(value: {}, start_time: i64) -> Self`",
                        record.previous()
                    ),
                )
            })?;
        let init = region.capture(text, &UPGRADE_INITIALIZERS)?.ok_or_else(|| {
            StepError::malformed(
                self.kind(),
                "expected `proto: value.proto, start_time, end_time: value.end_time,`",
            )
        })?;

        let fallback = inject::nested_indent(text, opener.start());
        let prelude_style = LineStyle::after_opener(text, opener.end(), &fallback);
        let prelude = format!(
            "{}{}",
            prelude_style.prefixed(&inject::upgrade_prelude()),
            prelude_style.newline()
        );

        let sep = init.text(text, "sep");
        let init_style = LineStyle::continuing(text, sep, &inject::nested_indent(text, init.start()));
        let from = init.group("sep").map_or(init.start(), |r| r.start);

        Ok(vec![
            Edit::insert(opener.end(), prelude),
            Edit::replace(
                text,
                from,
                init.end(),
                format!(
                    "{}{}",
                    init_style.lead_in(sep),
                    init_style.join(&inject::upgrade_initializers())
                ),
            ),
        ])
    }
}

/// Rewrite the canonical event's `fn new(.., fields)` so the event copies
/// every new field out of the fields struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainConstructor;

impl TransformStep for PlainConstructor {
    fn name(&self) -> &'static str {
        "plain-constructor"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::ConstructorBody
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        Ok(Anchor::impl_block(self.kind(), record.canonical())?.containing("fn new("))
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("fields.duration"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let init = region.capture(text, &FIELDS_INITIALIZERS)?.ok_or_else(|| {
            StepError::malformed(
                self.kind(),
                "expected `proto: fields.proto, start_time: fields.start_time, end_time: fields.end_time,`",
            )
        })?;

        let sep = init.text(text, "sep");
        let style = LineStyle::continuing(text, sep, &inject::nested_indent(text, init.start()));
        let from = init.group("sep").map_or(init.start(), |r| r.start);

        Ok(vec![Edit::replace(
            text,
            from,
            init.end(),
            format!(
                "{}{}",
                style.lead_in(sep),
                style.join(&inject::fields_initializers())
            ),
        )])
    }
}
