use crate::edit::Edit;
use crate::inject::{self, LineStyle};
use crate::pattern::{Anchor, Capture, MatchError, PatternKind, Region};
use crate::record::RecordName;
use crate::step::{Guard, Marker, StepError, TransformStep};
use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bproto=\{(?::\?)?\}\s+start_time=\{(?::\?)?\}\s+",
        r"end_time=(?P<ph>\{(?::\?)?\})",
    ))
    .expect("invalid format token regex")
});

static TIMESTAMP_STR_LETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*let\s+(?:start|end)_time_str\s*=[^;]*;[ \t]*\r?\n")
        .expect("invalid timestamp binding regex")
});

static SYSLOG_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bself\.proto\.to_string\(\)\s*,(?P<sep>\s+)",
        r"start_time_str\s*,\s*end_time_str\s*,",
    ))
    .expect("invalid syslog argument regex")
});

static DISPLAY_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\bself\.proto\.to_string\(\)\s*,\s*start_time_str\s*,",
        r"(?P<sep>\s+)end_time_str\s*,",
    ))
    .expect("invalid display argument regex")
});

/// Append the session tokens after `end_time=...` in the format string.
fn extend_format_tokens(
    kind: PatternKind,
    text: &str,
    region: &Region,
) -> Result<Edit, StepError> {
    let tokens = region.capture(text, &TIMESTAMP_TOKENS)?.ok_or_else(|| {
        StepError::malformed(
            kind,
            "expected `proto=.. start_time=.. end_time=..` in the format string",
        )
    })?;
    Ok(Edit::insert(
        tokens.end(),
        inject::session_format_tokens(tokens.text(text, "ph")),
    ))
}

fn argument_style(text: &str, args: &Capture) -> LineStyle {
    LineStyle::continuing(
        text,
        args.text(text, "sep"),
        &inject::nested_indent(text, args.start()),
    )
}

/// Rewrite `syslog_rfc5424` on the fields struct.
///
/// The method stops pre-rendering the timestamps (the fields are
/// `DateTime<Utc>` now) and formats every session field.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogFormat;

impl TransformStep for SyslogFormat {
    fn name(&self) -> &'static str {
        "syslog-format"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::FormatMethod
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        Ok(Anchor::impl_block(self.kind(), record.as_str())?.containing("fn syslog_rfc5424"))
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("orig_l2_bytes"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let mut edits: Vec<Edit> = region
            .capture_all(text, &TIMESTAMP_STR_LETS)
            .iter()
            .map(|binding| Edit::delete(text, binding.start(), binding.end()))
            .collect();

        edits.push(extend_format_tokens(self.kind(), text, region)?);

        let args = region.capture(text, &SYSLOG_ARGS)?.ok_or_else(|| {
            StepError::malformed(
                self.kind(),
                "expected `self.proto.to_string(), start_time_str, end_time_str,`",
            )
        })?;
        let sep = args.text(text, "sep");
        let style = argument_style(text, &args);

        let mut lines = inject::rfc3339_args();
        lines.extend(inject::session_string_args());
        let from = args.group("sep").map_or(args.start(), |r| r.start);
        edits.push(Edit::replace(
            text,
            from,
            args.end(),
            format!("{}{}", style.lead_in(sep), style.join(&lines)),
        ));

        Ok(edits)
    }
}

/// Rewrite `impl fmt::Display` for the canonical event. Its timestamps stay
/// i64, so the existing `start_time_str`/`end_time_str` bindings are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFormat;

impl TransformStep for DisplayFormat {
    fn name(&self) -> &'static str {
        "display-format"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::FormatMethod
    }

    fn anchor(&self, record: &RecordName) -> Result<Anchor, MatchError> {
        Anchor::trait_impl(
            self.kind(),
            r"(?:std\s*::\s*)?fmt\s*::\s*Display",
            record.canonical(),
        )
    }

    fn guard(&self) -> Guard {
        Guard::region(Marker::Literal("orig_l2_bytes"))
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let tokens = extend_format_tokens(self.kind(), text, region)?;

        let args = region.capture(text, &DISPLAY_ARGS)?.ok_or_else(|| {
            StepError::malformed(
                self.kind(),
                "expected `self.proto.to_string(), start_time_str, end_time_str,`",
            )
        })?;
        let style = argument_style(text, &args);

        Ok(vec![
            tokens,
            Edit::insert(
                args.end(),
                style.prefixed(&inject::session_string_args()),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepOutcome;

    const SYSLOG: &str = r#"impl FooFields {
    #[must_use]
    pub fn syslog_rfc5424(&self) -> String {
        let start_time_str = DateTime::from_timestamp_nanos(self.start_time).to_rfc3339();
        let end_time_str = DateTime::from_timestamp_nanos(self.end_time).to_rfc3339();
        format!(
            "sensor={:?} proto={:?} start_time={:?} end_time={:?} confidence={:?}",
            self.sensor,
            self.proto.to_string(),
            start_time_str,
            end_time_str,
            self.confidence.to_string(),
        )
    }
}
"#;

    const DISPLAY: &str = r#"impl fmt::Display for Foo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let start_time_str = DateTime::from_timestamp_nanos(self.start_time).to_rfc3339();
        let end_time_str = DateTime::from_timestamp_nanos(self.end_time).to_rfc3339();
        write!(
            f,
            "proto={:?} start_time={:?} end_time={:?} confidence={:?}",
            self.proto.to_string(),
            start_time_str,
            end_time_str,
            self.confidence.to_string(),
        )
    }
}
"#;

    fn record() -> RecordName {
        RecordName::new("FooFields").unwrap()
    }

    fn applied(outcome: StepOutcome) -> String {
        match outcome {
            StepOutcome::Applied(text) => text,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn syslog_renders_typed_timestamps() {
        let out = applied(SyslogFormat.apply(SYSLOG, &record()).unwrap());
        assert_eq!(
            out,
            r#"impl FooFields {
    #[must_use]
    pub fn syslog_rfc5424(&self) -> String {
        format!(
            "sensor={:?} proto={:?} start_time={:?} end_time={:?} duration={:?} orig_pkts={:?} resp_pkts={:?} orig_l2_bytes={:?} resp_l2_bytes={:?} confidence={:?}",
            self.sensor,
            self.proto.to_string(),
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339(),
            self.duration.to_string(),
            self.orig_pkts.to_string(),
            self.resp_pkts.to_string(),
            self.orig_l2_bytes.to_string(),
            self.resp_l2_bytes.to_string(),
            self.confidence.to_string(),
        )
    }
}
"#
        );
        assert_eq!(
            SyslogFormat.apply(&out, &record()).unwrap(),
            StepOutcome::AlreadyApplied
        );
    }

    #[test]
    fn syslog_without_args_is_malformed() {
        let broken = SYSLOG.replace("            start_time_str,\n", "");
        let err = SyslogFormat.apply(&broken, &record()).unwrap_err();
        assert!(matches!(
            err,
            StepError::MalformedMatch {
                kind: PatternKind::FormatMethod,
                ..
            }
        ));
    }

    #[test]
    fn display_keeps_string_bindings() {
        let out = applied(DisplayFormat.apply(DISPLAY, &record()).unwrap());
        assert!(out.contains("let start_time_str = DateTime::from_timestamp_nanos"));
        assert!(out.contains(
            "end_time={:?} duration={:?} orig_pkts={:?} resp_pkts={:?} orig_l2_bytes={:?} resp_l2_bytes={:?} confidence={:?}"
        ));
        assert!(out.contains(
            "            end_time_str,
            self.duration.to_string(),
            self.orig_pkts.to_string(),
            self.resp_pkts.to_string(),
            self.orig_l2_bytes.to_string(),
            self.resp_l2_bytes.to_string(),
            self.confidence.to_string(),"
        ));
        assert_eq!(
            DisplayFormat.apply(&out, &record()).unwrap(),
            StepOutcome::AlreadyApplied
        );
    }

    #[test]
    fn display_follows_placeholder_style() {
        let plain = DISPLAY.replace("{:?}", "{}");
        let out = applied(DisplayFormat.apply(&plain, &record()).unwrap());
        assert!(out.contains("end_time={} duration={} orig_pkts={}"));
    }

    #[test]
    fn display_for_other_type_is_no_match() {
        let other = DISPLAY.replace("for Foo {", "for Bar {");
        assert_eq!(
            DisplayFormat.apply(&other, &record()).unwrap(),
            StepOutcome::NoMatch
        );
    }
}
