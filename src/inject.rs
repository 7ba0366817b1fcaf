//! Field-set injection: the canonical text blocks every step splices in.
//!
//! The session fields are identical for every record family, so each builder
//! here is a pure function of layout only. Builders return bare lines; a
//! [`LineStyle`] lays them out with the indentation and newline convention of
//! the code they land in.

/// One injected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionField {
    pub name: &'static str,
    pub ty: &'static str,
}

/// The injected fields, in canonical order.
pub const SESSION_FIELDS: [SessionField; 5] = [
    SessionField { name: "duration", ty: "i64" },
    SessionField { name: "orig_pkts", ty: "u64" },
    SessionField { name: "resp_pkts", ty: "u64" },
    SessionField { name: "orig_l2_bytes", ty: "u64" },
    SessionField { name: "resp_l2_bytes", ty: "u64" },
];

pub const INDENT_UNIT: &str = "    ";

const TS_NANOSECONDS_ATTR: &str = r#"#[serde(with = "ts_nanoseconds")]"#;

/// Indentation and newline convention for inserted lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStyle {
    indent: String,
    newline: &'static str,
}

impl LineStyle {
    pub fn new(indent: impl Into<String>, newline: &'static str) -> Self {
        Self {
            indent: indent.into(),
            newline,
        }
    }

    /// Style for lines that continue a list after `separator`, the whitespace
    /// captured between two items.
    ///
    /// If the separator spans a line break, its last line is the indent.
    /// Otherwise the items share a line and `fallback_indent` is used.
    pub fn continuing(text: &str, separator: &str, fallback_indent: &str) -> Self {
        let indent = match separator.rfind('\n') {
            Some(nl) => &separator[nl + 1..],
            None => fallback_indent,
        };
        Self::new(indent, newline_of(text))
    }

    /// Style for lines opening a block whose `{` ends at `opener_end`: the
    /// indentation of the first statement already in the block.
    pub fn after_opener(text: &str, opener_end: usize, fallback_indent: &str) -> Self {
        let rest = &text[opener_end..];
        let first_stmt = rest
            .split('\n')
            .skip(1)
            .find(|line| !line.trim().is_empty());

        let indent = match first_stmt {
            Some(line) if !line.trim_start().starts_with('}') => {
                let trimmed = line.trim_start();
                &line[..line.len() - trimmed.len()]
            }
            _ => fallback_indent,
        };
        Self::new(indent, newline_of(text))
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    pub fn newline(&self) -> &'static str {
        self.newline
    }

    pub fn line_break(&self) -> String {
        format!("{}{}", self.newline, self.indent)
    }

    /// Lines joined so each after the first starts on its own line.
    pub fn join(&self, lines: &[String]) -> String {
        lines.join(&self.line_break())
    }

    /// Every line preceded by a line break.
    pub fn prefixed(&self, lines: &[String]) -> String {
        let brk = self.line_break();
        lines.iter().map(|line| format!("{brk}{line}")).collect()
    }

    /// The captured separator if it already breaks the line, else a fresh
    /// line break in this style.
    pub fn lead_in(&self, separator: &str) -> String {
        if separator.contains('\n') {
            separator.to_string()
        } else {
            self.line_break()
        }
    }
}

/// `"\r\n"` if the document uses it, `"\n"` otherwise.
pub fn newline_of(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Leading whitespace of the line containing byte `at`.
pub fn line_indent(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map_or(0, |nl| nl + 1);
    let line = &text[line_start..];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// One level deeper than the line containing `at`.
pub fn nested_indent(text: &str, at: usize) -> String {
    format!("{}{}", line_indent(text, at), INDENT_UNIT)
}

/// Normalize a captured visibility (`pub `, `pub(crate)  `) to `"pub "`-style.
pub fn visibility(vis: &str) -> String {
    let vis = vis.trim();
    if vis.is_empty() {
        String::new()
    } else {
        format!("{vis} ")
    }
}

/// `pub duration: i64,` ... in canonical order.
pub fn session_field_decls(vis: &str) -> Vec<String> {
    SESSION_FIELDS
        .iter()
        .map(|f| format!("{vis}{}: {},", f.name, f.ty))
        .collect()
}

/// Nanosecond-serialized `DateTime<Utc>` replacements for the i64 timestamps.
pub fn typed_timestamp_fields(vis: &str) -> Vec<String> {
    vec![
        TS_NANOSECONDS_ATTR.to_string(),
        format!("{vis}start_time: DateTime<Utc>,"),
        TS_NANOSECONDS_ATTR.to_string(),
        format!("{vis}end_time: DateTime<Utc>,"),
    ]
}

/// ` duration={:?} orig_pkts={:?} ...` using `placeholder` for each value.
pub fn session_format_tokens(placeholder: &str) -> String {
    SESSION_FIELDS
        .iter()
        .map(|f| format!(" {}={placeholder}", f.name))
        .collect()
}

/// `self.duration.to_string(),` ...
pub fn session_string_args() -> Vec<String> {
    SESSION_FIELDS
        .iter()
        .map(|f| format!("self.{}.to_string(),", f.name))
        .collect()
}

/// Timestamp arguments once the fields struct holds `DateTime<Utc>`.
pub fn rfc3339_args() -> Vec<String> {
    vec![
        "self.start_time.to_rfc3339(),".to_string(),
        "self.end_time.to_rfc3339(),".to_string(),
    ]
}

/// Conversions at the top of the upgrade constructor.
pub fn upgrade_prelude() -> Vec<String> {
    vec![
        "let start_time_dt = chrono::DateTime::from_timestamp_nanos(start_time);".to_string(),
        "let end_time_nanos = value.end_time;".to_string(),
        "let end_time_dt = chrono::DateTime::from_timestamp_nanos(end_time_nanos);".to_string(),
        "let duration = end_time_nanos.saturating_sub(start_time);".to_string(),
    ]
}

/// Initializers in the upgrade constructor. Counters the older record never
/// carried start at zero.
pub fn upgrade_initializers() -> Vec<String> {
    let mut lines = vec![
        "start_time: start_time_dt,".to_string(),
        "end_time: end_time_dt,".to_string(),
    ];
    lines.extend(SESSION_FIELDS.iter().map(|f| match f.name {
        "duration" => "duration,".to_string(),
        name => format!("{name}: 0,"),
    }));
    lines
}

/// Initializers in the event constructor, copying from the fields struct.
pub fn fields_initializers() -> Vec<String> {
    let mut lines = vec![
        "start_time: fields.start_time.timestamp_nanos_opt().unwrap_or_default(),".to_string(),
        "end_time: fields.end_time.timestamp_nanos_opt().unwrap_or_default(),".to_string(),
    ];
    lines.extend(
        SESSION_FIELDS
            .iter()
            .map(|f| format!("{0}: fields.{0},", f.name)),
    );
    lines
}
