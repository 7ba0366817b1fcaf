use crate::edit::Edit;
use crate::pattern::{Anchor, MatchError, PatternKind, Region};
use crate::record::RecordName;
use crate::step::{Guard, Marker, StepError, TransformStep};

/// Add a symbol to an existing `use module::{...}` list.
///
/// The list is the anchor; a file without it is left alone rather than given
/// a new `use` item.
#[derive(Debug, Clone, Copy)]
pub struct AddImport {
    module: &'static str,
    symbol: &'static str,
    guard: Marker,
}

impl AddImport {
    /// `use chrono::{..., serde::ts_nanoseconds};`
    pub const fn ts_nanoseconds() -> Self {
        Self {
            module: "chrono",
            symbol: "serde::ts_nanoseconds",
            guard: Marker::Pattern(
                r#"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?use\s+[^;#/"]*\bts_nanoseconds\b"#,
            ),
        }
    }
}

impl TransformStep for AddImport {
    fn name(&self) -> &'static str {
        "import"
    }

    fn kind(&self) -> PatternKind {
        PatternKind::Import
    }

    fn anchor(&self, _record: &RecordName) -> Result<Anchor, MatchError> {
        Anchor::use_list(self.module)
    }

    fn guard(&self) -> Guard {
        Guard::document(self.guard)
    }

    fn edits(
        &self,
        text: &str,
        region: &Region,
        _record: &RecordName,
    ) -> Result<Vec<Edit>, StepError> {
        let items = region.body(text).trim_end();
        if items.trim().is_empty() {
            return Err(StepError::malformed(
                self.kind(),
                format!("`use {}::{{}}` has an empty item list", self.module),
            ));
        }

        let separator = if items.ends_with(',') { " " } else { ", " };
        Ok(vec![Edit::insert(
            region.body_start + items.len(),
            format!("{separator}{}", self.symbol),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepOutcome;

    fn record() -> RecordName {
        RecordName::new("Foo").unwrap()
    }

    #[test]
    fn appends_to_use_list() {
        let text = "use chrono::{DateTime, Utc};\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert_eq!(
            out,
            StepOutcome::Applied("use chrono::{DateTime, Utc, serde::ts_nanoseconds};\n".into())
        );
    }

    #[test]
    fn trailing_comma_list() {
        let text = "use chrono::{\n    DateTime,\n    Utc,\n};\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert_eq!(
            out,
            StepOutcome::Applied(
                "use chrono::{\n    DateTime,\n    Utc, serde::ts_nanoseconds\n};\n".into()
            )
        );
    }

    #[test]
    fn guard_sees_existing_import() {
        let text = "use chrono::{DateTime, Utc, serde::ts_nanoseconds};\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert_eq!(out, StepOutcome::AlreadyApplied);

        let separate = "use chrono::{DateTime, Utc};\nuse chrono::serde::ts_nanoseconds;\n";
        let out = AddImport::ts_nanoseconds().apply(separate, &record()).unwrap();
        assert_eq!(out, StepOutcome::AlreadyApplied);
    }

    #[test]
    fn serde_attribute_alone_does_not_trip_guard() {
        let text = "use chrono::{DateTime, Utc};\n#[serde(with = \"ts_nanoseconds\")]\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert!(matches!(out, StepOutcome::Applied(_)));
    }

    #[test]
    fn use_in_a_doc_comment_does_not_trip_guard() {
        let text = "\
use chrono::{DateTime, Utc};

/// Fields in use since 0.42
pub struct FooV0_42 {
    pub proto: u8,
    #[serde(with = \"ts_nanoseconds\")]
    pub start_time: DateTime<Utc>,
}
";
        let outcome = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        let StepOutcome::Applied(out) = &outcome else {
            panic!("expected the import to be added, got {outcome:?}");
        };
        assert!(out.starts_with("use chrono::{DateTime, Utc, serde::ts_nanoseconds};\n"));
    }

    #[test]
    fn pub_use_counts_as_import() {
        let text = "use chrono::{DateTime, Utc};\npub(crate) use chrono::serde::ts_nanoseconds;\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert_eq!(out, StepOutcome::AlreadyApplied);
    }

    #[test]
    fn no_chrono_import_is_no_match() {
        let text = "use std::fmt;\n";
        let out = AddImport::ts_nanoseconds().apply(text, &record()).unwrap();
        assert_eq!(out, StepOutcome::NoMatch);
    }

    #[test]
    fn empty_list_is_malformed() {
        let text = "use chrono::{};\n";
        let err = AddImport::ts_nanoseconds().apply(text, &record()).unwrap_err();
        assert!(matches!(err, StepError::MalformedMatch { .. }));
    }
}
