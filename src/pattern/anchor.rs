use crate::cache;
use crate::pattern::errors::MatchError;
use crate::pattern::region::Region;
use crate::pattern::scanner;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// The structural shape an anchor locates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// `use module::{ ... }` item list
    Import,
    /// `struct Name { ... }` field list
    StructBody,
    /// `impl ... { ... }` block holding a constructor
    ConstructorBody,
    /// `impl ... { ... }` block holding a formatting method
    FormatMethod,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::Import => "import-anchor",
            PatternKind::StructBody => "struct-body-anchor",
            PatternKind::ConstructorBody => "constructor-body-anchor",
            PatternKind::FormatMethod => "format-method-anchor",
        };
        f.write_str(name)
    }
}

/// An anchored header pattern plus an optional member filter.
///
/// The header pattern must end at the `{` that opens the region.
///
/// # Example
///
/// ```
/// use field_migrator::pattern::{Anchor, PatternKind};
///
/// let text = "pub struct FooV0_42 { pub proto: u8, }";
/// let anchor = Anchor::struct_body("FooV0_42").unwrap();
/// let region = anchor.find(text).unwrap().expect("anchor present");
/// assert_eq!(region.kind, PatternKind::StructBody);
/// assert_eq!(region.body(text).trim(), "pub proto: u8,");
/// ```
#[derive(Debug, Clone)]
pub struct Anchor {
    kind: PatternKind,
    header: Regex,
    member: Option<String>,
}

impl Anchor {
    pub fn new(kind: PatternKind, header: &str) -> Result<Self, MatchError> {
        let header = cache::get_or_compile(header).map_err(|e| MatchError::InvalidPattern {
            kind,
            message: e.to_string(),
        })?;
        Ok(Self {
            kind,
            header,
            member: None,
        })
    }

    /// `use module::{`
    pub fn use_list(module: &str) -> Result<Self, MatchError> {
        let pattern = format!(r"\buse\s+{}\s*::\s*\{{", path_pattern(module));
        Self::new(PatternKind::Import, &pattern)
    }

    /// `struct Name {`, with or without a visibility qualifier.
    pub fn struct_body(name: &str) -> Result<Self, MatchError> {
        let pattern = format!(r"\bstruct\s+{}\s*\{{", regex::escape(name));
        Self::new(PatternKind::StructBody, &pattern)
    }

    /// Inherent `impl Name {`.
    pub fn impl_block(kind: PatternKind, self_ty: &str) -> Result<Self, MatchError> {
        let pattern = format!(r"\bimpl\s+{}\s*\{{", regex::escape(self_ty));
        Self::new(kind, &pattern)
    }

    /// `impl Trait for Name {`, where `trait_pattern` is a regex fragment.
    pub fn trait_impl(kind: PatternKind, trait_pattern: &str, self_ty: &str) -> Result<Self, MatchError> {
        let pattern = format!(
            r"\bimpl\s+{}\s+for\s+{}\s*\{{",
            trait_pattern,
            regex::escape(self_ty)
        );
        Self::new(kind, &pattern)
    }

    /// Only accept regions whose body contains `member`.
    pub fn containing(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Locate the unique region this anchor opens.
    ///
    /// Headers that start inside a comment or string literal are not
    /// candidates.
    /// Zero candidates is `Ok(None)`; more than one is
    /// [`MatchError::AmbiguousMatch`]. An anchor whose block never closes is
    /// [`MatchError::UnclosedBlock`].
    pub fn find(&self, text: &str) -> Result<Option<Region>, MatchError> {
        let mut found = Vec::new();
        let mut non_code = None;

        for m in self.header.find_iter(text) {
            let skipped = non_code.get_or_insert_with(|| scanner::non_code_spans(text));
            if scanner::in_spans(skipped, m.start()) {
                continue;
            }

            let body_start = m.end();
            let body_end = scanner::find_closing_brace(text, body_start).ok_or(
                MatchError::UnclosedBlock {
                    kind: self.kind,
                    offset: m.start(),
                },
            )?;

            let region = Region {
                kind: self.kind,
                start: m.start(),
                body_start,
                body_end,
            };

            if let Some(member) = &self.member {
                if !region.body(text).contains(member.as_str()) {
                    continue;
                }
            }
            found.push(region);
        }

        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            count => Err(MatchError::AmbiguousMatch {
                kind: self.kind,
                count,
            }),
        }
    }
}

/// `a::b` -> `a\s*::\s*b`
fn path_pattern(path: &str) -> String {
    path.split("::")
        .map(|segment| regex::escape(segment.trim()))
        .collect::<Vec<_>>()
        .join(r"\s*::\s*")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"use chrono::{DateTime, Utc};

pub struct FooV0_42 {
    pub proto: u8,
}

pub struct Foo {
    pub proto: u8,
}

impl Foo {
    pub fn new() -> Self {
        todo!()
    }
}

impl Foo {
    pub fn other(&self) -> String {
        format!("{}", "}")
    }
}

impl fmt::Display for Foo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proto={:?}", self.proto)
    }
}
"#;

    #[test]
    fn struct_anchor_is_exact_on_name() {
        let region = Anchor::struct_body("Foo").unwrap().find(EVENT).unwrap().unwrap();
        assert!(region.header(EVENT).starts_with("struct Foo {"));

        let versioned = Anchor::struct_body("FooV0_42")
            .unwrap()
            .find(EVENT)
            .unwrap()
            .unwrap();
        assert!(versioned.header(EVENT).contains("FooV0_42"));
    }

    #[test]
    fn missing_anchor_is_none() {
        let found = Anchor::struct_body("Bar").unwrap().find(EVENT).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn duplicate_candidates_are_ambiguous() {
        let err = Anchor::impl_block(PatternKind::ConstructorBody, "Foo")
            .unwrap()
            .find(EVENT)
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::AmbiguousMatch {
                kind: PatternKind::ConstructorBody,
                count: 2
            }
        );
    }

    #[test]
    fn member_filter_disambiguates() {
        let region = Anchor::impl_block(PatternKind::ConstructorBody, "Foo")
            .unwrap()
            .containing("fn new(")
            .find(EVENT)
            .unwrap()
            .unwrap();
        assert!(region.body(EVENT).contains("todo!()"));
    }

    #[test]
    fn trait_impl_anchor() {
        let region = Anchor::trait_impl(PatternKind::FormatMethod, r"(?:std\s*::\s*)?fmt::Display", "Foo")
            .unwrap()
            .find(EVENT)
            .unwrap()
            .unwrap();
        assert!(region.body(EVENT).contains("write!"));
        assert_eq!(&EVENT[region.body_end..=region.body_end], "}");
    }

    #[test]
    fn use_list_anchor() {
        let region = Anchor::use_list("chrono").unwrap().find(EVENT).unwrap().unwrap();
        assert_eq!(region.body(EVENT), "DateTime, Utc");
    }

    #[test]
    fn unclosed_region_is_an_error() {
        let err = Anchor::struct_body("Foo")
            .unwrap()
            .find("pub struct Foo { pub proto: u8,")
            .unwrap_err();
        assert!(matches!(err, MatchError::UnclosedBlock { offset: 4, .. }));
    }

    #[test]
    fn headers_in_comments_and_strings_are_skipped() {
        let text = r#"// TODO: revisit impl Foo { once upstream lands
/* impl Foo { */
const NOTE: &str = "impl Foo {";

impl Foo {
    pub fn new() -> Self {
        todo!()
    }
}
"#;
        let region = Anchor::impl_block(PatternKind::ConstructorBody, "Foo")
            .unwrap()
            .find(text)
            .unwrap()
            .unwrap();
        assert_eq!(region.start, text.rfind("impl Foo {").unwrap());
        assert!(region.body(text).contains("fn new("));
    }
}
