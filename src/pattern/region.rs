use crate::pattern::errors::MatchError;
use crate::pattern::PatternKind;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;

/// A located block of source text opened by an anchor.
///
/// Offsets are absolute byte positions in the text the region was found in.
/// `body_end` is the position of the closing `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: PatternKind,
    /// Start of the anchor header
    pub start: usize,
    /// First byte after the opening `{`
    pub body_start: usize,
    /// Position of the closing `}`
    pub body_end: usize,
}

impl Region {
    pub fn body<'t>(&self, text: &'t str) -> &'t str {
        &text[self.body_start..self.body_end]
    }

    pub fn header<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.body_start]
    }

    /// Full span including header and closing brace.
    pub fn span(&self) -> Range<usize> {
        self.start..self.body_end + 1
    }

    /// Capture the single occurrence of `pattern` inside the body.
    ///
    /// `Ok(None)` when absent; [`MatchError::AmbiguousCapture`] when the
    /// pattern occurs more than once.
    pub fn capture(&self, text: &str, pattern: &Regex) -> Result<Option<Capture>, MatchError> {
        let mut captures = self.capture_all(text, pattern);
        match captures.len() {
            0 => Ok(None),
            1 => Ok(captures.pop()),
            count => Err(MatchError::AmbiguousCapture {
                kind: self.kind,
                count,
            }),
        }
    }

    /// Every non-overlapping occurrence of `pattern` inside the body.
    pub fn capture_all(&self, text: &str, pattern: &Regex) -> Vec<Capture> {
        let body = self.body(text);
        pattern
            .captures_iter(body)
            .map(|caps| Capture::from_regex(pattern, &caps, self.body_start))
            .collect()
    }
}

/// A sub-pattern match inside a region, with named groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    span: Range<usize>,
    groups: BTreeMap<String, Range<usize>>,
}

impl Capture {
    fn from_regex(pattern: &Regex, caps: &regex::Captures<'_>, offset: usize) -> Self {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let groups = pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name).map(|m| {
                    let r = m.range();
                    (name.to_string(), r.start + offset..r.end + offset)
                })
            })
            .collect();

        Self {
            span: whole.start + offset..whole.end + offset,
            groups,
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn group(&self, name: &str) -> Option<Range<usize>> {
        self.groups.get(name).cloned()
    }

    /// Text of a named group, or `""` if the group did not participate.
    pub fn text<'t>(&self, text: &'t str, name: &str) -> &'t str {
        self.group(name).map_or("", |r| &text[r])
    }
}
