//! Brace balancing for anchored regions.
//!
//! Skips string literals (plain, byte and raw), char literals and comments so
//! that braces inside format strings like `"{:?}"` do not count. Lifetimes
//! (`'a`, `'_`) are told apart from char literals by looking for the closing
//! quote. Every delimiter involved is ASCII, so scanning bytes never splits a
//! UTF-8 sequence.

use std::ops::Range;

/// What starts at a given byte.
enum Lexeme {
    Code,
    /// A literal or comment; the offset just past it
    Skipped(usize),
    /// A literal or comment that runs off the end of the text
    Unterminated,
}

fn lexeme_at(text: &str, i: usize) -> Lexeme {
    let bytes = text.as_bytes();
    let end = match bytes[i] {
        b'"' => skip_string(bytes, i + 1),
        b'r' if raw_string_hashes(bytes, i).is_some() => skip_raw_string(bytes, i),
        b'\'' => Some(skip_char_literal(text, i)),
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(skip_line(bytes, i)),
        b'/' if bytes.get(i + 1) == Some(&b'*') => skip_block_comment(bytes, i + 2),
        _ => return Lexeme::Code,
    };
    end.map_or(Lexeme::Unterminated, Lexeme::Skipped)
}

/// Find the `}` closing the block whose body starts at `body_start`
/// (the byte just after the opening `{`).
///
/// Returns `None` if the block is never closed.
pub fn find_closing_brace(text: &str, body_start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = body_start;

    while i < bytes.len() {
        match lexeme_at(text, i) {
            Lexeme::Skipped(end) => {
                i = end;
                continue;
            }
            Lexeme::Unterminated => return None,
            Lexeme::Code => {}
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Byte spans of every string literal, char literal and comment in `text`,
/// in ascending order.
pub fn non_code_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < text.len() {
        match lexeme_at(text, i) {
            Lexeme::Code => i += 1,
            Lexeme::Skipped(end) => {
                spans.push(i..end);
                i = end;
            }
            Lexeme::Unterminated => {
                spans.push(i..text.len());
                break;
            }
        }
    }

    spans
}

/// Whether `offset` falls inside one of `spans` (as returned by
/// [`non_code_spans`]).
pub fn in_spans(spans: &[Range<usize>], offset: usize) -> bool {
    let idx = spans.partition_point(|span| span.end <= offset);
    spans.get(idx).is_some_and(|span| span.start <= offset)
}

/// Skip past the closing quote of a string whose content starts at `i`.
fn skip_string(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// If a raw string (`r"`, `r#"`, `br#"`) starts at `i`, the number of `#`s.
fn raw_string_hashes(bytes: &[u8], i: usize) -> Option<usize> {
    let prefix_ok = match i.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(b'b') => i < 2 || !is_ident_byte(bytes[i - 2]),
        Some(prev) => !is_ident_byte(prev),
    };
    if !prefix_ok {
        return None;
    }

    let hashes = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
    (bytes.get(i + 1 + hashes) == Some(&b'"')).then_some(hashes)
}

fn skip_raw_string(bytes: &[u8], i: usize) -> Option<usize> {
    let hashes = raw_string_hashes(bytes, i)?;
    let mut j = i + 1 + hashes + 1;
    while j < bytes.len() {
        if bytes[j] == b'"'
            && bytes[j + 1..].iter().take(hashes).filter(|&&b| b == b'#').count() == hashes
        {
            return Some(j + 1 + hashes);
        }
        j += 1;
    }
    None
}

/// Skip a char literal starting at `i`, or just the quote of a lifetime.
fn skip_char_literal(text: &str, i: usize) -> usize {
    let bytes = text.as_bytes();

    if bytes.get(i + 1) == Some(&b'\\') {
        // '\n', '\'', '\u{1F600}'
        let limit = (i + 12).min(bytes.len());
        return (i + 3..limit)
            .find(|&j| bytes[j] == b'\'')
            .map_or(i + 1, |j| j + 1);
    }

    let Some(ch) = text.get(i + 1..).and_then(|rest| rest.chars().next()) else {
        return i + 1;
    };
    let close = i + 1 + ch.len_utf8();
    if ch != '\'' && bytes.get(close) == Some(&b'\'') {
        close + 1
    } else {
        i + 1
    }
}

fn skip_line(bytes: &[u8], i: usize) -> usize {
    bytes[i..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| i + p + 1)
}

fn skip_block_comment(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}
