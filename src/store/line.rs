//! Classification of a single `KEY=VALUE` line
//!
//! Works on borrowed byte slices of the input line; nothing is copied until
//! the store decides to keep a pair. Lines are not required to be UTF-8.

use std::borrow::Cow;

/// Comment marker, only recognised as the first non-whitespace byte
pub const COMMENT_MARKER: u8 = b'#';

/// Key/value delimiter
pub const DELIMITER: u8 = b'=';

/// What one physical line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    /// Empty or whitespace-only
    Blank,
    /// `#` after optional leading whitespace
    Comment,
    /// A usable key and value
    Pair { key: &'a [u8], value: &'a [u8] },
    /// No delimiter, or an empty key
    Malformed,
}

/// Whitespace as C `isspace` sees it in the "C" locale
pub fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_space(b)).unwrap_or(bytes.len());
    &bytes[start..]
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| !is_space(b)).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Classify one line. `line` may still carry its terminator.
///
/// Leading whitespace is stripped before the key; trailing whitespace before
/// the delimiter stays part of the key unless `trim_keys` is set. The value
/// loses trailing whitespace only.
pub fn classify(line: &[u8], trim_keys: bool) -> ParsedLine<'_> {
    let content = trim_start(line);
    match content.first() {
        None => return ParsedLine::Blank,
        Some(&COMMENT_MARKER) => return ParsedLine::Comment,
        Some(_) => {}
    }

    let Some(delimiter) = content.iter().position(|&b| b == DELIMITER) else {
        return ParsedLine::Malformed;
    };
    let (key, value) = (&content[..delimiter], &content[delimiter + 1..]);

    // Leading whitespace is gone, so trimming cannot empty a non-empty key.
    let key = if trim_keys { trim_end(key) } else { key };
    if key.is_empty() {
        return ParsedLine::Malformed;
    }

    ParsedLine::Pair {
        key,
        value: trim_end(value),
    }
}

/// Line text for diagnostics: terminator stripped, invalid UTF-8 replaced
pub fn display_line(line: &[u8]) -> Cow<'_, str> {
    let end = line
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&line[..end])
}
