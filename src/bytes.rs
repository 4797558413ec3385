//! Conversions between text, raw bytes and base token ids.

use std::fmt::Write as _;

use fancy_regex::Regex;

use crate::{
    error::{ErrorMode, Result, TokenizerError},
    types::Token,
};

/// Matches every character of Unicode general category "Other"
/// (control, format, surrogate, private use, unassigned).
pub(crate) const OTHER_CATEGORY_PATTERN: &str = r"\p{C}";

/// Converts a text segment into base token ids, one per UTF-8 byte.
#[inline]
pub fn to_token_ids(segment: &str) -> Vec<Token> {
    segment.bytes().map(Token::from).collect()
}

/// Turns decoded bytes back into text.
///
/// # Errors
///
/// Returns [`TokenizerError::InvalidUtf8`] for invalid UTF-8, only in
/// [`ErrorMode::Strict`].
pub fn bytes_to_text(bytes: Vec<u8>, errors: ErrorMode) -> Result<String> {
    match errors {
        ErrorMode::Strict => Ok(String::from_utf8(bytes)?),
        ErrorMode::Replace => Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
    }
}

/// Renders a token's bytes for display.
///
/// Invalid UTF-8 is replaced with U+FFFD and every "Other" category
/// character is escaped as `\uXXXX`, so the result is safe to print on one
/// line.
///
/// # Errors
///
/// Returns [`TokenizerError::RegexMatch`] if `other_chars` fails to match.
pub(crate) fn render_bytes(bytes: &[u8], other_chars: &Regex) -> Result<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for mat in other_chars.find_iter(&text) {
        let m = mat.map_err(|e| TokenizerError::RegexMatch(e.to_string()))?;
        out.push_str(&text[cursor..m.start()]);
        for ch in m.as_str().chars() {
            // writing to a String cannot fail
            let _ = write!(out, "\\u{:04x}", u32::from(ch));
        }
        cursor = m.end();
    }
    out.push_str(&text[cursor..]);

    Ok(out)
}
