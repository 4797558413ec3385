//! Pre-tokenization: splitting raw text into independent chunks.
//!
//! BPE never merges across chunk boundaries, so the split pattern decides
//! which byte runs can ever become a single token.

use fancy_regex::Regex;

use crate::error::{Result, TokenizerError};

/// GPT-2 split pattern.
pub const GPT2_SPLIT_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// GPT-4 (cl100k) split pattern.
pub const GPT4_SPLIT_PATTERN: &str = r"'(?i:[sdmt]|ll|ve|re)|[^\r\n\p{L}\p{N}]?+\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]++[\r\n]*|\s*[\r\n]|\s+(?!\S)|\s+";

/// Splits text into ordered, non-empty segments with a compiled pattern.
///
/// The segments always concatenate back to the input: text the pattern does
/// not match is emitted as a segment of its own instead of being dropped.
#[derive(Debug, Clone)]
pub struct Chunker {
    pattern: String,
    regex: Regex,
}

impl Chunker {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::InvalidPattern`] if the regex fails to compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    /// The pattern descriptor this chunker was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Splits `text` into segments in input order.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::RegexMatch`] if the regex engine fails during
    /// matching (e.g. backtracking limit exceeded).
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for mat in self.regex.find_iter(text) {
            let m = mat.map_err(|e| TokenizerError::RegexMatch(e.to_string()))?;
            if m.start() == m.end() {
                continue;
            }
            // keep whatever the pattern skipped over
            if m.start() > cursor {
                segments.push(&text[cursor..m.start()]);
            }
            segments.push(m.as_str());
            cursor = m.end();
        }

        if cursor < text.len() {
            segments.push(&text[cursor..]);
        }

        Ok(segments)
    }
}
