//! Error types for BPE tokenizer and trainer operations.

use std::{io, path::PathBuf, str::FromStr};

use indicatif::style::TemplateError;
use thiserror::Error;

use crate::types::Token;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Controls how UTF-8 decoding errors are handled.
///
/// Unknown token ids always produce errors regardless of mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Fail on invalid UTF-8.
    Strict,
    /// Replace invalid UTF-8 sequences with U+FFFD.
    #[default]
    Replace,
}

impl FromStr for ErrorMode {
    type Err = String;

    /// Parses `"strict"` or `"replace"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            _ => Err(format!(
                "invalid error mode: {s:?} (expected \"strict\" or \"replace\")"
            )),
        }
    }
}

/// Everything that can go wrong while training, encoding, decoding or
/// persisting a tokenizer.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The model file starts with a tag this build does not understand.
    #[error("unsupported model format version: {0:?}")]
    UnsupportedFormatVersion(String),

    /// A model file line could not be interpreted.
    #[error("malformed model file at line {line}: {reason}")]
    MalformedModelFile { line: usize, reason: String },

    /// Token id not found in vocabulary.
    #[error("unknown token id: {0}")]
    UnknownTokenId(Token),

    /// Underlying file access failed.
    #[error("cannot access {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The split pattern failed to compile.
    #[error("invalid split pattern: {0}")]
    InvalidPattern(#[from] fancy_regex::Error),

    /// Regex engine failed during text splitting (e.g. backtracking limit exceeded).
    #[error("regex match failed: {0}")]
    RegexMatch(String),

    /// Decoded bytes are not valid UTF-8 (strict mode only).
    #[error("invalid UTF-8 in decoded bytes: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The pattern contains a line break and cannot be stored on one line.
    #[error("split pattern contains a line break and cannot be saved")]
    UnrepresentablePattern,

    /// Progress bar template string was invalid.
    #[error("template parsing failed: {0}")]
    ProgressBarSetup(#[from] TemplateError),
}

impl TokenizerError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedModelFile {
            line,
            reason: reason.into(),
        }
    }
}
