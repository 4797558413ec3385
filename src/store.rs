//! Model persistence.
//!
//! `<prefix>.model` is the only file read back. It holds a version tag, the
//! split pattern, the special token count (always 0) and one
//! `<left> <right>` line per merge in learned order; ids are reassigned from
//! 256 on load, so line order is merge priority.
//!
//! `<prefix>.vocab` is a human-readable listing written for inspection only.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use fancy_regex::Regex;

use crate::{
    bytes::{OTHER_CATEGORY_PATTERN, render_bytes},
    error::{Result, TokenizerError},
    merges::Merges,
    tokenizer::Tokenizer,
    types::{Token, TokenPair},
    vocab::Vocabulary,
};

/// First line of every model file this crate writes and accepts.
pub const FORMAT_VERSION: &str = "minbpe v1";

/// Writes the model file contents.
///
/// # Errors
///
/// Returns [`TokenizerError::UnrepresentablePattern`] if `pattern` spans
/// more than one line, or the underlying I/O error.
pub fn write_model<W: Write>(out: &mut W, pattern: &str, merges: &Merges) -> Result<()> {
    if pattern.contains(['\n', '\r']) {
        return Err(TokenizerError::UnrepresentablePattern);
    }
    write_model_lines(out, pattern, merges).map_err(|e| TokenizerError::storage("<model>", e))
}

fn write_model_lines<W: Write>(out: &mut W, pattern: &str, merges: &Merges) -> std::io::Result<()> {
    writeln!(out, "{FORMAT_VERSION}")?;
    writeln!(out, "{pattern}")?;
    // special tokens are not supported
    writeln!(out, "0")?;
    for rule in merges {
        writeln!(out, "{} {}", rule.pair.0, rule.pair.1)?;
    }
    Ok(())
}

/// Parses model file contents into the pattern and merge sequence.
///
/// # Errors
///
/// Returns [`TokenizerError::UnsupportedFormatVersion`] for an unknown tag,
/// and [`TokenizerError::MalformedModelFile`] for a missing header line, a
/// non-zero special token count, or a merge line that is unparsable,
/// references an id that does not exist yet, or repeats a pair.
pub fn read_model<R: BufRead>(input: R) -> Result<(String, Merges)> {
    let mut lines = input.lines().enumerate().map(|(i, line)| (i + 1, line));
    let mut header_line = |no: usize, what: &str| -> Result<String> {
        match lines.next() {
            Some((_, Ok(line))) => Ok(strip_line_ending(line)),
            Some((_, Err(e))) => Err(TokenizerError::storage("<model>", e)),
            None => Err(TokenizerError::malformed(no, format!("missing {what}"))),
        }
    };

    let version = header_line(1, "format version")?;
    if version != FORMAT_VERSION {
        return Err(TokenizerError::UnsupportedFormatVersion(version));
    }

    let pattern = header_line(2, "split pattern")?;

    let special = header_line(3, "special token count")?;
    match special.trim().parse::<usize>() {
        Ok(0) => {}
        Ok(n) => {
            return Err(TokenizerError::malformed(
                3,
                format!("{n} special tokens declared; special tokens are not supported"),
            ));
        }
        Err(e) => {
            return Err(TokenizerError::malformed(
                3,
                format!("invalid special token count {special:?}: {e}"),
            ));
        }
    }

    let mut merges = Merges::new();
    for (no, line) in lines {
        let line = line.map_err(|e| TokenizerError::storage("<model>", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let pair = parse_merge_line(&line).map_err(|reason| TokenizerError::malformed(no, reason))?;
        merges
            .push(pair)
            .map_err(|rejection| TokenizerError::malformed(no, rejection.to_string()))?;
    }

    Ok((pattern, merges))
}

/// Writes the human-readable vocabulary listing.
///
/// One line per id in id order: `[<bytes>] <id>` for byte tokens and
/// `[<left>][<right>] -> [<merged>] <id>` for merges.
///
/// # Errors
///
/// Returns the underlying I/O error, or [`TokenizerError::RegexMatch`] if
/// rendering fails.
pub fn write_vocab<W: Write>(out: &mut W, merges: &Merges, vocab: &Vocabulary) -> Result<()> {
    let other_chars = Regex::new(OTHER_CATEGORY_PATTERN)?;
    let render = |id: Token| -> Result<String> {
        render_bytes(vocab.get(id).unwrap_or_default(), &other_chars)
    };
    let io_err = |e| TokenizerError::storage("<vocab>", e);

    for (id, bytes) in vocab.iter() {
        let rendered = render_bytes(bytes, &other_chars)?;
        match merges.rule(id) {
            Some(rule) => {
                let left = render(rule.pair.0)?;
                let right = render(rule.pair.1)?;
                writeln!(out, "[{left}][{right}] -> [{rendered}] {id}").map_err(io_err)?;
            }
            None => writeln!(out, "[{rendered}] {id}").map_err(io_err)?,
        }
    }
    Ok(())
}

impl Tokenizer {
    /// Saves `<prefix>.model` and `<prefix>.vocab`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::StorageUnavailable`] if either file cannot
    /// be written, or [`TokenizerError::UnrepresentablePattern`].
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.as_ref();
        self.save_model(with_suffix(prefix, "model"))?;
        self.save_vocab(with_suffix(prefix, "vocab"))
    }

    /// Saves only the model file.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_to(path, |out| write_model(out, self.pattern(), self.merges()))?;
        log::info!(
            "saved model with {} merges to {}",
            self.merges().len(),
            path.display()
        );
        Ok(())
    }

    /// Saves only the human-readable vocabulary listing.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_vocab(&self, path: impl AsRef<Path>) -> Result<()> {
        write_to(path.as_ref(), |out| write_vocab(out, self.merges(), self.vocab()))
    }

    /// Loads a tokenizer from a model file written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::StorageUnavailable`] if the file cannot be
    /// read, [`TokenizerError::UnsupportedFormatVersion`],
    /// [`TokenizerError::MalformedModelFile`], or
    /// [`TokenizerError::InvalidPattern`] if the stored pattern does not
    /// compile.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TokenizerError::storage(path, e))?;
        let (pattern, merges) = read_model(BufReader::new(file)).map_err(|e| at_path(e, path))?;

        log::info!("loaded model with {} merges from {}", merges.len(), path.display());
        Self::from_merges(&pattern, merges)
    }
}

fn write_to<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(path).map_err(|e| TokenizerError::storage(path, e))?;
    let mut out = BufWriter::new(file);
    write(&mut out).map_err(|e| at_path(e, path))?;
    out.flush().map_err(|e| TokenizerError::storage(path, e))
}

/// Replaces the placeholder path of storage errors raised by the
/// reader/writer helpers with the real file path.
fn at_path(err: TokenizerError, path: &Path) -> TokenizerError {
    match err {
        TokenizerError::StorageUnavailable { source, .. } => TokenizerError::storage(path, source),
        other => other,
    }
}

fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn strip_line_ending(mut line: String) -> String {
    // `lines()` already drops "\n"; a CRLF file leaves the "\r"
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

fn parse_merge_line(line: &str) -> std::result::Result<TokenPair, String> {
    let mut fields = line.split_whitespace();
    let (Some(left), Some(right), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected two token ids, found {line:?}"));
    };
    let parse = |s: &str| {
        s.parse::<Token>()
            .map_err(|e| format!("invalid token id {s:?}: {e}"))
    };
    Ok(TokenPair(parse(left)?, parse(right)?))
}
