//! This module provides the complete tokenizer pipeline:
//! 1. Regex pattern matching to split text into chunks.
//! 2. UTF-8 byte conversion for each chunk.
//! 3. BPE merge application on byte sequences.
//! 4. Decoding ids back through the vocabulary.
//!
//! A [`Tokenizer`] is built once, by training or by loading a model file,
//! and is read-only afterwards. It is `Send + Sync`, so one instance can
//! serve concurrent encode/decode calls; the batch methods do exactly that
//! via Rayon.

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::{
    bytes::{bytes_to_text, to_token_ids},
    chunker::{Chunker, GPT2_SPLIT_PATTERN},
    encoder::Encoder,
    error::{ErrorMode, Result, TokenizerError},
    merges::Merges,
    progress::progress_bar,
    trainer::{Trainer, TrainerConfig, TrainingReport},
    types::Token,
    vocab::Vocabulary,
};

/// A trained byte-level BPE model: split pattern, ordered merges and the
/// vocabulary derived from them.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    chunker: Chunker,
    merges: Merges,
    vocab: Vocabulary,
}

impl Tokenizer {
    /// Creates a tokenizer from a split pattern and learned merges.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::InvalidPattern`] if `pattern` fails to compile.
    pub fn from_merges(pattern: &str, merges: Merges) -> Result<Self> {
        let chunker = Chunker::new(pattern)?;
        let vocab = Vocabulary::build(&merges);
        Ok(Self {
            chunker,
            merges,
            vocab,
        })
    }

    /// Trains on `text` with the GPT-2 split pattern until the vocabulary
    /// holds `vocab_size` tokens or no pair is left.
    ///
    /// A `vocab_size` of 256 or less, or empty text, yields a tokenizer
    /// without merges.
    ///
    /// # Example
    ///
    /// ```
    /// use minbpe::Tokenizer;
    ///
    /// let tok = Tokenizer::train("aaabdaaabac", 259).unwrap();
    /// let ids = tok.encode("aaabdaaabac").unwrap();
    /// assert_eq!(ids, vec![258, 100, 258, 97, 99]);
    /// assert_eq!(tok.decode(&ids).unwrap(), "aaabdaaabac");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::RegexMatch`] if text splitting fails.
    pub fn train(text: &str, vocab_size: usize) -> Result<Self> {
        let config = TrainerConfig::with_vocab_size(vocab_size);
        Self::train_with(text, GPT2_SPLIT_PATTERN, &config).map(|(tok, _)| tok)
    }

    /// Trains on `text` with an explicit split pattern and config.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::InvalidPattern`] for a bad `pattern`,
    /// [`TokenizerError::RegexMatch`] if splitting fails, or
    /// [`TokenizerError::ProgressBarSetup`] if the progress bar cannot be built.
    pub fn train_with(
        text: &str,
        pattern: &str,
        config: &TrainerConfig,
    ) -> Result<(Self, TrainingReport)> {
        let chunker = Chunker::new(pattern)?;
        let (merges, report) = Trainer::new(config.clone()).train(text, &chunker)?;
        let vocab = Vocabulary::build(&merges);

        Ok((
            Self {
                chunker,
                merges,
                vocab,
            },
            report,
        ))
    }

    /// Encodes text: regex split → bytes → BPE, chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::RegexMatch`] if the regex engine fails during
    /// text splitting (e.g. backtracking limit exceeded).
    pub fn encode(&self, text: &str) -> Result<Vec<Token>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let encoder = Encoder::new(&self.merges);
        let mut ids = Vec::with_capacity(text.len() / 2);

        for chunk in self.chunker.split(text)? {
            ids.extend(encoder.encode_chunk(to_token_ids(chunk)));
        }

        Ok(ids)
    }

    /// Encodes many texts in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::RegexMatch`] if the regex engine fails during
    /// text splitting, or [`TokenizerError::ProgressBarSetup`] if the progress
    /// bar template fails to compile.
    pub fn encode_batch(&self, texts: &[&str], show_progress: bool) -> Result<Vec<Vec<Token>>> {
        let pb = progress_bar(texts.len() as u64, "Encoding texts", show_progress)?;

        texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.encode(text))
            .collect()
    }

    /// Decodes ids to text, replacing invalid UTF-8 with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownTokenId`] if an id is not in the
    /// vocabulary.
    pub fn decode(&self, ids: &[Token]) -> Result<String> {
        self.decode_with(ids, ErrorMode::Replace)
    }

    /// Decodes ids to text with the given UTF-8 error handling.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownTokenId`] if an id is not in the
    /// vocabulary, or [`TokenizerError::InvalidUtf8`] if the bytes are not
    /// valid UTF-8 (only in `Strict` mode).
    pub fn decode_with(&self, ids: &[Token], errors: ErrorMode) -> Result<String> {
        bytes_to_text(self.decode_bytes(ids)?, errors)
    }

    /// Concatenated bytes of `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::UnknownTokenId`] for the first id that is
    /// not in the vocabulary.
    pub fn decode_bytes(&self, ids: &[Token]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            let token = self
                .vocab
                .get(id)
                .ok_or(TokenizerError::UnknownTokenId(id))?;
            bytes.extend_from_slice(token);
        }
        Ok(bytes)
    }

    /// Decodes many id sequences in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Same as [`decode_with`](Self::decode_with), plus
    /// [`TokenizerError::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn decode_batch(
        &self,
        seqs: &[&[Token]],
        errors: ErrorMode,
        show_progress: bool,
    ) -> Result<Vec<String>> {
        let pb = progress_bar(seqs.len() as u64, "Decoding tokens", show_progress)?;

        seqs.par_iter()
            .progress_with(pb)
            .map(|ids| self.decode_with(ids, errors))
            .collect()
    }

    /// The split pattern descriptor.
    pub fn pattern(&self) -> &str {
        self.chunker.pattern()
    }

    pub fn merges(&self) -> &Merges {
        &self.merges
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Number of tokens: 256 byte tokens plus one per merge.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}
