//! Byte-level BPE tokenizer.
//!
//! Text is split into chunks with a regex pattern, each chunk is turned into
//! its UTF-8 bytes, and the merges learned by [`Trainer`] are applied in the
//! order they were learned. Decoding concatenates vocabulary entries.
//!
//! Models are stored in the `minbpe v1` text format (see [`store`]).
//!
//! With the `python` feature this is also a PyO3 extension module.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod bytes;
mod chunker;
mod encoder;
mod error;
mod merges;
mod progress;
mod stats;
pub mod store;
mod tokenizer;
mod trainer;
mod types;
mod vocab;

#[cfg(feature = "python")]
mod python;

pub use bytes::{bytes_to_text, to_token_ids};
pub use chunker::{Chunker, GPT2_SPLIT_PATTERN, GPT4_SPLIT_PATTERN};
pub use encoder::Encoder;
pub use error::{ErrorMode, Result, TokenizerError};
pub use merges::{MergeRejection, MergeRule, Merges, merge_pair};
pub use stats::{
    PairCounts, Word, best_pair, count_pairs_into, pair_counts, par_pair_counts, word_pair_counts,
};
pub use tokenizer::Tokenizer;
pub use trainer::{
    MergeEngine, MergeStep, StopReason, Trainer, TrainerConfig, TrainingReport, TrainingState,
};
pub use types::{BYTE_VOCAB_SIZE, ByteSeq, FIRST_MERGE_ID, Token, TokenFreq, TokenPair};
pub use vocab::Vocabulary;
