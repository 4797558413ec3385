//! BPE merge training.
//!
//! Training is a sequential loop: every iteration depends on the chunks
//! rewritten by the previous merge. Within one iteration the pair counting
//! and the chunk rewrite run on rayon's pool.
//!
//! Identical chunks are collapsed into weighted [`Word`]s up front. Counts
//! are the same as over the expanded chunks, so the learned merges are too.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use rayon::prelude::*;

use crate::{
    bytes::to_token_ids,
    chunker::Chunker,
    error::Result,
    merges::{MergeRule, Merges, merge_pair},
    progress::progress_bar,
    stats::{Word, best_pair, word_pair_counts},
    types::{BYTE_VOCAB_SIZE, TokenFreq},
};

/// Training options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerConfig {
    /// Target vocabulary size, including the 256 byte tokens.
    pub vocab_size: usize,
    /// Stop after this many merges even if `vocab_size` is not reached.
    pub max_iterations: Option<usize>,
    /// Stop once training has run this long.
    pub time_budget: Option<Duration>,
    /// Render a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            vocab_size: 512,
            max_iterations: None,
            time_budget: None,
            show_progress: false,
        }
    }
}

impl TrainerConfig {
    /// Config that learns `vocab_size - 256` merges with no budget.
    pub fn with_vocab_size(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ..Self::default()
        }
    }

    /// Number of merges requested by `vocab_size`.
    pub fn target_merges(&self) -> usize {
        self.vocab_size.saturating_sub(BYTE_VOCAB_SIZE)
    }
}

/// Why training ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of merges was learned.
    TargetReached,
    /// No chunk had an adjacent pair left.
    NoPairsLeft,
    /// The iteration or time budget ran out first.
    BudgetExhausted,
}

/// Where the merge engine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Running { iteration: usize },
    Done(StopReason),
}

/// Outcome of one successful iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStep {
    pub rule: MergeRule,
    /// How often the pair occurred when it was selected.
    pub freq: TokenFreq,
}

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingReport {
    pub requested_merges: usize,
    pub learned_merges: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// The training state machine.
///
/// Each [`step`](Self::step) counts pairs over the working words, picks the
/// most frequent one (smallest pair on ties), records it with the next id
/// and rewrites every word with it.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    words: Vec<Word>,
    merges: Merges,
    target_merges: usize,
    state: TrainingState,
}

impl MergeEngine {
    /// Starts training over weighted words.
    pub fn new(words: Vec<Word>, target_merges: usize) -> Self {
        let mut engine = Self {
            words,
            merges: Merges::new(),
            target_merges,
            state: TrainingState::Running { iteration: 0 },
        };
        engine.drop_unmergeable();
        engine
    }

    /// Starts training over text chunks, collapsing identical chunks.
    pub fn from_chunks<'t>(chunks: impl IntoIterator<Item = &'t str>, target_merges: usize) -> Self {
        let mut counts: HashMap<&str, TokenFreq> = HashMap::new();
        for chunk in chunks {
            *counts.entry(chunk).or_insert(0) += 1;
        }

        let words = counts
            .into_iter()
            .map(|(chunk, count)| Word::new(to_token_ids(chunk), count))
            .collect();

        Self::new(words, target_merges)
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn merges(&self) -> &Merges {
        &self.merges
    }

    /// Words that can still take part in a merge.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Runs one iteration.
    ///
    /// Returns `None` once the engine is done; [`state`](Self::state) then
    /// says why.
    pub fn step(&mut self) -> Option<MergeStep> {
        let TrainingState::Running { iteration } = self.state else {
            return None;
        };

        if self.merges.len() >= self.target_merges {
            self.state = TrainingState::Done(StopReason::TargetReached);
            return None;
        }

        let counts = word_pair_counts(&self.words);
        let Some((pair, freq)) = best_pair(&counts) else {
            self.state = TrainingState::Done(StopReason::NoPairsLeft);
            return None;
        };

        // every occurrence of a merged pair is rewritten below, so a pair is
        // never selected twice
        let id = match self.merges.push(pair) {
            Ok(id) => id,
            Err(rejection) => {
                log::error!("stopping training: {rejection}");
                self.state = TrainingState::Done(StopReason::NoPairsLeft);
                return None;
            }
        };

        self.words.par_iter_mut().for_each(|word| {
            word.ids = merge_pair(&word.ids, pair, id);
        });
        self.drop_unmergeable();

        self.state = TrainingState::Running {
            iteration: iteration + 1,
        };

        Some(MergeStep {
            rule: MergeRule { pair, id },
            freq,
        })
    }

    /// Ends training early.
    ///
    /// Has no effect once done. If the target was already reached that is
    /// reported instead of `reason`.
    pub fn halt(&mut self, reason: StopReason) {
        if let TrainingState::Running { .. } = self.state {
            let reason = if self.merges.len() >= self.target_merges {
                StopReason::TargetReached
            } else {
                reason
            };
            self.state = TrainingState::Done(reason);
        }
    }

    /// Steps until done.
    pub fn run(&mut self) -> StopReason {
        loop {
            if self.step().is_none() {
                if let TrainingState::Done(reason) = self.state {
                    return reason;
                }
            }
        }
    }

    pub fn into_merges(self) -> Merges {
        self.merges
    }

    fn drop_unmergeable(&mut self) {
        self.words.retain(|w| w.ids.len() >= 2);
    }
}

/// Learns merges from text according to a [`TrainerConfig`].
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Splits `text` with `chunker` and learns merges until the target, the
    /// budget, or the pairs run out.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::RegexMatch`](crate::TokenizerError::RegexMatch)
    /// if splitting fails, or
    /// [`TokenizerError::ProgressBarSetup`](crate::TokenizerError::ProgressBarSetup)
    /// if the progress bar cannot be built.
    pub fn train(&self, text: &str, chunker: &Chunker) -> Result<(Merges, TrainingReport)> {
        let start = Instant::now();
        let requested = self.config.target_merges();

        let chunks = chunker.split(text)?;
        let n_chunks = chunks.len();
        let mut engine = MergeEngine::from_chunks(chunks, requested);

        log::info!(
            "training BPE: {} bytes, {} chunks ({} mergeable unique), {} merges requested",
            text.len(),
            n_chunks,
            engine.words().len(),
            requested
        );

        let pb = progress_bar(requested as u64, "Learning merges", self.config.show_progress)?;

        let stop_reason = loop {
            if self.budget_exhausted(engine.merges().len(), start) {
                engine.halt(StopReason::BudgetExhausted);
            }

            match engine.step() {
                Some(step) => {
                    log::debug!(
                        "merge {}/{}: {} -> {} ({} occurrences)",
                        step.rule.id - BYTE_VOCAB_SIZE + 1,
                        requested,
                        step.rule.pair,
                        step.rule.id,
                        step.freq
                    );
                    pb.inc(1);
                }
                None => match engine.state() {
                    TrainingState::Done(reason) => break reason,
                    TrainingState::Running { .. } => continue,
                },
            }
        };
        pb.finish_and_clear();

        let merges = engine.into_merges();
        let report = TrainingReport {
            requested_merges: requested,
            learned_merges: merges.len(),
            stop_reason,
            elapsed: start.elapsed(),
        };

        match stop_reason {
            StopReason::TargetReached => log::info!(
                "training complete: {} merges in {:.2?}",
                report.learned_merges,
                report.elapsed
            ),
            _ => log::info!(
                "training stopped early ({:?}): {} of {} merges in {:.2?}",
                stop_reason,
                report.learned_merges,
                requested,
                report.elapsed
            ),
        }

        Ok((merges, report))
    }

    fn budget_exhausted(&self, merges_done: usize, start: Instant) -> bool {
        self.config
            .max_iterations
            .is_some_and(|max| merges_done >= max)
            || self
                .config
                .time_budget
                .is_some_and(|budget| start.elapsed() >= budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chunker::GPT2_SPLIT_PATTERN,
        types::{Token, TokenPair},
    };

    fn gpt2() -> Chunker {
        Chunker::new(GPT2_SPLIT_PATTERN).expect("pattern should compile")
    }

    fn train(text: &str, config: TrainerConfig) -> (Merges, TrainingReport) {
        Trainer::new(config)
            .train(text, &gpt2())
            .expect("training should succeed")
    }

    fn pairs(merges: &Merges) -> Vec<(Token, Token)> {
        merges.iter().map(|r| (r.pair.0, r.pair.1)).collect()
    }

    #[test]
    fn test_classic_aaabdaaabac() {
        let (merges, report) = train("aaabdaaabac", TrainerConfig::with_vocab_size(259));
        // (97, 98) and (256, 97) tie at two; the smaller pair wins
        assert_eq!(pairs(&merges), vec![(97, 97), (97, 98), (256, 257)]);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
        assert_eq!(report.learned_merges, 3);
    }

    #[test]
    fn test_merge_ids_are_sequential() {
        let (merges, _) = train(
            "the cat sat on the mat with the hat",
            TrainerConfig::with_vocab_size(270),
        );
        for (i, rule) in merges.iter().enumerate() {
            assert_eq!(rule.id, 256 + i);
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let text = "low lower lowest newer newest wider widest ".repeat(20);
        let (a, _) = train(&text, TrainerConfig::with_vocab_size(300));
        let (b, _) = train(&text, TrainerConfig::with_vocab_size(300));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_merge_crosses_chunk_boundary() {
        // chunks are "ab" and " ab": (98, 32) is never adjacent within a chunk
        let (merges, _) = train("ab ab ab", TrainerConfig::with_vocab_size(300));
        assert!(merges.get(&TokenPair(98, 32)).is_none());
    }

    #[test]
    fn test_stops_early_when_pairs_run_out() {
        let (merges, report) = train("ab", TrainerConfig::with_vocab_size(300));
        assert_eq!(pairs(&merges), vec![(97, 98)]);
        assert_eq!(report.stop_reason, StopReason::NoPairsLeft);
        assert_eq!(report.requested_merges, 44);
        assert_eq!(report.learned_merges, 1);
    }

    #[test]
    fn test_small_target_and_empty_text_learn_nothing() {
        let (merges, report) = train("some text here", TrainerConfig::with_vocab_size(256));
        assert!(merges.is_empty());
        assert_eq!(report.stop_reason, StopReason::TargetReached);

        let (merges, _) = train("some text", TrainerConfig::with_vocab_size(10));
        assert!(merges.is_empty());

        let (merges, report) = train("", TrainerConfig::with_vocab_size(300));
        assert!(merges.is_empty());
        assert_eq!(report.stop_reason, StopReason::NoPairsLeft);
    }

    #[test]
    fn test_iteration_budget() {
        let config = TrainerConfig {
            max_iterations: Some(2),
            ..TrainerConfig::with_vocab_size(300)
        };
        let (merges, report) = train("hello hello hello world world", config);
        assert_eq!(merges.len(), 2);
        assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    }

    #[test]
    fn test_budget_equal_to_target_reports_target() {
        let config = TrainerConfig {
            max_iterations: Some(1),
            ..TrainerConfig::with_vocab_size(257)
        };
        let (_, report) = train("hello hello", config);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
    }

    #[test]
    fn test_time_budget() {
        let config = TrainerConfig {
            time_budget: Some(Duration::ZERO),
            ..TrainerConfig::with_vocab_size(300)
        };
        let (merges, report) = train("hello hello hello", config);
        assert!(merges.is_empty());
        assert_eq!(report.stop_reason, StopReason::BudgetExhausted);
    }

    #[test]
    fn test_engine_states_and_duplicate_chunks() {
        let mut engine = MergeEngine::from_chunks(["ab", "ab", "c", "abc"], 5);
        assert_eq!(engine.state(), TrainingState::Running { iteration: 0 });
        // "c" can never merge
        assert_eq!(engine.words().len(), 2);

        let step = engine.step().expect("a pair is available");
        assert_eq!(step.rule, MergeRule { pair: TokenPair(97, 98), id: 256 });
        assert_eq!(step.freq, 3);
        assert_eq!(engine.state(), TrainingState::Running { iteration: 1 });

        assert_eq!(engine.run(), StopReason::NoPairsLeft);
        assert_eq!(engine.merges().len(), 2);
        assert!(engine.step().is_none());
    }

    #[test]
    fn test_halt_is_final() {
        let mut engine = MergeEngine::from_chunks(["abab"], 3);
        engine.halt(StopReason::BudgetExhausted);
        assert_eq!(engine.state(), TrainingState::Done(StopReason::BudgetExhausted));
        engine.halt(StopReason::NoPairsLeft);
        assert!(engine.step().is_none());
        assert_eq!(engine.state(), TrainingState::Done(StopReason::BudgetExhausted));
    }
}
