//! Adjacent pair statistics.
//!
//! Counting is addition, so partial counts from rayon workers can be
//! combined in any order and still give the same aggregate as a sequential
//! pass. The tie-break in [`best_pair`] only ever looks at the aggregate.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::types::{Token, TokenFreq, TokenPair};

/// Pair → total number of occurrences.
pub type PairCounts = HashMap<TokenPair, TokenFreq>;

/// A chunk's ids together with how many times that exact chunk occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub ids: Vec<Token>,
    pub count: TokenFreq,
}

impl Word {
    pub fn new(ids: Vec<Token>, count: TokenFreq) -> Self {
        Self { ids, count }
    }
}

/// Adds every adjacent pair of `ids` to `counts`, each weighted by `weight`.
///
/// Sequences shorter than two ids contribute nothing.
#[inline]
pub fn count_pairs_into(ids: &[Token], weight: TokenFreq, counts: &mut PairCounts) {
    for window in ids.windows(2) {
        *counts.entry(TokenPair(window[0], window[1])).or_insert(0) += weight;
    }
}

/// Sequential pair counts over independent chunks.
pub fn pair_counts<S: AsRef<[Token]>>(chunks: &[S]) -> PairCounts {
    let mut counts = PairCounts::new();
    for chunk in chunks {
        count_pairs_into(chunk.as_ref(), 1, &mut counts);
    }
    counts
}

/// Parallel pair counts over independent chunks.
pub fn par_pair_counts<S: AsRef<[Token]> + Sync>(chunks: &[S]) -> PairCounts {
    chunks
        .par_iter()
        .fold(PairCounts::new, |mut acc, chunk| {
            count_pairs_into(chunk.as_ref(), 1, &mut acc);
            acc
        })
        .reduce(PairCounts::new, merge_counts)
}

/// Parallel pair counts over weighted words.
pub fn word_pair_counts(words: &[Word]) -> PairCounts {
    words
        .par_iter()
        .fold(PairCounts::new, |mut acc, word| {
            count_pairs_into(&word.ids, word.count, &mut acc);
            acc
        })
        .reduce(PairCounts::new, merge_counts)
}

/// Picks the most frequent pair.
///
/// Among pairs tied for the highest count the smallest one (left id, then
/// right id) wins, so the choice never depends on map iteration order.
pub fn best_pair(counts: &PairCounts) -> Option<(TokenPair, TokenFreq)> {
    counts
        .iter()
        .max_by(|(pa, fa), (pb, fb)| fa.cmp(fb).then_with(|| pb.cmp(pa)))
        .map(|(&pair, &freq)| (pair, freq))
}

fn merge_counts(a: PairCounts, b: PairCounts) -> PairCounts {
    // fold the smaller map into the larger one
    let (mut into, from) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (pair, freq) in from {
        *into.entry(pair).or_insert(0) += freq;
    }
    into
}
