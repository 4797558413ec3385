//! The ordered merge sequence and the merge-rewrite step.

use std::{collections::HashMap, fmt};

use crate::types::{FIRST_MERGE_ID, Token, TokenPair};

/// One learned rule: `pair` is replaced by `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRule {
    pub pair: TokenPair,
    pub id: Token,
}

/// Reasons a pair cannot be appended to a [`Merges`] sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRejection {
    /// A constituent id does not exist yet.
    ForwardReference { pair: TokenPair, next_id: Token },
    /// The pair already has a rule.
    Duplicate { pair: TokenPair, existing: Token },
}

impl fmt::Display for MergeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForwardReference { pair, next_id } => {
                write!(f, "merge {pair} references an id not below {next_id}")
            }
            Self::Duplicate { pair, existing } => {
                write!(f, "merge {pair} already defined as token {existing}")
            }
        }
    }
}

/// Merge rules in the order they were learned.
///
/// The order is the encoding priority: the rule at position `i` has id
/// `256 + i`, and an earlier rule always wins over a later one. The pair
/// lookup is only an index over the sequence, never the source of order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merges {
    rules: Vec<MergeRule>,
    ids: HashMap<TokenPair, Token>,
}

impl Merges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from pairs in priority order.
    ///
    /// # Errors
    ///
    /// Returns the first [`MergeRejection`] together with the index of the
    /// offending pair.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = TokenPair>,
    ) -> Result<Self, (usize, MergeRejection)> {
        let mut merges = Self::new();
        for (i, pair) in pairs.into_iter().enumerate() {
            merges.push(pair).map_err(|e| (i, e))?;
        }
        Ok(merges)
    }

    /// Appends `pair`, assigning it the next id.
    ///
    /// # Errors
    ///
    /// Rejects pairs that reference an id that does not exist yet and pairs
    /// that already have a rule.
    pub fn push(&mut self, pair: TokenPair) -> Result<Token, MergeRejection> {
        let next_id = self.next_id();
        if pair.0 >= next_id || pair.1 >= next_id {
            return Err(MergeRejection::ForwardReference { pair, next_id });
        }
        if let Some(&existing) = self.ids.get(&pair) {
            return Err(MergeRejection::Duplicate { pair, existing });
        }

        self.ids.insert(pair, next_id);
        self.rules.push(MergeRule { pair, id: next_id });
        Ok(next_id)
    }

    /// Id the next appended rule will get.
    pub fn next_id(&self) -> Token {
        FIRST_MERGE_ID + self.rules.len()
    }

    /// Id assigned to `pair`, if it was learned.
    #[inline]
    pub fn get(&self, pair: &TokenPair) -> Option<Token> {
        self.ids.get(pair).copied()
    }

    /// Rule that produced `id`, if `id` is a merge id.
    pub fn rule(&self, id: Token) -> Option<&MergeRule> {
        id.checked_sub(FIRST_MERGE_ID)
            .and_then(|idx| self.rules.get(idx))
    }

    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergeRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a Merges {
    type Item = &'a MergeRule;
    type IntoIter = std::slice::Iter<'a, MergeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Replaces every non-overlapping occurrence of `pair` in `ids` with
/// `new_id`, scanning left to right.
///
/// A match needs an actual next element, so the last id of a chunk is never
/// paired with anything.
pub fn merge_pair(ids: &[Token], pair: TokenPair, new_id: Token) -> Vec<Token> {
    let n = ids.len();
    let mut out = Vec::with_capacity(n);
    let mut i = 0;

    while i < n {
        if i + 1 < n && ids[i] == pair.0 && ids[i + 1] == pair.1 {
            out.push(new_id);
            i += 2;
        } else {
            out.push(ids[i]);
            i += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let merges = Merges::from_pairs([TokenPair(97, 97), TokenPair(97, 98), TokenPair(256, 257)])
            .expect("valid merges");
        let ids: Vec<Token> = merges.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![256, 257, 258]);
        assert_eq!(merges.get(&TokenPair(97, 98)), Some(257));
        assert_eq!(merges.rule(258).map(|r| r.pair), Some(TokenPair(256, 257)));
        assert_eq!(merges.rule(97), None);
        assert_eq!(merges.next_id(), 259);
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let result = Merges::from_pairs([TokenPair(97, 98), TokenPair(257, 1)]);
        assert_eq!(
            result,
            Err((
                1,
                MergeRejection::ForwardReference {
                    pair: TokenPair(257, 1),
                    next_id: 257
                }
            ))
        );
    }

    #[test]
    fn test_duplicate_pair_is_rejected() {
        let mut merges = Merges::new();
        assert_eq!(merges.push(TokenPair(1, 2)), Ok(256));
        assert_eq!(
            merges.push(TokenPair(1, 2)),
            Err(MergeRejection::Duplicate {
                pair: TokenPair(1, 2),
                existing: 256
            })
        );
        assert_eq!(merges.len(), 1);
    }

    #[test]
    fn test_merge_pair_non_overlapping_left_to_right() {
        assert_eq!(merge_pair(&[97, 97, 97], TokenPair(97, 97), 256), vec![256, 97]);
        assert_eq!(
            merge_pair(&[97, 97, 97, 97], TokenPair(97, 97), 256),
            vec![256, 256]
        );
    }

    #[test]
    fn test_merge_pair_never_matches_past_the_end() {
        // trailing left id with no right neighbour stays as is
        assert_eq!(merge_pair(&[1, 2, 1], TokenPair(1, 2), 9), vec![9, 1]);
        assert_eq!(merge_pair(&[1], TokenPair(1, 1), 9), vec![1]);
        assert!(merge_pair(&[], TokenPair(1, 1), 9).is_empty());
    }
}
