//! BPE encoding of a single chunk with learned merge rules.
//!
//! The pair to merge next is always the one learned earliest among the pairs
//! currently present in the chunk. Training counted pairs in exactly that
//! order, so any other policy (leftmost, longest) gives ids that do not
//! match the model.

use crate::{
    merges::{Merges, merge_pair},
    types::{Token, TokenPair},
};

/// Applies merges from a [`Merges`] sequence to byte-level id sequences.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'m> {
    merges: &'m Merges,
}

impl<'m> Encoder<'m> {
    pub fn new(merges: &'m Merges) -> Self {
        Self { merges }
    }

    /// Encodes one chunk's ids.
    ///
    /// Repeatedly finds the present pair with the smallest merge id and
    /// rewrites the whole chunk with it, until no present pair is a merge.
    ///
    /// # Example
    ///
    /// ```
    /// use minbpe::{Encoder, Merges, TokenPair};
    ///
    /// let merges = Merges::from_pairs([TokenPair(97, 98), TokenPair(256, 99)]).unwrap();
    /// let ids = Encoder::new(&merges).encode_chunk(vec![97, 98, 99, 97]);
    /// assert_eq!(ids, vec![257, 97]);
    /// ```
    pub fn encode_chunk(&self, mut ids: Vec<Token>) -> Vec<Token> {
        while ids.len() >= 2 {
            let Some((pair, new_id)) = self.earliest_merge(&ids) else {
                break;
            };
            ids = merge_pair(&ids, pair, new_id);
        }
        ids
    }

    /// Present pair with the lowest merge id.
    fn earliest_merge(&self, ids: &[Token]) -> Option<(TokenPair, Token)> {
        ids.windows(2)
            .filter_map(|w| {
                let pair = TokenPair(w[0], w[1]);
                self.merges.get(&pair).map(|id| (pair, id))
            })
            .min_by_key(|&(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merges(pairs: &[(Token, Token)]) -> Merges {
        Merges::from_pairs(pairs.iter().map(|&(a, b)| TokenPair(a, b))).expect("valid merges")
    }

    #[test]
    fn test_basic_encoding() {
        let m = merges(&[(0, 1), (256, 0)]);
        assert_eq!(Encoder::new(&m).encode_chunk(vec![0, 1, 0]), vec![257]);
    }

    #[test]
    fn test_single_token_no_change() {
        let m = merges(&[(0, 1)]);
        assert_eq!(Encoder::new(&m).encode_chunk(vec![7]), vec![7]);
        assert!(Encoder::new(&m).encode_chunk(vec![]).is_empty());
    }

    #[test]
    fn test_no_merge_rules_apply() {
        let m = merges(&[(5, 6)]);
        assert_eq!(
            Encoder::new(&m).encode_chunk(vec![0, 1, 2, 3]),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_earlier_merge_wins_over_leftmost() {
        // (1, 2) is learned first, so it beats the leftmost pair (0, 1)
        let m = merges(&[(1, 2), (0, 1)]);
        assert_eq!(Encoder::new(&m).encode_chunk(vec![0, 1, 2]), vec![0, 256]);
    }

    #[test]
    fn test_merges_build_on_each_other() {
        let m = merges(&[(0, 1), (2, 3), (256, 257)]);
        assert_eq!(Encoder::new(&m).encode_chunk(vec![0, 1, 2, 3]), vec![258]);
    }

    #[test]
    fn test_repeated_pair_is_merged_everywhere() {
        let m = merges(&[(0, 0), (1, 1)]);
        assert_eq!(
            Encoder::new(&m).encode_chunk(vec![0, 0, 1, 1, 0, 0]),
            vec![256, 257, 256]
        );
    }

    #[test]
    fn test_overlapping_run_merges_left_to_right() {
        let m = merges(&[(97, 97)]);
        assert_eq!(
            Encoder::new(&m).encode_chunk(vec![97, 97, 97]),
            vec![256, 97]
        );
    }
}
