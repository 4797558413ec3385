//! Vocabulary derived from the merge sequence.

use crate::{
    merges::Merges,
    types::{BYTE_VOCAB_SIZE, ByteSeq, Token},
};

/// Maps every token id to the bytes it stands for.
///
/// - `vocab[0..256]`: base vocabulary (single bytes)
/// - `vocab[256..]`: merged tokens (concatenated byte sequences)
///
/// It is always rebuilt from a [`Merges`] sequence and never edited on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<ByteSeq>,
}

impl Vocabulary {
    /// Builds the vocabulary from merges, strictly in merge order.
    ///
    /// [`Merges`] guarantees both constituents of every rule already exist,
    /// so each entry can be concatenated from earlier entries.
    pub fn build(merges: &Merges) -> Self {
        let mut tokens: Vec<ByteSeq> = Vec::with_capacity(BYTE_VOCAB_SIZE + merges.len());
        tokens.extend((0..=u8::MAX).map(|b| vec![b]));

        for rule in merges {
            let mut merged = tokens[rule.pair.0].clone();
            merged.extend_from_slice(&tokens[rule.pair.1]);
            debug_assert_eq!(tokens.len(), rule.id);
            tokens.push(merged);
        }

        Self { tokens }
    }

    /// Bytes of `id`, or `None` for an id outside the vocabulary.
    #[inline]
    pub fn get(&self, id: Token) -> Option<&[u8]> {
        self.tokens.get(id).map(Vec::as_slice)
    }

    /// Iterates `(id, bytes)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, &[u8])> {
        self.tokens.iter().enumerate().map(|(id, b)| (id, b.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenPair;

    fn merges(pairs: &[(Token, Token)]) -> Merges {
        Merges::from_pairs(pairs.iter().map(|&(a, b)| TokenPair(a, b))).expect("valid merges")
    }

    #[test]
    fn test_base_vocabulary_is_single_bytes() {
        let vocab = Vocabulary::build(&Merges::new());
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get(0), Some(&[0u8][..]));
        assert_eq!(vocab.get(97), Some(&b"a"[..]));
        assert_eq!(vocab.get(255), Some(&[255u8][..]));
        assert_eq!(vocab.get(256), None);
    }

    #[test]
    fn test_nested_merges_concatenate() {
        let vocab = Vocabulary::build(&merges(&[(97, 98), (256, 99), (257, 257)]));
        assert_eq!(vocab.len(), 259);
        assert_eq!(vocab.get(256), Some(&b"ab"[..]));
        assert_eq!(vocab.get(257), Some(&b"abc"[..]));
        assert_eq!(vocab.get(258), Some(&b"abcabc"[..]));
    }

    #[test]
    fn test_iter_yields_every_id_once_in_order() {
        let vocab = Vocabulary::build(&merges(&[(104, 105)]));
        let ids: Vec<Token> = vocab.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, (0..257).collect::<Vec<_>>());
    }
}
