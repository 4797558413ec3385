//! Type aliases and shared types for BPE training and encoding.
//!
//! These type aliases provide semantic clarity throughout the codebase.

/// Represents a token identifier in the vocabulary.
///
/// Ids 0-255 are the raw byte values. Every learned merge gets the next
/// id starting at [`FIRST_MERGE_ID`].
pub type Token = usize;

/// Frequency count for token pairs during training.
pub type TokenFreq = usize;

/// A sequence of raw bytes.
pub type ByteSeq = Vec<u8>;

/// Number of reserved byte-level token ids.
pub const BYTE_VOCAB_SIZE: usize = 256;

/// Id assigned to the first learned merge.
pub const FIRST_MERGE_ID: Token = BYTE_VOCAB_SIZE;

/// A pair of adjacent tokens.
///
/// Used as a key for looking up merge rules during encoding and for
/// tracking pair frequencies during training. Ordering is by left id, then
/// right id; training uses it to break frequency ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenPair(pub Token, pub Token);

impl std::fmt::Display for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_ordering_is_left_then_right() {
        assert!(TokenPair(97, 300) < TokenPair(256, 0));
        assert!(TokenPair(97, 98) < TokenPair(97, 99));
        assert_eq!(TokenPair(1, 2).max(TokenPair(1, 3)), TokenPair(1, 3));
    }
}
