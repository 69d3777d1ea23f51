//! Type aliases and shared types for BPE training and encoding.
//!
//! These type aliases provide semantic clarity throughout the codebase.

use serde::{Deserialize, Serialize};

/// Represents a unit identifier in the vocabulary.
///
/// Ids `0..=255` are raw byte values. Ids from [`BASE_VOCAB_SIZE`] upwards are
/// assigned sequentially, one per learned merge.
pub type Token = usize;

/// Frequency count for token pairs during training.
pub type TokenFreq = usize;

/// Merge order indicates when a merge rule was learned during training.
///
/// Lower values represent earlier merges (e.g., 0 = first merge, 1 = second merge).
pub type MergeOrder = usize;

/// A sequence of raw bytes.
pub type ByteSeq = Vec<u8>;

/// Number of base units: one per byte value.
pub const BASE_VOCAB_SIZE: usize = 256;

/// A pair of adjacent tokens.
///
/// Used as a key for looking up merge rules during encoding and for
/// tracking pair frequencies during training.
///
/// The derived ordering is lexicographic on `(first, second)`, which is the
/// order used to break frequency ties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TokenPair(pub Token, pub Token);

impl TokenPair {
    /// Left unit of the pair.
    pub fn first(&self) -> Token {
        self.0
    }

    /// Right unit of the pair.
    pub fn second(&self) -> Token {
        self.1
    }
}

impl From<(Token, Token)> for TokenPair {
    fn from((a, b): (Token, Token)) -> Self {
        TokenPair(a, b)
    }
}

/// Converts UTF-8 text into its initial unit sequence, one id per byte.
pub(crate) fn byte_tokens(text: &str) -> Vec<Token> {
    text.bytes().map(|b| b as Token).collect()
}
