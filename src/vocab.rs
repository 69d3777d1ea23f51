//! Vocabulary: unit id -> the bytes it expands to.

use crate::{
    error::{BpeError, Result},
    types::{BASE_VOCAB_SIZE, ByteSeq, Token, TokenPair},
};

/// Maps token IDs to their byte sequences.
///
/// - `entries[0..256]`: base vocabulary (single bytes)
/// - `entries[256..]`: merged tokens (concatenated byte sequences)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<ByteSeq>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Creates the byte-only vocabulary (ids 0-255).
    pub fn new() -> Self {
        let entries = (0..BASE_VOCAB_SIZE).map(|b| vec![b as u8]).collect();
        Self { entries }
    }

    /// Appends the expansion of `pair` as the next id and returns that id.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::UnknownToken`] if either side of the pair has no entry.
    pub fn push_merge(&mut self, pair: TokenPair) -> Result<Token> {
        let left = self.get(pair.0).ok_or(BpeError::UnknownToken(pair.0))?;
        let right = self.get(pair.1).ok_or(BpeError::UnknownToken(pair.1))?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        merged.extend_from_slice(left);
        merged.extend_from_slice(right);

        let token = self.entries.len();
        self.entries.push(merged);
        Ok(token)
    }

    /// Byte expansion of `token`, if it exists.
    pub fn get(&self, token: Token) -> Option<&[u8]> {
        self.entries.get(token).map(Vec::as_slice)
    }

    /// Number of entries, base bytes included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the base bytes are always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All expansions indexed by id.
    pub fn entries(&self) -> &[ByteSeq] {
        &self.entries
    }

    /// Concatenates the expansions of `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::UnknownToken`] for the first id with no entry.
    pub fn decode(&self, tokens: &[Token]) -> Result<ByteSeq> {
        let mut result = Vec::with_capacity(tokens.len() * 2);
        for &token in tokens {
            let bytes = self.get(token).ok_or(BpeError::UnknownToken(token))?;
            result.extend_from_slice(bytes);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_vocab() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.len(), 256);
        assert_eq!(vocab.get(97), Some(&b"a"[..]));
        assert_eq!(vocab.get(255), Some(&[255u8][..]));
        assert_eq!(vocab.get(256), None);
    }

    #[test]
    fn test_push_merge_concatenates() {
        let mut vocab = Vocabulary::new();
        let ab = vocab.push_merge(TokenPair(97, 98)).expect("known pair");
        let abc = vocab.push_merge(TokenPair(ab, 99)).expect("known pair");
        assert_eq!((ab, abc), (256, 257));
        assert_eq!(vocab.get(abc), Some(&b"abc"[..]));
        assert_eq!(vocab.len(), 258);
    }

    #[test]
    fn test_push_merge_unknown_component() {
        let mut vocab = Vocabulary::new();
        assert!(matches!(
            vocab.push_merge(TokenPair(97, 400)),
            Err(BpeError::UnknownToken(400))
        ));
        assert_eq!(vocab.len(), 256);
    }

    #[test]
    fn test_decode() {
        let mut vocab = Vocabulary::new();
        vocab.push_merge(TokenPair(97, 98)).expect("known pair");
        assert_eq!(vocab.decode(&[256, 99]).expect("decodable"), b"abc".to_vec());
        assert!(matches!(vocab.decode(&[97, 999]), Err(BpeError::UnknownToken(999))));
    }
}
