//! Ordered merge table and the sequential replacement pass.
//!
//! The table is an append-only log: entry `k` is the `k`-th merge learned and
//! carries id `256 + k`. Encoding correctness depends on replaying the entries
//! in exactly this order, so the `Vec` of rules is the source of truth and the
//! hash index is only a lookup aid.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{BpeError, MergeTableViolation, Result},
    types::{BASE_VOCAB_SIZE, MergeOrder, Token, TokenPair},
};

/// A single learned merge: `pair` is replaced by `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRule {
    /// The adjacent pair being merged.
    pub pair: TokenPair,
    /// The id assigned to the merged unit.
    pub token: Token,
}

/// Append-only, insertion-ordered merge table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeTable {
    /// Rules in learning order.
    rules: Vec<MergeRule>,

    /// pair -> (merged token, merge order).
    index: HashMap<TokenPair, (Token, MergeOrder)>,
}

impl MergeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from externally supplied merges, validating them.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::InvalidMergeTable`] if an entry does not carry the
    /// next sequential id, references a token that does not exist yet, or
    /// repeats an earlier pair.
    pub fn from_merges(
        merges: impl IntoIterator<Item = ((Token, Token), Token)>,
    ) -> Result<Self> {
        let mut table = Self::new();
        for (index, ((a, b), token)) in merges.into_iter().enumerate() {
            let pair = TokenPair(a, b);
            let expected = table.next_token();
            if token != expected {
                return Err(BpeError::InvalidMergeTable {
                    index,
                    reason: MergeTableViolation::NonSequentialId {
                        expected,
                        found: token,
                    },
                });
            }
            if let Some(missing) = [a, b].into_iter().find(|&t| t >= expected) {
                return Err(BpeError::InvalidMergeTable {
                    index,
                    reason: MergeTableViolation::UnknownComponent {
                        pair,
                        token: missing,
                    },
                });
            }
            if table.index.contains_key(&pair) {
                return Err(BpeError::InvalidMergeTable {
                    index,
                    reason: MergeTableViolation::DuplicatePair(pair),
                });
            }
            table.push(pair);
        }
        Ok(table)
    }

    /// Id the next recorded merge will receive.
    pub fn next_token(&self) -> Token {
        BASE_VOCAB_SIZE + self.rules.len()
    }

    /// Records `pair` as the next merge and returns its new id.
    ///
    /// Callers must not record a pair twice; training never selects a pair
    /// that has already been fully replaced.
    pub(crate) fn push(&mut self, pair: TokenPair) -> Token {
        let token = self.next_token();
        let order = self.rules.len();
        self.rules.push(MergeRule { pair, token });
        self.index.insert(pair, (token, order));
        token
    }

    /// Looks up the merged token and merge order for `pair`.
    pub fn get(&self, pair: &TokenPair) -> Option<(Token, MergeOrder)> {
        self.index.get(pair).copied()
    }

    /// Returns `true` if `pair` has a merge rule.
    pub fn contains(&self, pair: &TokenPair) -> bool {
        self.index.contains_key(pair)
    }

    /// Number of merges recorded.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no merges are recorded.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in learning order.
    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    /// Iterates `((first, second), token)` in learning order.
    pub fn iter(&self) -> impl Iterator<Item = ((Token, Token), Token)> + '_ {
        self.rules
            .iter()
            .map(|rule| ((rule.pair.0, rule.pair.1), rule.token))
    }

    /// Replays every rule, in learning order, over `tokens`.
    ///
    /// One full left-to-right pass per rule. This is the reference encoding;
    /// [`crate::BPEConverter::encode`] produces the same result faster.
    pub fn apply(&self, tokens: &[Token]) -> Vec<Token> {
        apply_merges(tokens, &self.rules)
    }
}

/// Replays `rules` over `tokens` in the order given.
///
/// The order is not checked; passing rules out of learning order yields a
/// different (and for encoding, wrong) sequence.
pub fn apply_merges<'a>(
    tokens: &[Token],
    rules: impl IntoIterator<Item = &'a MergeRule>,
) -> Vec<Token> {
    let mut current = tokens.to_vec();
    for rule in rules {
        if current.len() < 2 {
            break;
        }
        current = replace_pair(&current, rule.pair, rule.token);
    }
    current
}

/// Replaces every non-overlapping occurrence of `pair` with `new_token`.
///
/// Scans left to right and consumes greedily: with `pair = (a, a)`,
/// `[a, a, a]` becomes `[new, a]`. The freshly inserted token is never
/// rescanned in the same pass.
pub fn replace_pair(tokens: &[Token], pair: TokenPair, new_token: Token) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len() && tokens[i] == pair.0 && tokens[i + 1] == pair.1 {
            out.push(new_token);
            i += 2;
        } else {
            out.push(tokens[i]);
            i += 1;
        }
    }
    out
}
