//! BPE Converter - token encoding and decoding with a learned merge table.
//!
//! Encoding applies merges in the order they were learned during training.
//! Instead of one full pass per merge rule, a priority queue keyed by
//! (merge order, position) visits only the pairs that can actually merge,
//! which gives the same result as replaying the table rule by rule.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    error::Result,
    merges::MergeTable,
    types::{ByteSeq, MergeOrder, Token, TokenPair},
    vocab::Vocabulary,
};

/// Item in the priority queue for merge ordering.
///
/// Candidates are ordered by merge_order (earliest first) with position
/// as a tiebreaker. This ensures we apply merges in the correct training order.
#[derive(Debug, PartialEq, Eq)]
struct MergeCandidate {
    /// Merge order from training (0 = first merge, 1 = second merge, etc.).
    ///
    /// Lower values have higher priority and will be applied first.
    merge_order: MergeOrder,

    /// The token pair to be merged.
    pair: TokenPair,

    /// Position in the token sequence where this pair starts.
    ///
    /// Earlier positions win, which makes overlapping occurrences resolve
    /// greedily from the left.
    position: usize,
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // We reverse the comparison (other vs self) to create min-heap behavior
        // from Rust's max-heap BinaryHeap.
        other
            .merge_order
            .cmp(&self.merge_order)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Read-only trained artifact: merge table plus the vocabulary it implies.
///
/// # Time Complexity
///
/// Encoding is O(N log N) where N is the input token sequence length.
///
/// # Example
///
/// ```
/// use bytebpe::{BPEConverter, MergeTable};
///
/// let table = MergeTable::from_merges(vec![((97, 98), 256), ((256, 97), 257)]).unwrap();
/// let converter = BPEConverter::new(table).unwrap();
/// assert_eq!(converter.encode(vec![97, 98, 97]), vec![257]);
/// assert_eq!(converter.decode(&[257]).unwrap(), b"aba".to_vec());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BPEConverter {
    /// Ordered merge rules with pair -> (merged_token, merge_order) lookup.
    merges: MergeTable,

    /// Maps token IDs to their byte sequences.
    vocab: Vocabulary,
}

impl BPEConverter {
    /// Creates a converter from a merge table, rebuilding the vocabulary by
    /// replaying the merges over the 256 base bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BpeError::UnknownToken`] if a rule references an id
    /// that does not exist at that point of the table. Tables built with
    /// [`MergeTable::from_merges`] are already validated and never fail here.
    pub fn new(merges: MergeTable) -> Result<Self> {
        let mut vocab = Vocabulary::new();
        for rule in merges.rules() {
            vocab.push_merge(rule.pair)?;
        }
        Ok(Self { merges, vocab })
    }

    /// Wraps a table and the vocabulary training grew alongside it.
    pub(crate) fn from_parts(merges: MergeTable, vocab: Vocabulary) -> Self {
        debug_assert_eq!(vocab.len(), crate::BASE_VOCAB_SIZE + merges.len());
        Self { merges, vocab }
    }

    /// Encodes a token sequence by applying learned BPE merge rules.
    ///
    /// Merges are applied in the order they were learned during training,
    /// using a priority queue to efficiently find and apply the next merge.
    ///
    /// # Returns
    ///
    /// A new token sequence with all applicable merge rules applied.
    /// The output will have the same or fewer tokens than the input.
    pub fn encode(&self, tokens: Vec<Token>) -> Vec<Token> {
        if tokens.len() <= 1 || self.merges.is_empty() {
            return tokens;
        }

        let mut heap = BinaryHeap::new();

        // results[pos] = Some(token) | None
        // None indicates consumed by prev merge
        let mut results: Vec<Option<Token>> = tokens.iter().map(|&t| Some(t)).collect();

        self.initialize_minheap(&tokens, &mut heap);

        // process merges in training order (lowest merge_order first)
        while let Some(candidate) = heap.pop() {
            let pos = candidate.position;

            // the left token could be a normal token or a merged token
            let Some(left) = results.get(pos).copied().flatten() else {
                continue;
            };
            // if the left token is a merged token, pos+1 is None;
            // skip to the closest live token on the right
            let mut right_idx = pos + 1;
            while right_idx < results.len() && matches!(results.get(right_idx), Some(None)) {
                right_idx += 1;
            }
            let Some(right) = results.get(right_idx).copied().flatten() else {
                continue;
            };

            // stale candidate
            if candidate.pair != TokenPair(left, right) {
                continue;
            }

            let Some((merge_tok, _order)) = self.merges.get(&candidate.pair) else {
                continue;
            };

            results[pos] = Some(merge_tok);
            results[right_idx] = None;

            self.track_new_merge_candidate(&mut heap, &results, pos, merge_tok, true);
            self.track_new_merge_candidate(&mut heap, &results, pos, merge_tok, false);
        }

        results.into_iter().flatten().collect()
    }

    /// Adds new merge candidates to the priority queue after a successful merge.
    ///
    /// After merging two tokens, the new merged token may form mergeable pairs
    /// with its left and right neighbors.
    ///
    /// # Arguments
    ///
    /// * `heap` - The priority queue to add candidates to.
    /// * `results` - Current token sequence with merged positions marked as None.
    /// * `pos` - Position of the newly merged token.
    /// * `merged_tok` - The token ID of the newly merged token.
    /// * `check_left` - If true, checks left neighbor; otherwise checks right neighbor.
    fn track_new_merge_candidate(
        &self,
        heap: &mut BinaryHeap<MergeCandidate>,
        results: &[Option<Token>],
        pos: usize,
        merged_tok: Token,
        check_left: bool,
    ) {
        let n = results.len();

        let idx = if check_left {
            if pos == 0 {
                return;
            }
            let mut idx = pos - 1;
            while idx > 0 && matches!(results.get(idx), Some(None)) {
                idx -= 1;
            }
            idx
        } else {
            let mut idx = pos + 1;
            while idx < n && matches!(results.get(idx), Some(None)) {
                idx += 1;
            }
            idx
        };

        let Some(&Some(tok)) = results.get(idx) else {
            return;
        };

        let pair = if check_left {
            TokenPair(tok, merged_tok)
        } else {
            TokenPair(merged_tok, tok)
        };

        if let Some((_merge_tok, merge_order)) = self.merges.get(&pair) {
            let position = if check_left { idx } else { pos };
            heap.push(MergeCandidate {
                merge_order,
                pair,
                position,
            });
        }
    }

    /// Populates the priority queue with all initial mergeable pairs.
    fn initialize_minheap(&self, tokens: &[Token], heap: &mut BinaryHeap<MergeCandidate>) {
        for (i, window) in tokens.windows(2).enumerate() {
            let pair = TokenPair(window[0], window[1]);
            if let Some((_, merge_order)) = self.merges.get(&pair) {
                heap.push(MergeCandidate {
                    merge_order,
                    pair,
                    position: i,
                });
            }
        }
    }

    /// Checks if a token pair can be merged according to learned rules.
    pub fn can_merge(&self, left: Token, right: Token) -> bool {
        self.merges.contains(&TokenPair(left, right))
    }

    /// Returns the total number of merge rules in this converter.
    pub fn num_merges(&self) -> usize {
        self.merges.len()
    }

    /// The ordered merge table.
    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    /// Returns a reference to the vocabulary.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Decodes a token sequence back into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BpeError::UnknownToken`] if any token ID is not in the
    /// vocabulary.
    pub fn decode(&self, tokens: &[Token]) -> Result<ByteSeq> {
        self.vocab.decode(tokens)
    }
}
