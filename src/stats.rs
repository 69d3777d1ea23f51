//! Pair statistics over a token sequence.
//!
//! Counting is a pure function of the sequence. Selection of the pair to
//! merge next is done through [`PairRank`], whose ordering fixes the
//! tie-break so the result never depends on hash-map iteration order.

use std::{cmp::Ordering, collections::HashMap};

use crate::types::{Token, TokenFreq, TokenPair};

/// Counts every adjacent pair `(seq[i], seq[i + 1])`.
///
/// Overlapping occurrences are all counted: `[a, a, a]` yields `(a, a) -> 2`.
/// Sequences shorter than two units yield an empty map.
///
/// # Time Complexity
///
/// O(N) time, O(distinct pairs) space.
pub fn pair_counts(tokens: &[Token]) -> HashMap<TokenPair, TokenFreq> {
    let mut counts = HashMap::new();
    for window in tokens.windows(2) {
        *counts.entry(TokenPair(window[0], window[1])).or_insert(0) += 1;
    }
    counts
}

/// Candidate for the next merge, ranked by frequency.
///
/// Higher frequency ranks higher. Among equal frequencies the
/// lexicographically *smaller* pair ranks higher, so `max()` over ranks is
/// the selection rule used by training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRank {
    /// Frequency count of this token pair.
    pub freq: TokenFreq,

    /// The token pair being ranked.
    pub pair: TokenPair,
}

impl PartialOrd for PairRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PairRank {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed pair comparison: smaller pair wins a frequency tie.
        self.freq
            .cmp(&other.freq)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

/// Selects the pair to merge next.
///
/// Returns the pair with the strictly highest count, breaking ties by the
/// smallest `(first, second)`. `None` when `counts` is empty.
pub fn most_frequent(counts: &HashMap<TokenPair, TokenFreq>) -> Option<PairRank> {
    counts
        .iter()
        .map(|(&pair, &freq)| PairRank { freq, pair })
        .max()
}
