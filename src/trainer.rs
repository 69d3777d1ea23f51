//! Core BPE training loop.
//!
//! Each step recounts adjacent pairs over the working sequence, merges the
//! most frequent one (ties go to the smallest pair), records it, and rewrites
//! the sequence into a fresh buffer.
//!
//! Time complexity: O(N * M) for N input bytes and M merges.

use indicatif::ProgressBar;

use crate::{
    error::Result,
    merges::{MergeTable, replace_pair},
    stats::{PairRank, most_frequent, pair_counts},
    types::{Token, TokenFreq, TokenPair},
    vocab::Vocabulary,
};

/// Outcome of one merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeStep {
    /// The pair that was merged.
    pub(crate) pair: TokenPair,
    /// Its frequency before the merge.
    pub(crate) freq: TokenFreq,
    /// The id assigned to it.
    pub(crate) token: Token,
}

/// Everything a finished training run produced.
#[derive(Debug)]
pub(crate) struct TrainedParts {
    pub(crate) merges: MergeTable,
    pub(crate) vocab: Vocabulary,
    pub(crate) encoded: Vec<Token>,
}

/// BPE training structure.
///
/// Owns the working sequence together with the merge table and vocabulary
/// being grown. Nothing here is visible to a [`crate::BPEModel`] until
/// [`BPETrainer::into_parts`] hands it over, so an interrupted run never
/// leaks a half-built model.
#[derive(Debug, Default)]
pub(crate) struct BPETrainer {
    /// Working sequence.
    tokens: Vec<Token>,

    /// Merges learned so far, in order.
    merges: MergeTable,

    /// Expansion of every id learned so far.
    vocab: Vocabulary,

    /// Merges between progress log lines; `0` disables them.
    log_every: usize,
}

impl BPETrainer {
    /// Create a new BPE trainer from an initial byte-level token sequence.
    ///
    /// # Arguments
    /// * `tokens` - Initial sequence of tokens (bytes 0-255)
    /// * `log_every` - Merges between progress log lines
    pub(crate) fn new(tokens: Vec<Token>, log_every: usize) -> Self {
        BPETrainer {
            tokens,
            merges: MergeTable::new(),
            vocab: Vocabulary::new(),
            log_every,
        }
    }

    /// Perform one merge operation.
    ///
    /// Returns `Ok(None)` if no pairs remain.
    pub(crate) fn merge_step(&mut self) -> Result<Option<MergeStep>> {
        let stats = pair_counts(&self.tokens);
        let Some(PairRank { pair, freq }) = most_frequent(&stats) else {
            return Ok(None);
        };

        let token = self.vocab.push_merge(pair)?;
        let recorded = self.merges.push(pair);
        debug_assert_eq!(token, recorded);

        self.tokens = replace_pair(&self.tokens, pair, token);

        Ok(Some(MergeStep { pair, freq, token }))
    }

    /// Train BPE with up to `num_merges` merges.
    ///
    /// Stops early, without error, once the working sequence has no pair left.
    /// Returns the number of merges performed.
    pub(crate) fn train(&mut self, num_merges: usize, pb: &ProgressBar) -> Result<usize> {
        log::info!(
            "Starting BPE training: {} merges over {} bytes",
            num_merges,
            self.tokens.len()
        );

        if log::log_enabled!(log::Level::Debug) {
            for rank in self.top_pairs(5) {
                log::debug!("  ({}, {}) : {}", rank.pair.0, rank.pair.1, rank.freq);
            }
        }

        let mut done = 0;
        while done < num_merges {
            let Some(step) = self.merge_step()? else {
                log::debug!("No more pairs to merge after {} merges", done);
                break;
            };
            done += 1;
            pb.inc(1);

            if self.log_every > 0 && done % self.log_every == 0 {
                log::info!(
                    "Merge {}/{}: ({}, {}) -> {} (freq: {}), vocab size {}",
                    done,
                    num_merges,
                    step.pair.0,
                    step.pair.1,
                    step.token,
                    step.freq,
                    self.vocab.len()
                );
            }
        }
        pb.finish_and_clear();

        log::info!(
            "Finished BPE training: {} merges, {} tokens remain",
            done,
            self.tokens.len()
        );
        Ok(done)
    }

    /// The `n` pairs that would be merged next, best first.
    pub(crate) fn top_pairs(&self, n: usize) -> Vec<PairRank> {
        let mut ranks: Vec<PairRank> = pair_counts(&self.tokens)
            .into_iter()
            .map(|(pair, freq)| PairRank { freq, pair })
            .collect();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        ranks.truncate(n);
        ranks
    }

    /// Consumes the trainer, yielding the learned table, vocabulary and
    /// encoded training sequence.
    pub(crate) fn into_parts(self) -> TrainedParts {
        TrainedParts {
            merges: self.merges,
            vocab: self.vocab,
            encoded: self.tokens,
        }
    }
}
