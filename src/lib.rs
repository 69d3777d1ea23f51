//! Byte-level Byte Pair Encoding.
//!
//! Training learns an ordered merge table from the UTF-8 bytes of a text:
//! every step counts adjacent pairs, merges the most frequent one (ties go to
//! the smallest `(first, second)` pair) into the next id from 256 upwards, and
//! rewrites the sequence. Encoding replays that table, in learned order, over
//! new text; decoding concatenates each id's bytes.
//!
//! Text normalization, if any, is the caller's job and happens before text
//! reaches [`BPEModel::train`] or [`BPEModel::encode`].
//!
//! With the `python` feature the crate also builds a PyO3 extension module.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod config;
mod converter;
mod error;
mod io;
mod merges;
mod model;
mod progress;
mod stats;
mod trainer;
mod types;
mod vocab;

#[cfg(feature = "python")]
mod python;

pub use config::{BpeConfig, DEFAULT_LOG_EVERY};
pub use converter::BPEConverter;
pub use error::{BpeError, ErrorMode, MergeTableViolation, Result};
pub use io::SavedModel;
pub use merges::{MergeRule, MergeTable, apply_merges, replace_pair};
pub use model::{BPEModel, ModelState};
pub use stats::{PairRank, most_frequent, pair_counts};
pub use types::{BASE_VOCAB_SIZE, ByteSeq, MergeOrder, Token, TokenFreq, TokenPair};
pub use vocab::Vocabulary;
