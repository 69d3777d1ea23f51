//! Error types for BPE training, encoding and decoding.

use std::str::FromStr;

use indicatif::style::TemplateError;

use crate::types::{Token, TokenPair};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BpeError>;

/// Controls how UTF-8 decoding errors are handled.
///
/// Unknown token IDs always produce errors regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on invalid UTF-8.
    #[default]
    Strict,
    /// Replace invalid UTF-8 sequences with U+FFFD.
    Replace,
}

impl FromStr for ErrorMode {
    type Err = BpeError;

    /// Parses an error mode string ("strict" or "replace").
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            _ => Err(BpeError::InvalidConfiguration(format!(
                "invalid error mode: {s:?} (expected \"strict\" or \"replace\")"
            ))),
        }
    }
}

/// Errors surfaced by the BPE model.
#[derive(Debug, thiserror::Error)]
pub enum BpeError {
    /// The model was configured with unusable settings.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `train` was called on a model that is not untrained.
    #[error("model is already trained; construct a new model to train again")]
    AlreadyTrained,

    /// `encode` or `decode` was called before any merge table exists.
    #[error("model has no merge table; train it or load one first")]
    EncodeBeforeTrain,

    /// Token ID not found in vocabulary.
    #[error("unknown token id: {0}")]
    UnknownToken(Token),

    /// Decoded bytes are not valid UTF-8.
    #[error("invalid UTF-8 in decoded bytes: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An externally supplied merge table breaks the id assignment rules.
    #[error("invalid merge table at entry {index}: {reason}")]
    InvalidMergeTable {
        /// Zero-based position of the offending entry.
        index: usize,
        /// What was wrong with it.
        reason: MergeTableViolation,
    },

    /// Progress bar template string was invalid.
    #[error("template parsing failed: {0}")]
    ProgressBarSetup(#[from] TemplateError),

    /// Reading or writing a persisted model failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted model could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reasons a merge table entry is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeTableViolation {
    /// The assigned id is not the next sequential id.
    #[error("expected id {expected}, found {found}")]
    NonSequentialId {
        /// The id the entry should carry.
        expected: Token,
        /// The id it actually carries.
        found: Token,
    },
    /// A component of the pair does not exist yet.
    #[error("pair {pair:?} references unknown token {token}")]
    UnknownComponent {
        /// The offending pair.
        pair: TokenPair,
        /// The missing component.
        token: Token,
    },
    /// The pair was already merged by an earlier entry.
    #[error("pair {0:?} is merged more than once")]
    DuplicatePair(TokenPair),
}
