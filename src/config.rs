//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::{
    error::{BpeError, Result},
    types::BASE_VOCAB_SIZE,
};

/// Default number of merges between training progress reports.
pub const DEFAULT_LOG_EVERY: usize = 100;

fn default_log_every() -> usize {
    DEFAULT_LOG_EVERY
}

/// Settings for a [`crate::BPEModel`].
///
/// Only `vocab_size` is required; it must exceed the 256 base byte units.
///
/// ```
/// use bytebpe::BpeConfig;
///
/// let config = BpeConfig::from_json_str(r#"{"vocab_size": 512}"#).unwrap();
/// assert_eq!(config.num_merges(), 256);
/// assert_eq!(config.log_every, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpeConfig {
    /// Target vocabulary size, base bytes included.
    pub vocab_size: usize,

    /// Draw an indicatif progress bar while training.
    #[serde(default)]
    pub show_progress: bool,

    /// Log a progress line every this many merges; `0` disables it.
    #[serde(default = "default_log_every")]
    pub log_every: usize,
}

impl BpeConfig {
    /// Creates a config with default reporting settings.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            show_progress: false,
            log_every: DEFAULT_LOG_EVERY,
        }
    }

    /// Sets [`BpeConfig::show_progress`].
    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Sets [`BpeConfig::log_every`].
    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::Serialization`] for malformed JSON and
    /// [`BpeError::InvalidConfiguration`] if the settings are unusable.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::InvalidConfiguration`] if `vocab_size <= 256`.
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size <= BASE_VOCAB_SIZE {
            return Err(BpeError::InvalidConfiguration(format!(
                "vocab_size must be greater than {BASE_VOCAB_SIZE}, got {}",
                self.vocab_size
            )));
        }
        Ok(())
    }

    /// Number of merges training will attempt.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(BASE_VOCAB_SIZE)
    }
}
