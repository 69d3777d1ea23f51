//! Public BPE model: training state machine, encoding and decoding.
//!
//! A model starts `Untrained`, is trained exactly once, and is read-only
//! afterwards. Batch encode/decode fan out over independent inputs with
//! Rayon; training itself is single-threaded.

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::{
    config::BpeConfig,
    converter::BPEConverter,
    error::{BpeError, ErrorMode, Result},
    merges::MergeTable,
    progress::progress_bar,
    trainer::{BPETrainer, TrainedParts},
    types::{Token, byte_tokens},
    vocab::Vocabulary,
};

/// Lifecycle state of a [`BPEModel`].
///
/// `TRAINING` only exists inside [`BPEModel::train`], on a private trainer,
/// and is never observable from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No merge table yet.
    Untrained,
    /// Merge table learned or loaded; read-only.
    Trained,
}

/// Byte-level BPE model.
///
/// ```
/// use bytebpe::BPEModel;
///
/// let mut model = BPEModel::new(259).unwrap();
/// let ids = model.train("aaabdaaabac").unwrap();
/// assert_eq!(ids, vec![258, 100, 258, 97, 99]);
/// assert_eq!(model.encode("aaab").unwrap(), vec![258]);
/// assert_eq!(model.decode(&ids).unwrap(), "aaabdaaabac");
/// ```
#[derive(Debug, Clone)]
pub struct BPEModel {
    config: BpeConfig,

    /// `None` until trained or loaded.
    converter: Option<BPEConverter>,
}

impl BPEModel {
    /// Creates an untrained model targeting `vocab_size` units.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::InvalidConfiguration`] if `vocab_size <= 256`.
    pub fn new(vocab_size: usize) -> Result<Self> {
        Self::with_config(BpeConfig::new(vocab_size))
    }

    /// Creates an untrained model from a full config.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::InvalidConfiguration`] if the config is invalid.
    pub fn with_config(config: BpeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            converter: None,
        })
    }

    /// Creates a trained model from an externally supplied merge table.
    ///
    /// # Arguments
    ///
    /// * `vocab_size` - The target vocabulary size the table was trained for.
    /// * `merges` - `((left, right), merged)` rules in learning order.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::InvalidConfiguration`] if `vocab_size <= 256` or the
    /// table holds more merges than `vocab_size` allows, and
    /// [`BpeError::InvalidMergeTable`] if the table breaks id assignment rules.
    pub fn from_merges(
        vocab_size: usize,
        merges: impl IntoIterator<Item = ((Token, Token), Token)>,
    ) -> Result<Self> {
        let config = BpeConfig::new(vocab_size);
        config.validate()?;

        let table = MergeTable::from_merges(merges)?;
        if table.len() > config.num_merges() {
            return Err(BpeError::InvalidConfiguration(format!(
                "{} merges exceed vocab_size {}",
                table.len(),
                vocab_size
            )));
        }

        Ok(Self {
            config,
            converter: Some(BPEConverter::new(table)?),
        })
    }

    /// Learns the merge table from `text` and returns `text` encoded with it.
    ///
    /// Performs up to `vocab_size - 256` merges; stops early, without error,
    /// when no adjacent pair is left.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::AlreadyTrained`] if the model is not untrained, or
    /// [`BpeError::ProgressBarSetup`] if the progress bar fails to build.
    pub fn train(&mut self, text: &str) -> Result<Vec<Token>> {
        if self.converter.is_some() {
            return Err(BpeError::AlreadyTrained);
        }

        let num_merges = self.config.num_merges();
        let pb = progress_bar(num_merges as u64, "Training merges", self.config.show_progress)?;

        let mut trainer = BPETrainer::new(byte_tokens(text), self.config.log_every);
        trainer.train(num_merges, &pb)?;

        let TrainedParts {
            merges,
            vocab,
            encoded,
        } = trainer.into_parts();
        self.converter = Some(BPEConverter::from_parts(merges, vocab));

        Ok(encoded)
    }

    /// Encodes `text` by replaying the merge table in learned order.
    ///
    /// Empty text yields an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::EncodeBeforeTrain`] if the model has no merge table.
    pub fn encode(&self, text: &str) -> Result<Vec<Token>> {
        let converter = self.converter()?;
        Ok(converter.encode(byte_tokens(text)))
    }

    /// Encode many texts in parallel using Rayon.
    ///
    /// # Returns
    ///
    /// Token sequences in the same order as input texts.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::EncodeBeforeTrain`] if the model has no merge table,
    /// or [`BpeError::ProgressBarSetup`] if the progress bar fails to build.
    pub fn encode_batch(&self, texts: &[&str], show_progress: bool) -> Result<Vec<Vec<Token>>> {
        let converter = self.converter()?;
        let pb = progress_bar(texts.len() as u64, "Encoding texts", show_progress)?;

        Ok(texts
            .par_iter()
            .progress_with(pb)
            .map(|text| converter.encode(byte_tokens(text)))
            .collect())
    }

    /// Decodes ids into their raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::EncodeBeforeTrain`] if the model has no merge table,
    /// or [`BpeError::UnknownToken`] for an id outside the vocabulary.
    pub fn decode_bytes(&self, tokens: &[Token]) -> Result<Vec<u8>> {
        self.converter()?.decode(tokens)
    }

    /// Decodes ids into a string, failing on invalid UTF-8.
    ///
    /// # Errors
    ///
    /// As [`BPEModel::decode_with`] in [`ErrorMode::Strict`].
    pub fn decode(&self, tokens: &[Token]) -> Result<String> {
        self.decode_with(tokens, ErrorMode::Strict)
    }

    /// Decodes ids into a string.
    ///
    /// A sequence that splits a multi-byte character can be invalid UTF-8;
    /// `errors` decides whether that fails or is replaced with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::EncodeBeforeTrain`], [`BpeError::UnknownToken`], or
    /// [`BpeError::InvalidUtf8`] (only in `Strict` mode).
    pub fn decode_with(&self, tokens: &[Token], errors: ErrorMode) -> Result<String> {
        let bytes = self.decode_bytes(tokens)?;
        match errors {
            ErrorMode::Strict => Ok(String::from_utf8(bytes)?),
            ErrorMode::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Decodes multiple token sequences in parallel.
    ///
    /// # Errors
    ///
    /// The first error from [`BPEModel::decode_with`], or
    /// [`BpeError::ProgressBarSetup`] if the progress bar fails to build.
    pub fn decode_batch(
        &self,
        token_seqs: &[&[Token]],
        errors: ErrorMode,
        show_progress: bool,
    ) -> Result<Vec<String>> {
        self.converter()?;
        let pb = progress_bar(token_seqs.len() as u64, "Decoding tokens", show_progress)?;

        token_seqs
            .par_iter()
            .progress_with(pb)
            .map(|tokens| self.decode_with(tokens, errors))
            .collect()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModelState {
        if self.converter.is_some() {
            ModelState::Trained
        } else {
            ModelState::Untrained
        }
    }

    /// Returns `true` once a merge table is present.
    pub fn is_trained(&self) -> bool {
        self.state() == ModelState::Trained
    }

    /// The model's configuration.
    pub fn config(&self) -> &BpeConfig {
        &self.config
    }

    /// The configured target vocabulary size.
    pub fn target_vocab_size(&self) -> usize {
        self.config.vocab_size
    }

    /// Actual vocabulary size: `256 + num_merges()`.
    pub fn vocab_size(&self) -> usize {
        self.vocab().map_or(0, Vocabulary::len)
    }

    /// Number of learned merges; `0` while untrained.
    pub fn num_merges(&self) -> usize {
        self.converter.as_ref().map_or(0, BPEConverter::num_merges)
    }

    /// The ordered merge table, if trained.
    pub fn merges(&self) -> Option<&MergeTable> {
        self.converter.as_ref().map(BPEConverter::merges)
    }

    /// The vocabulary, if trained.
    pub fn vocab(&self) -> Option<&Vocabulary> {
        self.converter.as_ref().map(BPEConverter::vocab)
    }

    /// Byte expansion of a single id, if trained and known.
    pub fn token_bytes(&self, token: Token) -> Option<&[u8]> {
        self.vocab().and_then(|vocab| vocab.get(token))
    }

    /// The trained converter.
    ///
    /// # Errors
    ///
    /// Returns [`BpeError::EncodeBeforeTrain`] if the model has no merge table.
    pub fn converter(&self) -> Result<&BPEConverter> {
        self.converter.as_ref().ok_or(BpeError::EncodeBeforeTrain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merges::apply_merges;

    fn trained(text: &str, vocab_size: usize) -> (BPEModel, Vec<Token>) {
        let mut model = BPEModel::new(vocab_size).expect("valid vocab size");
        let ids = model.train(text).expect("training should succeed");
        (model, ids)
    }

    #[test]
    fn test_rejects_small_vocab_at_construction() {
        assert!(matches!(
            BPEModel::new(256),
            Err(BpeError::InvalidConfiguration(_))
        ));
        assert!(matches!(BPEModel::new(10), Err(BpeError::InvalidConfiguration(_))));
        assert!(BPEModel::new(257).is_ok());
    }

    #[test]
    fn test_state_transitions() {
        let mut model = BPEModel::new(300).expect("valid vocab size");
        assert_eq!(model.state(), ModelState::Untrained);
        assert_eq!(model.num_merges(), 0);
        assert_eq!(model.vocab_size(), 0);
        model.train("hello hello").expect("training should succeed");
        assert_eq!(model.state(), ModelState::Trained);
        assert!(model.is_trained());
    }

    #[test]
    fn test_train_twice_fails() {
        let (mut model, _) = trained("abcabc", 260);
        let merges_before = model.merges().cloned();
        assert!(matches!(model.train("xyz"), Err(BpeError::AlreadyTrained)));
        assert_eq!(model.merges().cloned(), merges_before);
    }

    #[test]
    fn test_encode_before_train_fails() {
        let model = BPEModel::new(300).expect("valid vocab size");
        assert!(matches!(model.encode("abc"), Err(BpeError::EncodeBeforeTrain)));
        assert!(matches!(model.decode(&[97]), Err(BpeError::EncodeBeforeTrain)));
        assert!(matches!(
            model.encode_batch(&["abc"], false),
            Err(BpeError::EncodeBeforeTrain)
        ));
    }

    #[test]
    fn test_reference_scenario() {
        let (model, ids) = trained("aaabdaaabac", 259);
        assert_eq!(ids, vec![258, 100, 258, 97, 99]);
        assert!(ids.len() < 11);
        assert_eq!(model.vocab_size(), 259);
        assert_eq!(
            model.merges().expect("trained").iter().collect::<Vec<_>>(),
            vec![((97, 97), 256), ((97, 98), 257), ((256, 257), 258)]
        );
        assert_eq!(model.token_bytes(258), Some(&b"aaab"[..]));
    }

    #[test]
    fn test_tie_break_picks_smallest_pair() {
        // (97, 98) and (99, 100) both occur twice; (98, 99) and (100, 97) once.
        let (model, _) = trained("abcdab cd", 257);
        let merges: Vec<_> = model.merges().expect("trained").iter().collect();
        assert_eq!(merges, vec![((97, 98), 256)]);
    }

    #[test]
    fn test_monotonic_ids() {
        let (model, _) = trained("the quick brown fox jumps over the lazy dog, the end", 280);
        for (k, (_, token)) in model.merges().expect("trained").iter().enumerate() {
            assert_eq!(token, 256 + k);
        }
    }

    #[test]
    fn test_vocab_growth_bound() {
        let (model, _) = trained("mississippi", 1000);
        let merges = model.num_merges();
        assert!(merges < 1000 - 256);
        assert_eq!(model.vocab_size(), 256 + merges);

        let (model, _) = trained("the rain in spain stays mainly in the plain", 270);
        assert_eq!(model.num_merges(), 270 - 256);
        assert_eq!(model.vocab_size(), 270);
    }

    #[test]
    fn test_empty_text() {
        let (model, ids) = trained("", 300);
        assert!(ids.is_empty());
        assert!(model.is_trained());
        assert_eq!(model.num_merges(), 0);
        assert_eq!(model.vocab_size(), 256);
        assert_eq!(model.encode("").expect("encodable"), Vec::<Token>::new());
        assert_eq!(model.decode(&ids).expect("decodable"), "");
    }

    #[test]
    fn test_round_trip_multibyte() {
        for text in ["x", "héllo wörld", "🦀🦀 crab 🦀🦀", "日本語の日本語"] {
            let (model, ids) = trained(text, 300);
            assert_eq!(model.decode(&ids).expect("decodable"), text);
            assert_eq!(model.encode(text).expect("encodable"), ids);
        }
    }

    #[test]
    fn test_determinism() {
        let text = "low lower lowest newer newest widest";
        let (first, first_ids) = trained(text, 290);
        let (second, second_ids) = trained(text, 290);
        assert_eq!(first_ids, second_ids);
        assert_eq!(first.merges(), second.merges());
    }

    #[test]
    fn test_unseen_bytes_encode_to_identity() {
        let (model, _) = trained("aaaa bbbb aaaa bbbb", 270);
        let ids = model.encode("xyz!").expect("encodable");
        assert_eq!(ids, vec![120, 121, 122, 33]);
    }

    #[test]
    fn test_merge_order_sensitivity() {
        let (model, _) = trained("aaabdaaabac", 259);
        let table = model.merges().expect("trained");
        let held_out: Vec<Token> = "aaab".bytes().map(|b| b as Token).collect();

        let learned = model.encode("aaab").expect("encodable");
        let reversed = apply_merges(&held_out, table.rules().iter().rev());
        assert_eq!(learned, vec![258]);
        assert_eq!(reversed, vec![256, 257]);
        assert_ne!(learned, reversed);
    }

    #[test]
    fn test_from_merges() {
        let model = BPEModel::from_merges(258, vec![((97, 98), 256), ((256, 99), 257)])
            .expect("valid merge table");
        assert!(model.is_trained());
        assert_eq!(model.encode("abcab").expect("encodable"), vec![257, 256]);
        assert!(matches!(
            BPEModel::from_merges(257, vec![((97, 98), 256), ((256, 99), 257)]),
            Err(BpeError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            BPEModel::from_merges(300, vec![((97, 98), 257)]),
            Err(BpeError::InvalidMergeTable { .. })
        ));
    }

    #[test]
    fn test_batch_encode_decode() {
        let (model, _) = trained("ab ab ab cd cd", 260);
        let texts = ["ab", "cd", "", "abcd"];
        let encoded = model.encode_batch(&texts, false).expect("batch-encodable");
        assert_eq!(encoded.len(), texts.len());
        for (text, ids) in texts.iter().zip(&encoded) {
            assert_eq!(&model.encode(text).expect("encodable"), ids);
        }

        let seqs: Vec<&[Token]> = encoded.iter().map(Vec::as_slice).collect();
        let decoded = model
            .decode_batch(&seqs, ErrorMode::Strict, false)
            .expect("batch-decodable");
        assert_eq!(decoded, texts);
    }

    #[test]
    fn test_decode_error_modes() {
        let (model, _) = trained("é", 257);
        // 0xC3 alone is half of 'é'.
        assert!(matches!(model.decode(&[0xC3]), Err(BpeError::InvalidUtf8(_))));
        assert_eq!(
            model.decode_with(&[0xC3], ErrorMode::Replace).expect("lossy decode"),
            "\u{FFFD}"
        );
        assert!(matches!(
            model.decode(&[97, 5000]),
            Err(BpeError::UnknownToken(5000))
        ));
    }
}
