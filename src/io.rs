//! # Merge Table IO
//!
//! A trained model is persisted as its target vocabulary size and the merge
//! table as `[first, second, id]` triples in learning order:
//!
//! ```json
//! {"vocab_size": 259, "merges": [[97, 97, 256], [97, 98, 257], [256, 257, 258]]}
//! ```
//!
//! The vocabulary is not stored; loading replays the merges over the 256
//! base bytes.

use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, model::BPEModel, types::Token};

/// Serialized form of a trained [`BPEModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedModel {
    /// Target vocabulary size the table was trained for.
    pub vocab_size: usize,
    /// `(first, second, assigned id)` in learning order.
    pub merges: Vec<(Token, Token, Token)>,
}

impl BPEModel {
    /// Snapshot of the merge table for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BpeError::EncodeBeforeTrain`] if the model is untrained.
    pub fn to_saved(&self) -> Result<SavedModel> {
        let merges = self
            .converter()?
            .merges()
            .iter()
            .map(|((a, b), token)| (a, b, token))
            .collect();
        Ok(SavedModel {
            vocab_size: self.target_vocab_size(),
            merges,
        })
    }

    /// Rebuilds a trained model from a snapshot.
    ///
    /// # Errors
    ///
    /// As [`BPEModel::from_merges`].
    pub fn from_saved(saved: SavedModel) -> Result<Self> {
        Self::from_merges(
            saved.vocab_size,
            saved
                .merges
                .into_iter()
                .map(|(a, b, token)| ((a, b), token)),
        )
    }

    /// Save the model to a JSON file.
    ///
    /// # Arguments
    /// * `path` - the path to save the model to.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.save_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Save the model to a [`Write`] writer.
    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *writer, &self.to_saved()?)?;
        Ok(())
    }

    /// Load a model from a JSON file.
    ///
    /// # Arguments
    /// * `path` - the path to the model file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::load_from_reader(BufReader::new(file))
    }

    /// Load a model from a [`Read`] stream.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        let saved: SavedModel = serde_json::from_reader(reader)?;
        Self::from_saved(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BpeError;

    fn trained_model() -> BPEModel {
        let mut model = BPEModel::new(259).expect("valid vocab size");
        model.train("aaabdaaabac").expect("training should succeed");
        model
    }

    #[test]
    fn test_saved_layout() {
        let saved = trained_model().to_saved().expect("trained");
        assert_eq!(saved.vocab_size, 259);
        assert_eq!(saved.merges, vec![(97, 97, 256), (97, 98, 257), (256, 257, 258)]);

        let json = serde_json::to_string(&saved).expect("serializable");
        assert_eq!(
            json,
            r#"{"vocab_size":259,"merges":[[97,97,256],[97,98,257],[256,257,258]]}"#
        );
    }

    #[test]
    fn test_untrained_cannot_be_saved() {
        let model = BPEModel::new(300).expect("valid vocab size");
        assert!(matches!(model.to_saved(), Err(BpeError::EncodeBeforeTrain)));
    }

    #[test]
    fn test_writer_reader_round_trip() {
        let model = trained_model();
        let mut buf = Vec::new();
        model.save_to_writer(&mut buf).expect("Failed to save model");

        let loaded = BPEModel::load_from_reader(buf.as_slice()).expect("Failed to load model");
        assert_eq!(loaded.merges(), model.merges());
        assert_eq!(loaded.vocab(), model.vocab());
        assert_eq!(loaded.target_vocab_size(), 259);
        assert_eq!(
            loaded.encode("daaabac").expect("encodable"),
            model.encode("daaabac").expect("encodable")
        );
    }

    #[test]
    fn test_save_load_path() {
        let model = trained_model();
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("model.json");

        model.save_to_path(&path).expect("Failed to save model");
        let loaded = BPEModel::load_from_path(&path).expect("Failed to load model");

        assert_eq!(loaded.merges(), model.merges());
    }

    #[test]
    fn test_load_rejects_corrupt_table() {
        let json = r#"{"vocab_size":300,"merges":[[97,98,256],[999,97,257]]}"#;
        assert!(matches!(
            BPEModel::load_from_reader(json.as_bytes()),
            Err(BpeError::InvalidMergeTable { index: 1, .. })
        ));
        assert!(matches!(
            BPEModel::load_from_reader("not json".as_bytes()),
            Err(BpeError::Serialization(_))
        ));
        assert!(matches!(
            BPEModel::load_from_path("/nonexistent/model.json"),
            Err(BpeError::Io(_))
        ));
    }
}
