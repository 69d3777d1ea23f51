//! Python bindings, enabled with the `python` feature.

use pyo3::{
    exceptions::{PyOSError, PyRuntimeError, PyValueError},
    prelude::*,
    types::PyBytes,
};

use crate::{
    config::{BpeConfig, DEFAULT_LOG_EVERY},
    error::{BpeError, ErrorMode},
    model::BPEModel,
    types::Token,
};

impl From<BpeError> for PyErr {
    fn from(err: BpeError) -> Self {
        match err {
            BpeError::AlreadyTrained
            | BpeError::EncodeBeforeTrain
            | BpeError::ProgressBarSetup(_) => PyRuntimeError::new_err(err.to_string()),
            BpeError::Io(_) => PyOSError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Python wrapper for [`BPEModel`].
#[pyclass(name = "BPEModel", module = "bytebpe")]
pub struct PyBPEModel {
    model: BPEModel,
}

#[pymethods]
impl PyBPEModel {
    #[new]
    #[pyo3(signature = (vocab_size, show_progress = false, log_every = DEFAULT_LOG_EVERY))]
    fn new(vocab_size: usize, show_progress: bool, log_every: usize) -> PyResult<Self> {
        let config = BpeConfig::new(vocab_size)
            .with_show_progress(show_progress)
            .with_log_every(log_every);
        Ok(Self {
            model: BPEModel::with_config(config)?,
        })
    }

    fn train(&mut self, py: Python<'_>, text: &str) -> PyResult<Vec<Token>> {
        let model = &mut self.model;
        Ok(py.allow_threads(|| model.train(text))?)
    }

    fn encode(&self, text: &str) -> PyResult<Vec<Token>> {
        Ok(self.model.encode(text)?)
    }

    #[pyo3(signature = (texts, show_progress = false))]
    fn encode_batch(
        &self,
        py: Python<'_>,
        texts: Vec<String>,
        show_progress: bool,
    ) -> PyResult<Vec<Vec<Token>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        Ok(py.allow_threads(|| self.model.encode_batch(&refs, show_progress))?)
    }

    #[pyo3(signature = (tokens, errors = "strict"))]
    fn decode(&self, tokens: Vec<Token>, errors: &str) -> PyResult<String> {
        let mode: ErrorMode = errors.parse()?;
        Ok(self.model.decode_with(&tokens, mode)?)
    }

    #[pyo3(signature = (token_seqs, errors = "strict", show_progress = false))]
    fn decode_batch(
        &self,
        py: Python<'_>,
        token_seqs: Vec<Vec<Token>>,
        errors: &str,
        show_progress: bool,
    ) -> PyResult<Vec<String>> {
        let mode: ErrorMode = errors.parse()?;
        let refs: Vec<&[Token]> = token_seqs.iter().map(Vec::as_slice).collect();
        Ok(py.allow_threads(|| self.model.decode_batch(&refs, mode, show_progress))?)
    }

    /// Merge table as `((left, right), merged)` in learning order.
    fn merges(&self) -> Vec<((Token, Token), Token)> {
        self.model
            .merges()
            .map(|table| table.iter().collect())
            .unwrap_or_default()
    }

    fn token_bytes<'py>(&self, py: Python<'py>, token: Token) -> Option<Bound<'py, PyBytes>> {
        self.model
            .token_bytes(token)
            .map(|bytes| PyBytes::new(py, bytes))
    }

    #[getter]
    fn vocab_size(&self) -> usize {
        self.model.vocab_size()
    }

    #[getter]
    fn target_vocab_size(&self) -> usize {
        self.model.target_vocab_size()
    }

    #[getter]
    fn log_every(&self) -> usize {
        self.model.config().log_every
    }

    #[getter]
    fn is_trained(&self) -> bool {
        self.model.is_trained()
    }

    fn save(&self, path: &str) -> PyResult<()> {
        Ok(self.model.save_to_path(path)?)
    }

    #[staticmethod]
    fn load(path: &str) -> PyResult<Self> {
        Ok(Self {
            model: BPEModel::load_from_path(path)?,
        })
    }
}

#[pymodule]
fn bytebpe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // forwards Rust `log` records to Python's `logging`
    pyo3_log::init();
    m.add_class::<PyBPEModel>()?;
    Ok(())
}
