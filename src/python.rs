//! Python bindings, built with the `python` feature.

use std::path::PathBuf;

use pyo3::{
    exceptions::{PyIOError, PyValueError},
    prelude::*,
};

use crate::{
    chunker::GPT2_SPLIT_PATTERN,
    error::{ErrorMode, TokenizerError},
    tokenizer::Tokenizer,
    trainer::TrainerConfig,
    types::Token,
};

impl From<TokenizerError> for PyErr {
    fn from(err: TokenizerError) -> Self {
        match err {
            TokenizerError::StorageUnavailable { .. } => PyIOError::new_err(err.to_string()),
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Python wrapper for [`Tokenizer`].
#[pyclass(name = "Tokenizer", frozen)]
pub struct PyTokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyTokenizer {
    /// Trains a tokenizer with `vocab_size` tokens. The GIL is released
    /// while training runs.
    #[staticmethod]
    #[pyo3(signature = (text, vocab_size, pattern=None, verbose=false))]
    fn train(
        py: Python<'_>,
        text: &str,
        vocab_size: usize,
        pattern: Option<&str>,
        verbose: bool,
    ) -> PyResult<Self> {
        let pattern = pattern.unwrap_or(GPT2_SPLIT_PATTERN);
        let config = TrainerConfig {
            show_progress: verbose,
            ..TrainerConfig::with_vocab_size(vocab_size)
        };
        let (inner, _) = py.allow_threads(|| Tokenizer::train_with(text, pattern, &config))?;
        Ok(Self { inner })
    }

    #[staticmethod]
    fn load(path: PathBuf) -> PyResult<Self> {
        Ok(Self {
            inner: Tokenizer::load(path)?,
        })
    }

    fn save(&self, prefix: PathBuf) -> PyResult<()> {
        Ok(self.inner.save(prefix)?)
    }

    fn encode(&self, py: Python<'_>, text: &str) -> PyResult<Vec<Token>> {
        Ok(py.allow_threads(|| self.inner.encode(text))?)
    }

    #[pyo3(signature = (ids, errors="replace"))]
    fn decode(&self, ids: Vec<Token>, errors: &str) -> PyResult<String> {
        let mode: ErrorMode = errors.parse().map_err(PyValueError::new_err)?;
        Ok(self.inner.decode_with(&ids, mode)?)
    }

    fn decode_bytes(&self, ids: Vec<Token>) -> PyResult<Vec<u8>> {
        Ok(self.inner.decode_bytes(&ids)?)
    }

    #[getter]
    fn pattern(&self) -> &str {
        self.inner.pattern()
    }

    #[getter]
    fn vocab_size(&self) -> usize {
        self.inner.vocab_size()
    }

    /// Merges as `((left, right), id)` in learned order.
    fn merges(&self) -> Vec<((Token, Token), Token)> {
        self.inner
            .merges()
            .iter()
            .map(|rule| ((rule.pair.0, rule.pair.1), rule.id))
            .collect()
    }
}

#[pymodule]
fn _minbpe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<PyTokenizer>()?;
    Ok(())
}
