//! Python bindings for the tokenizer.
//!
//! This is a thin wrapper layer; all behavior lives in the Rust core.
//! Library errors surface as `ValueError`, except unknown token ids
//! which map to `KeyError`.

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::{
    error::{DecodeError, ErrorMode},
    tokenizer::Tokenizer,
    types::Token,
};

/// Python wrapper for the BPE tokenizer.
#[pyclass(name = "Tokenizer", module = "bytemerge")]
pub struct PyTokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyTokenizer {
    #[new]
    fn new() -> Self {
        Self {
            inner: Tokenizer::new(),
        }
    }

    /// Learn merge rules from `text` until the vocabulary reaches
    /// `vocab_size`; returns the number of merges learned.
    #[pyo3(signature = (text, vocab_size, verbose = false))]
    fn train(&mut self, text: &str, vocab_size: usize, verbose: bool) -> PyResult<usize> {
        self.inner
            .train(text, vocab_size, verbose)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Encode text into a list of token ids.
    fn encode(&self, text: &str) -> PyResult<Vec<Token>> {
        self.inner
            .encode(text)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Decode a list of token ids into a string, replacing invalid UTF-8
    /// with U+FFFD.
    fn decode(&self, ids: Vec<Token>) -> PyResult<String> {
        self.inner
            .decode_to_string(&ids, ErrorMode::Replace)
            .map_err(decode_err)
    }

    /// Decode a list of token ids into raw bytes.
    fn decode_bytes(&self, ids: Vec<Token>) -> PyResult<Vec<u8>> {
        self.inner.decode(&ids).map_err(decode_err)
    }

    fn vocab_size(&self) -> usize {
        self.inner.vocab_size()
    }

    fn num_merges(&self) -> usize {
        self.inner.num_merges()
    }

    fn __len__(&self) -> usize {
        self.inner.vocab_size()
    }
}

fn decode_err(e: DecodeError) -> PyErr {
    match e {
        DecodeError::UnknownId(_) => PyKeyError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

#[pymodule]
fn bytemerge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTokenizer>()?;
    Ok(())
}
