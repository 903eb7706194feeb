//! Error types for tokenizer training, encoding and decoding operations.

use std::{error, fmt, str::FromStr};

use indicatif::style::TemplateError;

use crate::types::Token;

/// Controls how UTF-8 decoding errors are handled.
///
/// Mirrors Python's `bytes.decode(errors=...)` semantics.
/// Unknown token ids always produce errors regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Raise an error on invalid UTF-8 like Python's "strict".
    Strict,
    /// Replace invalid UTF-8 sequences with U+FFFD (like Python's "replace").
    Replace,
}

impl FromStr for ErrorMode {
    type Err = String;

    /// Parses a Python-style error mode string ("strict" or "replace").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            _ => Err(format!(
                "invalid error mode: {s:?} (expected \"strict\" or \"replace\")"
            )),
        }
    }
}

/// Errors that can occur during training.
#[derive(Debug)]
pub enum TrainError {
    /// Requested vocabulary size leaves no room for learned tokens
    /// (the base byte vocabulary already occupies ids 0-255).
    InvalidVocabSize(usize),
    /// Input is longer than the configured working-sequence bound.
    CapacityExceeded {
        /// Length the working sequence would need.
        len: usize,
        /// The caller-declared bound.
        capacity: usize,
    },
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVocabSize(size) => {
                write!(f, "target vocab size must exceed 256, got {size}")
            }
            Self::CapacityExceeded { len, capacity } => {
                write!(f, "sequence of {len} tokens exceeds capacity {capacity}")
            }
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl error::Error for TrainError {}

/// Errors that can occur during text encoding.
#[derive(Debug)]
pub enum EncodeError {
    /// Input is longer than the configured working-sequence bound.
    CapacityExceeded {
        /// Length the working sequence would need.
        len: usize,
        /// The caller-declared bound.
        capacity: usize,
    },
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { len, capacity } => {
                write!(f, "sequence of {len} tokens exceeds capacity {capacity}")
            }
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl error::Error for EncodeError {}

/// Errors that can occur during token decoding.
#[derive(Debug)]
pub enum DecodeError {
    /// Token id not found in vocabulary.
    UnknownId(Token),
    /// Decoded bytes are not valid UTF-8.
    InvalidUtf8(std::string::FromUtf8Error),
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownId(id) => write!(f, "unknown token id: {id}"),
            Self::InvalidUtf8(e) => write!(f, "invalid UTF-8 in decoded bytes: {e}"),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl error::Error for DecodeError {}
