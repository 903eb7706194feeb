//! This module provides the complete tokenization pipeline:
//! 1. BPE training: learn merge rules from raw text.
//! 2. Encoding: UTF-8 bytes to token ids via the learned rules.
//! 3. Decoding: token ids back to bytes or text.
//!
//! The tokenizer supports both single-text and parallel batch operation
//! via Rayon. A trained tokenizer is immutable during encode/decode, so
//! batch methods share it freely across workers.

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle, style::TemplateError};
use rayon::prelude::*;

use crate::{
    encoder::Encoder,
    error::{DecodeError, EncodeError, ErrorMode, TrainError},
    merges::{MergeRule, MergeTable},
    trainer::Trainer,
    types::{ByteSeq, MergeEvent, Token, TokenPair},
    vocab::Vocabulary,
};

/// Number of ids reserved for the raw byte tokens.
const BYTE_VOCAB_SIZE: usize = 256;

/// Byte-level BPE tokenizer.
///
/// Owns the model: a vocabulary mapping every token id to its byte
/// expansion, and the ordered table of learned merge rules. The model is
/// the single source of truth for encoding and decoding; working token
/// sequences are transient and per-call.
///
/// A fresh tokenizer knows only the 256 byte tokens and encodes any text
/// to its raw bytes. [`train`](Self::train) learns merges; retraining
/// replaces the model wholesale, and a failed call leaves the previous
/// model untouched.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    merges: MergeTable,
    /// Optional bound on working-sequence length. `None` means sequences
    /// grow with the input.
    capacity: Option<usize>,
}

impl Tokenizer {
    /// Creates a tokenizer with the 256 byte tokens and no merge rules.
    ///
    /// Working sequences are unbounded; they size themselves to the input.
    pub fn new() -> Self {
        Self {
            vocab: Vocabulary::new(),
            merges: MergeTable::new(),
            capacity: None,
        }
    }

    /// Like [`new`](Self::new), but bounds every working token sequence to
    /// `limit` elements.
    ///
    /// Training and encoding reject input whose byte length exceeds the
    /// bound with a `CapacityExceeded` error; input of exactly `limit`
    /// bytes is accepted. Merging never lengthens a sequence, so the check
    /// happens where sequences are created.
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            vocab: Vocabulary::new(),
            merges: MergeTable::new(),
            capacity: Some(limit),
        }
    }

    /// Builds a tokenizer from an existing list of merge pairs.
    ///
    /// Pairs are ranked in iteration order and assigned ids sequentially
    /// from 256, exactly as training would have. Each pair may only name
    /// ids that already exist (bytes or earlier merges).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if a pair references an id that
    /// is neither a byte token nor a previously created merge.
    pub fn from_merges(
        pairs: impl IntoIterator<Item = (Token, Token)>,
    ) -> Result<Self, DecodeError> {
        let mut vocab = Vocabulary::new();
        let mut merges = MergeTable::new();

        for (first, second) in pairs {
            let new_id = vocab.grow(first, second)?;
            merges.push(TokenPair(first, second), new_id);
        }

        Ok(Self {
            vocab,
            merges,
            capacity: None,
        })
    }

    /// Learns merge rules from `text` until the vocabulary reaches
    /// `target_vocab_size` or no adjacent pair repeats.
    ///
    /// The previous model is replaced only when training succeeds.
    /// When `verbose` is set, a progress bar reports each merge as
    /// `merge i/total: (first, second) -> new_id`.
    ///
    /// # Arguments
    ///
    /// * `text` - Training corpus; its UTF-8 bytes form the initial sequence.
    /// * `target_vocab_size` - Requested final vocabulary size, bytes included.
    /// * `verbose` - Whether to display per-merge progress.
    ///
    /// # Returns
    ///
    /// The number of merges actually learned. This is less than
    /// `target_vocab_size - 256` when training stops early because no
    /// pair occurs more than once.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidVocabSize`] if `target_vocab_size` is
    /// not greater than 256, [`TrainError::CapacityExceeded`] if the text
    /// is longer than the configured bound, or
    /// [`TrainError::ProgressBarSetup`] if the progress bar template fails
    /// to compile.
    pub fn train(
        &mut self,
        text: &str,
        target_vocab_size: usize,
        verbose: bool,
    ) -> Result<usize, TrainError> {
        if !verbose {
            return self.train_with_observer(text, target_vocab_size, |_| {});
        }

        let num_merges = target_vocab_size.saturating_sub(BYTE_VOCAB_SIZE);
        if num_merges == 0 {
            return Err(TrainError::InvalidVocabSize(target_vocab_size));
        }

        let pb = match self.progress_bar(num_merges as u64, "Training merges") {
            Ok(pb) => pb,
            Err(te) => return Err(TrainError::ProgressBarSetup(te)),
        };

        let performed = self.train_with_observer(text, target_vocab_size, |event| {
            pb.set_message(format!(
                "merge {}/{}: {} -> {}",
                event.index + 1,
                event.total,
                event.pair,
                event.new_id
            ));
            pb.inc(1);
        })?;
        pb.finish_and_clear();

        Ok(performed)
    }

    /// Like [`train`](Self::train), but reports progress to an arbitrary
    /// observer instead of rendering it.
    ///
    /// The observer runs once per completed merge, in merge order. It is
    /// an observation channel only; training proceeds identically without
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidVocabSize`] or
    /// [`TrainError::CapacityExceeded`] as [`train`](Self::train) does.
    pub fn train_with_observer(
        &mut self,
        text: &str,
        target_vocab_size: usize,
        observer: impl FnMut(&MergeEvent),
    ) -> Result<usize, TrainError> {
        if target_vocab_size <= BYTE_VOCAB_SIZE {
            return Err(TrainError::InvalidVocabSize(target_vocab_size));
        }
        let num_merges = target_vocab_size - BYTE_VOCAB_SIZE;

        let bytes = text.as_bytes();
        if let Some(capacity) = self.capacity
            && bytes.len() > capacity
        {
            return Err(TrainError::CapacityExceeded {
                len: bytes.len(),
                capacity,
            });
        }

        // Everything that can fail has failed by now; stage the new model
        // and commit it wholesale.
        let ids = byte_ids(bytes);
        let mut trainer = Trainer::new(ids);
        let mut observer = observer;
        let performed = trainer.run(num_merges, &mut observer);

        let (vocab, merges) = trainer.into_model();
        self.vocab = vocab;
        self.merges = merges;

        Ok(performed)
    }

    /// Encodes `text` into a token sequence using the learned merges.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::CapacityExceeded`] if the text is longer
    /// than the configured working-sequence bound.
    pub fn encode(&self, text: &str) -> Result<Vec<Token>, EncodeError> {
        self.encode_bytes(text.as_bytes())
    }

    /// Encodes a raw byte sequence into token ids.
    ///
    /// Every byte value is covered by the initial vocabulary, so arbitrary
    /// binary input is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::CapacityExceeded`] if the input is longer
    /// than the configured working-sequence bound.
    pub fn encode_bytes(&self, bytes: &[u8]) -> Result<Vec<Token>, EncodeError> {
        if let Some(capacity) = self.capacity
            && bytes.len() > capacity
        {
            return Err(EncodeError::CapacityExceeded {
                len: bytes.len(),
                capacity,
            });
        }

        let ids = byte_ids(bytes);
        if ids.len() <= 1 {
            return Ok(ids);
        }
        Ok(Encoder::new(&self.merges).encode(ids))
    }

    /// Encodes many texts in parallel using Rayon.
    ///
    /// Each text is independently encoded on a Rayon worker against the
    /// shared model. Results keep the input order.
    ///
    /// # Arguments
    ///
    /// * `texts` - Slice of text strings to encode.
    /// * `show_progress` - Whether to display a progress bar.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::CapacityExceeded`] if any text exceeds the
    /// working-sequence bound, or [`EncodeError::ProgressBarSetup`] if the
    /// progress bar template fails to compile.
    pub fn encode_batch(
        &self,
        texts: &[&str],
        show_progress: bool,
    ) -> Result<Vec<Vec<Token>>, EncodeError> {
        let pb = if show_progress {
            match self.progress_bar(texts.len() as u64, "Encoding texts") {
                Ok(pb) => pb,
                Err(te) => return Err(EncodeError::ProgressBarSetup(te)),
            }
        } else {
            // create dummy progress bar and force to not render
            let pb = ProgressBar::new(texts.len() as u64);
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            pb
        };

        texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.encode(text))
            .collect()
    }

    /// Decodes a token sequence back into bytes.
    ///
    /// Each id contributes its entire vocabulary expansion, in order, so
    /// decoding a learned multi-byte id reproduces every byte it stands
    /// for and `decode(encode(text))` round-trips.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if any id was never assigned.
    pub fn decode(&self, ids: &[Token]) -> Result<ByteSeq, DecodeError> {
        let mut bytes = Vec::new();
        for &id in ids {
            bytes.extend_from_slice(self.vocab.expand(id)?);
        }
        Ok(bytes)
    }

    /// Decodes a token sequence into a UTF-8 string.
    ///
    /// # Arguments
    ///
    /// * `ids` - Sequence of token ids to decode.
    /// * `errors` - How to handle invalid UTF-8 in the decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if an id is not in the
    /// vocabulary, or [`DecodeError::InvalidUtf8`] if the decoded bytes
    /// are not valid UTF-8 (only in [`ErrorMode::Strict`]).
    pub fn decode_to_string(
        &self,
        ids: &[Token],
        errors: ErrorMode,
    ) -> Result<String, DecodeError> {
        let bytes = self.decode(ids)?;

        match errors {
            ErrorMode::Strict => String::from_utf8(bytes).map_err(DecodeError::InvalidUtf8),
            ErrorMode::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Decodes multiple token sequences in parallel.
    ///
    /// Each sequence is independently decoded on a Rayon worker against
    /// the shared model. Results keep the input order.
    ///
    /// # Arguments
    ///
    /// * `id_seqs` - Slice of token sequences to decode.
    /// * `errors` - How to handle invalid UTF-8 in decoded bytes.
    /// * `show_progress` - Whether to display a progress bar.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if an id is not in the
    /// vocabulary, [`DecodeError::InvalidUtf8`] if decoded bytes are not
    /// valid UTF-8 (only in [`ErrorMode::Strict`]), or
    /// [`DecodeError::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn decode_batch(
        &self,
        id_seqs: &[&[Token]],
        errors: ErrorMode,
        show_progress: bool,
    ) -> Result<Vec<String>, DecodeError> {
        let pb = if show_progress {
            match self.progress_bar(id_seqs.len() as u64, "Decoding tokens") {
                Ok(pb) => pb,
                Err(te) => return Err(DecodeError::ProgressBarSetup(te)),
            }
        } else {
            // create dummy progress bar and force to not render
            let pb = ProgressBar::new(id_seqs.len() as u64);
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            pb
        };

        id_seqs
            .par_iter()
            .progress_with(pb)
            .map(|ids| self.decode_to_string(ids, errors))
            .collect()
    }

    /// Returns the vocabulary size (number of assigned token ids).
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Returns the number of learned merge rules.
    pub fn num_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterates the learned merge rules in rank order.
    pub fn merges(&self) -> impl Iterator<Item = &MergeRule> {
        self.merges.iter()
    }

    /// Byte expansion of a single token id.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if `id` was never assigned.
    pub fn expansion(&self, id: Token) -> Result<&[u8], DecodeError> {
        self.vocab.expand(id)
    }

    /// The configured working-sequence bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Creates a styled progress bar with elapsed time, a fixed-width
    /// message label, and position/total counters.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the progress bar style template is
    /// invalid.
    fn progress_bar(
        &self,
        size: u64,
        msg: impl Into<String>,
    ) -> Result<ProgressBar, TemplateError> {
        let pb = ProgressBar::new(size);

        let style = match ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")
        {
            Ok(ps) => ps,
            Err(te) => return Err(te),
        };

        pb.set_style(style);
        pb.set_message(msg.into());
        pb.enable_steady_tick(std::time::Duration::from_secs(1));

        Ok(pb)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One raw byte id per input byte.
fn byte_ids(bytes: &[u8]) -> Vec<Token> {
    bytes.iter().map(|&b| b as Token).collect()
}
