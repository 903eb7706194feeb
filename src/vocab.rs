//! Vocabulary store mapping token ids to their byte expansions.
//!
//! Ids 0-255 are seeded with their single bytes at construction. Every
//! learned id expands to the concatenation of its two parents' expansions,
//! flattened once at growth time so later lookups stay O(1). The store
//! only grows; entries are immutable once created.

use crate::{
    error::DecodeError,
    types::{ByteSeq, Token},
};

/// Append-only store of token expansions.
#[derive(Debug, Clone)]
pub(crate) struct Vocabulary {
    /// Indexed by token id. `entries[i]` for `i < 256` is the single byte `i`.
    entries: Vec<ByteSeq>,
}

impl Vocabulary {
    /// Creates a store seeded with the 256 single-byte tokens.
    pub(crate) fn new() -> Self {
        let entries = (0..=u8::MAX).map(|b| vec![b]).collect();
        Self { entries }
    }

    /// Appends an entry expanding to `expand(first) ++ expand(second)` and
    /// returns its id, which is always the next sequential one.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if either parent id was never
    /// assigned.
    pub(crate) fn grow(&mut self, first: Token, second: Token) -> Result<Token, DecodeError> {
        let mut bytes = self.expand(first)?.to_vec();
        bytes.extend_from_slice(self.expand(second)?);

        let new_id = self.entries.len();
        self.entries.push(bytes);
        Ok(new_id)
    }

    /// Looks up the byte expansion of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownId`] if `id` was never assigned.
    pub(crate) fn expand(&self, id: Token) -> Result<&[u8], DecodeError> {
        self.entries
            .get(id)
            .map(Vec::as_slice)
            .ok_or(DecodeError::UnknownId(id))
    }

    /// Total number of assigned ids, base bytes included.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}
