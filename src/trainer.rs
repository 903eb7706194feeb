//! BPE training loop.
//!
//! Each round counts the adjacent pairs of the working sequence, selects
//! the most frequent one, rewrites the sequence with a freshly grown token
//! id and records the rule. The run ends after the requested number of
//! merges or as soon as no pair occurs more than once.
//!
//! The model under construction is staged inside the trainer; callers
//! consume the trainer to obtain it, so an abandoned run leaves nothing
//! half-written behind.

use crate::{
    merger,
    merges::MergeTable,
    pair_counts::PairCounts,
    types::{MergeEvent, Token, TokenFreq, TokenPair},
    vocab::Vocabulary,
};

/// BPE training structure.
///
/// Owns the working token sequence and the staged model (vocabulary plus
/// merge table). The working sequence only shrinks as merges are applied.
#[derive(Debug)]
pub(crate) struct Trainer {
    /// Working token sequence, rewritten in place by each merge.
    ids: Vec<Token>,

    /// Staged vocabulary; grows by one entry per merge.
    vocab: Vocabulary,

    /// Staged merge rules in learning order.
    merges: MergeTable,
}

impl Trainer {
    /// Creates a trainer over an initial byte-id sequence.
    ///
    /// The staged vocabulary starts from the 256 byte tokens and the merge
    /// table starts empty; previous models are never consulted.
    pub(crate) fn new(ids: Vec<Token>) -> Self {
        Self {
            ids,
            vocab: Vocabulary::new(),
            merges: MergeTable::new(),
        }
    }

    /// Runs up to `num_merges` rounds, invoking `observer` after each
    /// completed merge.
    ///
    /// Stops early once the most frequent pair occurs at most once; that is
    /// the normal end of learnable structure, not a failure. Returns the
    /// number of merges actually performed.
    pub(crate) fn run(
        &mut self,
        num_merges: usize,
        observer: &mut impl FnMut(&MergeEvent),
    ) -> usize {
        let mut performed = 0;

        for index in 0..num_merges {
            let counts = PairCounts::count(&self.ids);

            let Some((pair, count)) = select(&counts) else {
                break;
            };
            // A pair that never repeats is not worth a rule.
            if count <= 1 {
                break;
            }

            // Ids in the working sequence are always vocab-backed.
            let Ok(new_id) = self.vocab.grow(pair.0, pair.1) else {
                break;
            };

            self.ids = merger::merge(&self.ids, pair, new_id);
            self.merges.push(pair, new_id);
            performed += 1;

            observer(&MergeEvent {
                index,
                total: num_merges,
                pair,
                new_id,
                count,
            });
        }

        performed
    }

    /// Consumes the trainer, handing out the staged model.
    pub(crate) fn into_model(self) -> (Vocabulary, MergeTable) {
        (self.vocab, self.merges)
    }

    /// Current working sequence.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> &[Token] {
        &self.ids
    }
}

/// Picks the pair with the strictly highest count.
///
/// Iteration follows the counter's first-occurrence order, and only a
/// strictly greater count displaces the current best, so equal-count ties
/// resolve to the pair whose first adjacent occurrence is leftmost in the
/// sequence.
fn select(counts: &PairCounts) -> Option<(TokenPair, TokenFreq)> {
    let mut best: Option<(TokenPair, TokenFreq)> = None;

    for (pair, count) in counts.iter() {
        let better = match best {
            None => true,
            Some((_, best_count)) => count > best_count,
        };
        if better {
            best = Some((pair, count));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_most_frequent_pair() {
        // (97,97) occurs twice, (97,98) once.
        let mut trainer = Trainer::new(vec![97, 97, 97, 98]);
        let performed = trainer.run(1, &mut |_| {});

        assert_eq!(performed, 1);
        assert_eq!(trainer.ids(), &[256, 97, 98]);

        let (_, merges) = trainer.into_model();
        let rule = merges.rule(0).expect("one rule learned");
        assert_eq!(rule.pair, TokenPair(97, 97));
        assert_eq!(rule.new_id, 256);
    }

    #[test]
    fn test_tie_breaks_on_first_occurrence() {
        // (1,2) and (3,4) both occur twice; (1,2) is seen first.
        let mut trainer = Trainer::new(vec![1, 2, 1, 2, 3, 4, 3, 4]);
        trainer.run(1, &mut |_| {});

        let (_, merges) = trainer.into_model();
        assert_eq!(
            merges.rule(0).expect("one rule learned").pair,
            TokenPair(1, 2)
        );
    }

    #[test]
    fn test_stops_when_no_pair_repeats() {
        let mut trainer = Trainer::new(vec![1, 2, 3, 4]);
        let performed = trainer.run(10, &mut |_| {});

        assert_eq!(performed, 0);
        let (vocab, merges) = trainer.into_model();
        assert!(merges.is_empty());
        assert_eq!(vocab.len(), 256);
    }

    #[test]
    fn test_merged_token_can_merge_again() {
        // "aaaab aaaa": (97,97) -> 256 first, then (256,256) -> 257.
        let mut trainer = Trainer::new(vec![97, 97, 97, 97, 98, 97, 97, 97, 97]);
        let performed = trainer.run(2, &mut |_| {});

        assert_eq!(performed, 2);
        assert_eq!(trainer.ids(), &[257, 98, 257]);

        let (vocab, merges) = trainer.into_model();
        assert_eq!(
            merges.rule(1).expect("second rule learned").pair,
            TokenPair(256, 256)
        );
        assert_eq!(vocab.expand(257).expect("assigned id"), b"aaaa");
    }

    #[test]
    fn test_observer_sees_each_merge() {
        let mut events = Vec::new();
        let mut trainer = Trainer::new(vec![97, 97, 97, 98]);
        trainer.run(2, &mut |event: &MergeEvent| events.push(*event));

        // One merge happens, then (256,97) and (97,98) each occur once.
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            MergeEvent {
                index: 0,
                total: 2,
                pair: TokenPair(97, 97),
                new_id: 256,
                count: 2,
            }
        );
    }

    #[test]
    fn test_empty_sequence_learns_nothing() {
        let mut trainer = Trainer::new(Vec::new());
        assert_eq!(trainer.run(5, &mut |_| {}), 0);
    }

    #[test]
    fn test_select_prefers_strictly_higher_count() {
        let counts = PairCounts::count(&[7, 8, 9, 9, 9]);
        // (9,9) has count 2, everything else 1.
        assert_eq!(select(&counts), Some((TokenPair(9, 9), 2)));
    }
}
