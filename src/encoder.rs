//! Merge application during encoding.
//!
//! Encoding replays training rather than re-running it: among the pairs
//! present in the working sequence, the earliest-learned rule (lowest rank)
//! is applied first, regardless of how often each pair occurs in this
//! particular input. Frequencies decided which rules exist; ranks decide
//! the order they are replayed in.

use crate::{merger, merges::MergeTable, pair_counts::PairCounts, types::Token};

/// Applies learned merge rules to token sequences in rank order.
pub(crate) struct Encoder<'a> {
    merges: &'a MergeTable,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(merges: &'a MergeTable) -> Self {
        Self { merges }
    }

    /// Rewrites `ids` until none of its adjacent pairs has a merge rule.
    ///
    /// Each round surveys the distinct pairs present, picks the one with
    /// the lowest rank and replaces every occurrence with the rule's
    /// recorded id. Rounds repeat on the shrinking sequence; a sequence
    /// shorter than two tokens is returned as is.
    pub(crate) fn encode(&self, mut ids: Vec<Token>) -> Vec<Token> {
        if self.merges.is_empty() {
            return ids;
        }

        while ids.len() >= 2 {
            let counts = PairCounts::count(&ids);

            // Lowest rank among the pairs actually present; pairs without
            // a rule are ignored. Ranks are unique, so the minimum is
            // unambiguous.
            let best = counts
                .iter()
                .filter_map(|(pair, _)| self.merges.rank(pair).map(|rank| (rank, pair)))
                .min_by_key(|&(rank, _)| rank);

            let Some((rank, pair)) = best else {
                break;
            };
            let Some(rule) = self.merges.rule(rank) else {
                break;
            };

            ids = merger::merge(&ids, pair, rule.new_id);
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenPair;

    fn table(rules: &[((Token, Token), Token)]) -> MergeTable {
        let mut table = MergeTable::new();
        for &((first, second), new_id) in rules {
            table.push(TokenPair(first, second), new_id);
        }
        table
    }

    #[test]
    fn test_applies_single_rule_everywhere() {
        let merges = table(&[((0, 1), 256)]);
        let encoded = Encoder::new(&merges).encode(vec![0, 1, 0, 1]);
        assert_eq!(encoded, vec![256, 256]);
    }

    #[test]
    fn test_chained_rules_apply_in_rank_order() {
        let merges = table(&[((0, 1), 256), ((256, 0), 257)]);
        let encoded = Encoder::new(&merges).encode(vec![0, 1, 0]);
        assert_eq!(encoded, vec![257]);
    }

    #[test]
    fn test_earlier_rank_beats_local_frequency() {
        // Rank 0 merges (97,98), rank 1 merges (98,99). In "abcbc" the
        // rank-1 pair occurs twice, but rank 0 must fire first and claim
        // the shared 98.
        let merges = table(&[((97, 98), 256), ((98, 99), 257)]);
        let encoded = Encoder::new(&merges).encode(vec![97, 98, 99, 98, 99]);
        assert_eq!(encoded, vec![256, 99, 257]);
    }

    #[test]
    fn test_unranked_pairs_left_alone() {
        let merges = table(&[((5, 6), 256)]);
        let encoded = Encoder::new(&merges).encode(vec![1, 2, 3]);
        assert_eq!(encoded, vec![1, 2, 3]);
    }

    #[test]
    fn test_short_input_returned_as_is() {
        let merges = table(&[((0, 1), 256)]);
        assert_eq!(Encoder::new(&merges).encode(vec![0]), vec![0]);
        assert_eq!(Encoder::new(&merges).encode(Vec::new()), Vec::<Token>::new());
    }

    #[test]
    fn test_empty_table_is_identity() {
        let merges = MergeTable::new();
        let encoded = Encoder::new(&merges).encode(vec![0, 1, 0, 1]);
        assert_eq!(encoded, vec![0, 1, 0, 1]);
    }
}
