//! Merging of per-variation search results.
//!
//! This is the sole deduplication point in the pipeline: two query
//! variations frequently retrieve the same indexed chunk, which would
//! otherwise inflate apparent result counts.

use crate::types::ScoredMatch;
use std::collections::HashSet;

/// Merge several result sequences into one deduplicated, score-sorted list.
///
/// Input sequences are concatenated in order; the first occurrence of each
/// identifier wins and later duplicates are discarded. The retained set is
/// then sorted by descending score. The sort is stable, so ties keep their
/// first-seen order.
pub fn merge_matches(result_sets: Vec<Vec<ScoredMatch>>) -> Vec<ScoredMatch> {
    let mut seen_ids = HashSet::new();
    let mut unique: Vec<ScoredMatch> = Vec::new();

    for matches in result_sets {
        for m in matches {
            if seen_ids.insert(m.id.clone()) {
                unique.push(m);
            }
        }
    }

    unique.sort_by(|a, b| b.score.total_cmp(&a.score));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchMetadata;

    fn m(id: &str, score: f32) -> ScoredMatch {
        ScoredMatch {
            id: id.to_string(),
            score,
            metadata: MatchMetadata::default(),
        }
    }

    #[test]
    fn test_merge_dedups_by_id_first_wins() {
        // Same chunk retrieved by two variations with different scores:
        // the occurrence from the first result set must survive.
        let merged = merge_matches(vec![
            vec![m("chunk_7", 0.81), m("chunk_2", 0.60)],
            vec![m("chunk_7", 0.77), m("chunk_9", 0.55)],
        ]);

        assert_eq!(merged.len(), 3);
        let seven = merged.iter().find(|x| x.id == "chunk_7").unwrap();
        assert_eq!(seven.score, 0.81);
    }

    #[test]
    fn test_merge_length_equals_distinct_ids() {
        let merged = merge_matches(vec![
            vec![m("a", 0.9), m("b", 0.8)],
            vec![m("b", 0.7), m("c", 0.6)],
            vec![m("a", 0.5)],
        ]);

        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_sorts_descending() {
        let merged = merge_matches(vec![
            vec![m("a", 0.3), m("b", 0.9)],
            vec![m("c", 0.6)],
        ]);

        for pair in merged.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(merged[0].id, "b");
    }

    #[test]
    fn test_merge_ties_keep_first_seen_order() {
        let merged = merge_matches(vec![
            vec![m("first", 0.5)],
            vec![m("second", 0.5)],
        ]);

        assert_eq!(merged[0].id, "first");
        assert_eq!(merged[1].id, "second");
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_matches(vec![]).is_empty());
        assert!(merge_matches(vec![vec![], vec![]]).is_empty());
    }
}
