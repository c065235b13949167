//! Adaptive score-threshold filtering.
//!
//! Queries with weak or no high-similarity matches must still produce some
//! context rather than an empty answer, but relaxing on every query would
//! drown good answers in noise. The policy relaxes in tiers, each tier only
//! attempted when the previous one came up short.

use crate::types::ScoredMatch;
use copra_core::config::{DEFAULT_MIN_SCORE, DEFAULT_RELAXED_MIN_SCORE};

/// Number of matches taken unconditionally when both thresholds fail.
const FALLBACK_TOP_N: usize = 5;

/// Default minimum number of matches before the relaxed tier is tried.
const DEFAULT_MIN_ACCEPTABLE: usize = 3;

/// Default cap on the surviving set.
const DEFAULT_CAP: usize = 15;

/// Three-tier threshold relaxation policy.
#[derive(Debug, Clone, Copy)]
pub struct FilterPolicy {
    /// Primary similarity threshold
    pub primary_threshold: f32,

    /// Relaxed threshold, tried when the primary tier keeps too few matches.
    /// Must be below `primary_threshold`.
    pub relaxed_threshold: f32,

    /// Minimum acceptable result count before relaxing
    pub min_acceptable: usize,

    /// Hard cap on the surviving set size
    pub cap: usize,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            primary_threshold: DEFAULT_MIN_SCORE,
            relaxed_threshold: DEFAULT_RELAXED_MIN_SCORE,
            min_acceptable: DEFAULT_MIN_ACCEPTABLE,
            cap: DEFAULT_CAP,
        }
    }
}

impl FilterPolicy {
    /// Create a policy with the given thresholds and default counts.
    pub fn new(primary_threshold: f32, relaxed_threshold: f32) -> Self {
        Self {
            primary_threshold,
            relaxed_threshold,
            ..Self::default()
        }
    }

    /// Select the working set from a deduplicated, score-sorted candidate
    /// list.
    ///
    /// Tier 1 keeps everything at or above the primary threshold. If that
    /// leaves fewer than `min_acceptable` matches, tier 2 re-filters at the
    /// relaxed threshold. If even that is empty, tier 3 takes the top
    /// `FALLBACK_TOP_N` by score regardless of threshold. The survivors are
    /// always truncated to `cap`.
    pub fn apply(&self, matches: &[ScoredMatch]) -> Vec<ScoredMatch> {
        let mut filtered: Vec<ScoredMatch> = matches
            .iter()
            .filter(|m| m.score >= self.primary_threshold)
            .cloned()
            .collect();

        if filtered.len() < self.min_acceptable {
            tracing::info!(
                "Only {} results at threshold {}, relaxing to {}",
                filtered.len(),
                self.primary_threshold,
                self.relaxed_threshold
            );
            filtered = matches
                .iter()
                .filter(|m| m.score >= self.relaxed_threshold)
                .cloned()
                .collect();
        }

        if filtered.is_empty() {
            tracing::info!(
                "No results above threshold, taking top {} results",
                FALLBACK_TOP_N
            );
            filtered = matches.iter().take(FALLBACK_TOP_N).cloned().collect();
        }

        filtered.truncate(self.cap);
        filtered
    }
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

    fn pool(scores: &[f32]) -> Vec<ScoredMatch> {
        let mut matches: Vec<ScoredMatch> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| m(&format!("chunk_{}", i), *s))
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches
    }

    #[test]
    fn test_primary_tier_keeps_enough() {
        // 20 candidates, 5 at or above 0.5: tier 1 alone suffices.
        let mut scores = vec![0.9, 0.8, 0.7, 0.6, 0.5];
        scores.extend(std::iter::repeat(0.3).take(15));
        let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));

        assert_eq!(result.len(), 5);
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(result.iter().all(|m| m.score >= 0.5));
    }

    #[test]
    fn test_relaxed_tier_fires_when_short() {
        // Only one match passes 0.5, but four pass 0.45.
        let scores = vec![0.55, 0.48, 0.47, 0.46, 0.2, 0.1];
        let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));

        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|m| m.score >= 0.45));
    }

    #[test]
    fn test_unconditional_fallback_fires_when_empty() {
        // Nothing passes either threshold.
        let scores = vec![0.4, 0.3, 0.25, 0.2, 0.15, 0.1, 0.05];
        let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));

        assert_eq!(result.len(), 5);
        assert_eq!(result[0].score, 0.4);
    }

    #[test]
    fn test_fallback_with_small_pool() {
        let scores = vec![0.2, 0.1];
        let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_never_empty_for_nonempty_input() {
        for scores in [vec![0.01], vec![0.99], vec![0.44, 0.44, 0.44]] {
            let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));
            assert!(!result.is_empty());
        }
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let result = FilterPolicy::default().apply(&[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_cap_is_enforced() {
        let scores: Vec<f32> = (0..40).map(|i| 0.9 - (i as f32) * 0.001).collect();
        let policy = FilterPolicy::new(0.5, 0.45);
        let result = policy.apply(&pool(&scores));

        assert_eq!(result.len(), policy.cap);
    }

    #[test]
    fn test_threshold_monotonicity() {
        // Everything tier 1 keeps, tier 2 would keep as well.
        let scores = vec![0.9, 0.7, 0.55, 0.48, 0.46, 0.3];
        let candidates = pool(&scores);

        let strict: Vec<String> = candidates
            .iter()
            .filter(|m| m.score >= 0.5)
            .map(|m| m.id.clone())
            .collect();
        let relaxed: Vec<String> = candidates
            .iter()
            .filter(|m| m.score >= 0.45)
            .map(|m| m.id.clone())
            .collect();

        assert!(strict.iter().all(|id| relaxed.contains(id)));
    }

    #[test]
    fn test_relaxed_tier_result_is_not_refallbacked() {
        // Tier 2 yields fewer than min_acceptable but more than zero:
        // the unconditional tier must NOT fire.
        let scores = vec![0.47, 0.46, 0.2, 0.1];
        let result = FilterPolicy::new(0.5, 0.45).apply(&pool(&scores));

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|m| m.score >= 0.45));
    }
}
