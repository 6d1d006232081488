use rayon::prelude::*;

use crate::core::{filters::is_viable, scoring::calculate_compatibility};
use crate::models::{CompatibilityResult, MatchingProfile, MatchingRules, ScoringWeights};

/// Result of ranking a candidate list
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<CompatibilityResult>,
    pub total_candidates: usize,
}

/// Main scoring orchestrator over already-fetched profiles
///
/// # Pipeline Stages
/// 1. Pairwise scoring (parallel, no shared state)
/// 2. Minimum-viability filter
/// 3. Ranking by score, then candidate id
/// 4. Truncation to the requested limit
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: ScoringWeights,
    rules: MatchingRules,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, rules: MatchingRules) -> Self {
        Self { weights, rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default(), MatchingRules::default())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn rules(&self) -> &MatchingRules {
        &self.rules
    }

    /// Full pairwise explanation for one viewer/candidate pair
    pub fn explain(&self, viewer: &MatchingProfile, candidate: &MatchingProfile) -> CompatibilityResult {
        calculate_compatibility(viewer, candidate, &self.weights, self.rules.max_reasons)
    }

    /// Score, filter, sort and truncate a list of candidates for a viewer
    ///
    /// This is also the lightweight sorting entry point: it applies no
    /// pool exclusion or cap, only the viability threshold.
    ///
    /// # Arguments
    /// * `viewer` - The profile the list is ranked for
    /// * `candidates` - Profiles to score against the viewer
    /// * `limit` - Maximum number of matches to return
    pub fn rank(
        &self,
        viewer: &MatchingProfile,
        candidates: &[MatchingProfile],
        limit: usize,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        let mut matches: Vec<CompatibilityResult> = candidates
            .par_iter()
            .map(|candidate| self.explain(viewer, candidate))
            .filter(|result| is_viable(result, self.rules.min_viable_score))
            .collect();

        // Ordering is only imposed once every score is available
        matches.sort_by(|a, b| {
            b.overall_score
                .cmp(&a.overall_score)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });

        matches.truncate(limit);

        tracing::debug!(
            "Ranked {} of {} candidates for {}",
            matches.len(),
            total_candidates,
            viewer.id
        );

        MatchResult {
            matches,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn learner(id: &str, native: &[&str], learning: &[&str], sessions: u32) -> MatchingProfile {
        MatchingProfile {
            native_languages: set(native),
            learning_languages: set(learning),
            activity_stats: sessions,
            ..MatchingProfile::new(id)
        }
    }

    #[test]
    fn test_rank_basic() {
        let matcher = Matcher::with_defaults();
        let viewer = learner("viewer", &["Spanish"], &["English"], 0);

        let candidates = vec![
            learner("exchange", &["English"], &["Spanish"], 0), // Reciprocal
            learner("colearner", &["German"], &["English"], 0), // Shared target
            learner("stranger", &["Japanese"], &["Korean"], 0), // 31, just viable
        ];

        let result = matcher.rank(&viewer, &candidates, 10);

        assert_eq!(result.total_candidates, 3);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["exchange", "colearner", "stranger"]);
    }

    #[test]
    fn test_ties_broken_by_candidate_id() {
        let matcher = Matcher::with_defaults();
        let viewer = learner("viewer", &["Spanish"], &["English"], 0);

        let candidates = vec![
            learner("zeta", &["English"], &["Spanish"], 0),
            learner("alpha", &["English"], &["Spanish"], 0),
            learner("mid", &["English"], &["Spanish"], 0),
        ];

        let result = matcher.rank(&viewer, &candidates, 10);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_defaults();
        let viewer = learner("viewer", &["Spanish"], &["English"], 5);

        let candidates: Vec<MatchingProfile> = (0..20)
            .map(|i| learner(&format!("c{:02}", i), &["English"], &["Spanish"], i))
            .collect();

        let result = matcher.rank(&viewer, &candidates, 5);

        assert_eq!(result.matches.len(), 5);
        assert_eq!(result.total_candidates, 20);
    }

    #[test]
    fn test_low_scores_filtered() {
        let rules = MatchingRules { min_viable_score: 31, ..MatchingRules::default() };
        let matcher = Matcher::new(ScoringWeights::default(), rules);
        let viewer = learner("viewer", &["Spanish"], &["English"], 0);

        let candidates = vec![learner("stranger", &["Japanese"], &["Korean"], 0)];

        assert!(matcher.rank(&viewer, &candidates, 10).matches.is_empty());
    }
}
