use crate::core::reasons::generate_reasons;
use crate::core::subscores::{
    activity_level, availability_match, experience_match, goals_alignment, language_compatibility,
    location_bonus,
};
use crate::models::{CompatibilityResult, MatchingProfile, ScoreBreakdown, ScoringWeights};

/// Compute all six sub-scores for a pair
pub fn calculate_breakdown(a: &MatchingProfile, b: &MatchingProfile) -> ScoreBreakdown {
    ScoreBreakdown {
        language_compatibility: language_compatibility(a, b),
        availability_match: availability_match(a, b),
        goals_alignment: goals_alignment(a, b),
        experience_match: experience_match(a, b),
        activity_level: activity_level(a, b),
        location_bonus: location_bonus(a, b),
    }
}

/// Combine sub-scores into an overall score (0-100)
///
/// Scoring formula:
/// score = round(
///     language * 0.40 +
///     availability * 0.25 +
///     goals * 0.15 +
///     experience * 0.10 +
///     activity * 0.05 +
///     location * 0.05
/// )
///
/// The sum is taken in basis points so that halves round up exactly
/// (e.g. 75.5 -> 76) instead of depending on float representation.
pub fn combine_scores(breakdown: &ScoreBreakdown, weights: &ScoringWeights) -> u8 {
    let subscores = [
        breakdown.language_compatibility,
        breakdown.availability_match,
        breakdown.goals_alignment,
        breakdown.experience_match,
        breakdown.activity_level,
        breakdown.location_bonus,
    ];

    let weighted: u64 = weights
        .basis_points()
        .iter()
        .zip(subscores.iter())
        .map(|(&w, &s)| w as u64 * s as u64)
        .sum();

    ((weighted + 5_000) / 10_000).min(100) as u8
}

/// Score and explain a viewer/candidate pair
pub fn calculate_compatibility(
    viewer: &MatchingProfile,
    candidate: &MatchingProfile,
    weights: &ScoringWeights,
    max_reasons: usize,
) -> CompatibilityResult {
    let breakdown = calculate_breakdown(viewer, candidate);
    let overall_score = combine_scores(&breakdown, weights);
    let reasons = generate_reasons(viewer, candidate, &breakdown, max_reasons);

    CompatibilityResult {
        viewer_id: viewer.id.clone(),
        candidate_id: candidate.id.clone(),
        overall_score,
        score_breakdown: breakdown,
        reasons,
    }
}
