use crate::core::subscores::shared_goal_tags;
use crate::models::{MatchingProfile, ScoreBreakdown};

// Thresholds at which a dimension is worth explaining to the viewer.
// Reasons are emitted in the order below and callers rely on it.
pub const RECIPROCAL_REASON_MIN: u8 = 90;
pub const SHARED_LANGUAGE_REASON_MIN: u8 = 40;
pub const AVAILABILITY_REASON_MIN: u8 = 75;
pub const GOALS_REASON_MIN: u8 = 60;
pub const LOCATION_REASON_MIN: u8 = 75;
pub const ACTIVITY_REASON_MIN: u8 = 80;

/// Upper bound on explanations attached to a single result
pub const MAX_REASONS: usize = 4;

/// Items listed per reason for availability slots and goal tags
const MAX_LISTED: usize = 2;

/// Build the ordered, capped list of explanations for a pairing,
/// phrased from the viewer's point of view
///
/// `max_reasons` is clamped to [`MAX_REASONS`].
pub fn generate_reasons(
    viewer: &MatchingProfile,
    candidate: &MatchingProfile,
    breakdown: &ScoreBreakdown,
    max_reasons: usize,
) -> Vec<String> {
    let candidates = [
        language_reason(viewer, candidate, breakdown.language_compatibility),
        availability_reason(viewer, candidate, breakdown.availability_match),
        goals_reason(viewer, candidate, breakdown.goals_alignment),
        (breakdown.location_bonus >= LOCATION_REASON_MIN)
            .then(|| "You're in the same area".to_string()),
        (breakdown.activity_level >= ACTIVITY_REASON_MIN)
            .then(|| "You're both active learners".to_string()),
    ];

    candidates
        .into_iter()
        .flatten()
        .take(max_reasons.min(MAX_REASONS))
        .collect()
}

fn language_reason(viewer: &MatchingProfile, candidate: &MatchingProfile, score: u8) -> Option<String> {
    if score >= RECIPROCAL_REASON_MIN {
        let you_teach = viewer.native_languages.intersection(&candidate.learning_languages).next()?;
        let they_teach = candidate.native_languages.intersection(&viewer.learning_languages).next()?;
        Some(format!(
            "Perfect language exchange: you can help with {} while they help you with {}",
            you_teach, they_teach
        ))
    } else if score >= SHARED_LANGUAGE_REASON_MIN {
        viewer
            .learning_languages
            .intersection(&candidate.learning_languages)
            .next()
            .map(|language| format!("You're both learning {}", language))
    } else {
        None
    }
}

fn availability_reason(viewer: &MatchingProfile, candidate: &MatchingProfile, score: u8) -> Option<String> {
    if score < AVAILABILITY_REASON_MIN {
        return None;
    }
    let slots: Vec<&str> = viewer
        .availability
        .intersection(&candidate.availability)
        .take(MAX_LISTED)
        .map(String::as_str)
        .collect();
    (!slots.is_empty()).then(|| format!("You're both available: {}", slots.join(", ")))
}

fn goals_reason(viewer: &MatchingProfile, candidate: &MatchingProfile, score: u8) -> Option<String> {
    if score < GOALS_REASON_MIN {
        return None;
    }
    let tags: Vec<String> = shared_goal_tags(viewer, candidate).into_iter().take(MAX_LISTED).collect();
    (!tags.is_empty()).then(|| format!("Shared goals: {}", tags.join(", ")))
}
