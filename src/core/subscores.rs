//! Per-dimension compatibility calculators.
//!
//! Every calculator is a pure, symmetric function of two profiles returning
//! an integer in [0, 100]. Missing data yields a documented neutral value
//! rather than an error.

use crate::models::MatchingProfile;
use std::collections::BTreeSet;

/// Each learner's native language is something the other is learning
pub const LANGUAGE_RECIPROCAL: u8 = 100;
/// Only one side can teach the other
pub const LANGUAGE_ONE_WAY: u8 = 70;
/// No teach/learn relationship, but a shared target language
pub const LANGUAGE_CO_LEARNERS: u8 = 50;
pub const LANGUAGE_NONE: u8 = 0;

/// Score used when one side has not told us its availability, goals or location
pub const NEUTRAL: u8 = 50;
/// Score used when the pair tracks no language in common
pub const EXPERIENCE_NEUTRAL: u8 = 70;

/// Multiplier rewarding goal overlap more steeply than linear
const GOALS_OVERLAP_BOOST: f64 = 1.5;

/// Language compatibility (teach/learn relationship)
pub fn language_compatibility(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    let a_teaches_b = intersects(&a.native_languages, &b.learning_languages);
    let b_teaches_a = intersects(&b.native_languages, &a.learning_languages);

    match (a_teaches_b, b_teaches_a) {
        (true, true) => LANGUAGE_RECIPROCAL,
        (true, false) | (false, true) => LANGUAGE_ONE_WAY,
        (false, false) if intersects(&a.learning_languages, &b.learning_languages) => {
            LANGUAGE_CO_LEARNERS
        }
        _ => LANGUAGE_NONE,
    }
}

/// Availability overlap by shared time-slot count
pub fn availability_match(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    if a.availability.is_empty() || b.availability.is_empty() {
        return NEUTRAL;
    }

    match a.availability.intersection(&b.availability).count() {
        0 => 0,
        1 => 50,
        2 => 75,
        _ => 100,
    }
}

/// Goal tags both learners hold for the same language, in sorted order
pub fn shared_goal_tags(a: &MatchingProfile, b: &MatchingProfile) -> BTreeSet<String> {
    let mut shared = BTreeSet::new();
    for goal_a in &a.learning_goals {
        for goal_b in b.learning_goals.iter().filter(|g| g.language == goal_a.language) {
            shared.extend(goal_a.goals.intersection(&goal_b.goals).cloned());
        }
    }
    shared
}

/// Goals alignment: shared tags relative to the union of all tags
pub fn goals_alignment(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    if a.learning_goals.is_empty() || b.learning_goals.is_empty() {
        return NEUTRAL;
    }

    let union: BTreeSet<&String> = a
        .learning_goals
        .iter()
        .chain(b.learning_goals.iter())
        .flat_map(|goal| goal.goals.iter())
        .collect();

    // Goal entries without any tags carry no signal
    if union.is_empty() {
        return NEUTRAL;
    }

    let shared = shared_goal_tags(a, b).len() as f64;
    let ratio = shared / union.len() as f64;

    (ratio * 100.0 * GOALS_OVERLAP_BOOST).round().min(100.0) as u8
}

/// Experience-level closeness over languages both learners track progress for
pub fn experience_match(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    let diffs: Vec<f64> = a
        .proficiency_by_language
        .iter()
        .filter_map(|(language, prof_a)| {
            b.proficiency_by_language.get(language).map(|prof_b| {
                (prof_a.level.ordinal() as f64 - prof_b.level.ordinal() as f64).abs()
            })
        })
        .collect();

    if diffs.is_empty() {
        return EXPERIENCE_NEUTRAL;
    }

    let avg_diff = diffs.iter().sum::<f64>() / diffs.len() as f64;

    if avg_diff == 0.0 {
        100
    } else if avg_diff <= 1.0 {
        85
    } else if avg_diff <= 2.0 {
        70
    } else if avg_diff <= 3.0 {
        50
    } else {
        30
    }
}

/// Activity level from the pair's average completed-session count
pub fn activity_level(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    let avg = (a.activity_stats as f64 + b.activity_stats as f64) / 2.0;

    if avg >= 20.0 {
        100
    } else if avg >= 10.0 {
        80
    } else if avg >= 5.0 {
        60
    } else if avg >= 1.0 {
        40
    } else {
        20
    }
}

/// Location bonus from free-text locations
///
/// The trailing comma-separated token is treated as the country.
pub fn location_bonus(a: &MatchingProfile, b: &MatchingProfile) -> u8 {
    let loc_a = a.location.trim();
    let loc_b = b.location.trim();

    if loc_a.is_empty() || loc_b.is_empty() {
        return NEUTRAL;
    }

    if loc_a.to_lowercase() == loc_b.to_lowercase() {
        return 100;
    }

    if country_of(loc_a) == country_of(loc_b) {
        return 75;
    }

    NEUTRAL
}

fn country_of(location: &str) -> String {
    location
        .rsplit(',')
        .next()
        .unwrap_or(location)
        .trim()
        .to_lowercase()
}

fn intersects(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    a.intersection(b).next().is_some()
}
