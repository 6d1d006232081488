// Unit tests for Tandem Match scoring

use std::collections::BTreeSet;

use tandem_match::core::{
    calculate_breakdown, calculate_compatibility, combine_scores,
    subscores::{availability_match, language_compatibility},
};
use tandem_match::models::{LearningGoal, MatchingProfile, ScoreBreakdown, ScoringWeights};

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn goal(language: &str, tags: &[&str]) -> LearningGoal {
    LearningGoal {
        language: language.to_string(),
        goals: set(tags),
        priority: 1,
    }
}

fn madrid_learner() -> MatchingProfile {
    MatchingProfile {
        native_languages: set(&["Spanish"]),
        learning_languages: set(&["English"]),
        availability: set(&["Evenings", "Weekends"]),
        learning_goals: vec![goal("Spanish", &["Conversation", "Travel"])],
        location: "Madrid, Spain".to_string(),
        ..MatchingProfile::new("a")
    }
}

fn barcelona_learner() -> MatchingProfile {
    MatchingProfile {
        native_languages: set(&["English"]),
        learning_languages: set(&["Spanish"]),
        availability: set(&["Evenings"]),
        learning_goals: vec![goal("Spanish", &["Conversation"])],
        location: "Barcelona, Spain".to_string(),
        ..MatchingProfile::new("b")
    }
}

#[test]
fn test_reciprocal_exchange_scenario() {
    let a = madrid_learner();
    let b = barcelona_learner();

    let breakdown = calculate_breakdown(&a, &b);
    assert_eq!(
        breakdown,
        ScoreBreakdown {
            language_compatibility: 100,
            availability_match: 50,
            goals_alignment: 75,
            experience_match: 70,
            activity_level: 20,
            location_bonus: 75,
        }
    );

    let result = calculate_compatibility(&a, &b, &ScoringWeights::default(), 4);
    assert_eq!(result.overall_score, 76);
    assert_eq!(
        result.reasons,
        vec![
            "Perfect language exchange: you can help with Spanish while they help you with English",
            "Shared goals: Conversation",
            "You're in the same area",
        ]
    );
}

#[test]
fn test_no_overlap_lands_just_above_threshold() {
    let a = MatchingProfile {
        native_languages: set(&["Japanese"]),
        learning_languages: set(&["Korean"]),
        ..MatchingProfile::new("a")
    };
    let b = MatchingProfile {
        native_languages: set(&["Portuguese"]),
        learning_languages: set(&["German"]),
        ..MatchingProfile::new("b")
    };

    let breakdown = calculate_breakdown(&a, &b);
    assert_eq!(breakdown.language_compatibility, 0);
    assert_eq!(breakdown.availability_match, 50);
    assert_eq!(breakdown.goals_alignment, 50);
    assert_eq!(breakdown.experience_match, 70);
    assert_eq!(breakdown.activity_level, 20);
    assert_eq!(breakdown.location_bonus, 50);

    assert_eq!(combine_scores(&breakdown, &ScoringWeights::default()), 31);
}

#[test]
fn test_scores_are_symmetric() {
    let a = madrid_learner();
    let b = barcelona_learner();

    let ab = calculate_compatibility(&a, &b, &ScoringWeights::default(), 4);
    let ba = calculate_compatibility(&b, &a, &ScoringWeights::default(), 4);

    assert_eq!(ab.overall_score, ba.overall_score);
    assert_eq!(ab.score_breakdown, ba.score_breakdown);
}

#[test]
fn test_reciprocal_always_scores_full_language() {
    let mut a = madrid_learner();
    let mut b = barcelona_learner();
    a.learning_languages.insert("French".to_string());
    b.native_languages.insert("French".to_string());
    b.learning_languages.insert("Italian".to_string());

    assert_eq!(language_compatibility(&a, &b), 100);
}

#[test]
fn test_empty_availability_is_neutral() {
    let mut a = madrid_learner();
    let mut b = barcelona_learner();
    a.availability.clear();
    b.availability.clear();

    assert_eq!(availability_match(&a, &b), 50);
}

#[test]
fn test_range_and_reason_cap_over_varied_pairs() {
    let languages = ["English", "Spanish", "French", "German"];
    let slots = ["Mornings", "Evenings", "Weekends", "Lunch"];
    let locations = ["", "Paris, France", "Lyon, France", "Berlin, Germany"];

    let profiles: Vec<MatchingProfile> = (0..32)
        .map(|i| MatchingProfile {
            native_languages: set(&[languages[i % 4]]),
            learning_languages: set(&[languages[(i / 4) % 4]]),
            availability: slots.iter().take(i % 5).map(|s| s.to_string()).collect(),
            learning_goals: if i % 3 == 0 {
                vec![]
            } else {
                vec![goal(languages[(i / 4) % 4], &["Conversation", "Exams"][..(i % 2) + 1])]
            },
            location: locations[i % 4].to_string(),
            activity_stats: (i * 3) as u32,
            ..MatchingProfile::new(format!("p{}", i))
        })
        .collect();

    for a in &profiles {
        for b in &profiles {
            let result = calculate_compatibility(a, b, &ScoringWeights::default(), 4);
            let s = result.score_breakdown;
            for sub in [
                s.language_compatibility,
                s.availability_match,
                s.goals_alignment,
                s.experience_match,
                s.activity_level,
                s.location_bonus,
            ] {
                assert!(sub <= 100);
            }
            assert!(result.overall_score <= 100);
            assert!(result.reasons.len() <= 4);
        }
    }
}

#[test]
fn test_explain_is_deterministic() {
    let a = madrid_learner();
    let b = barcelona_learner();

    let first = calculate_compatibility(&a, &b, &ScoringWeights::default(), 4);
    for _ in 0..10 {
        assert_eq!(calculate_compatibility(&a, &b, &ScoringWeights::default(), 4), first);
    }
}
