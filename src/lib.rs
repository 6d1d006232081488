//! Tandem Match - compatibility matching service for language exchange partners
//!
//! This library provides the compatibility engine used to recommend practice
//! partners: six sub-score calculators combined into one weighted score,
//! human-readable reasons, and ranking over a bounded candidate pool.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_compatibility, Matcher};
pub use models::{CompatibilityResult, MatchingProfile, MatchingRules, ScoreBreakdown, ScoringWeights};
pub use services::{MatchingError, MatchingService, ProfileSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let matcher = Matcher::default();
        let result = matcher.explain(&MatchingProfile::new("a"), &MatchingProfile::new("b"));
        assert!(result.overall_score <= 100);
    }
}
