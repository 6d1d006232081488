// Core algorithm exports
pub mod filters;
pub mod matcher;
pub mod reasons;
pub mod scoring;
pub mod subscores;

pub use filters::{is_eligible_candidate, is_viable};
pub use matcher::{MatchResult, Matcher};
pub use reasons::{generate_reasons, MAX_REASONS};
pub use scoring::{calculate_breakdown, calculate_compatibility, combine_scores};
