use crate::models::{AccountRecord, CompatibilityResult};
use std::collections::HashSet;

/// Check whether an account may appear in a viewer's candidate pool
///
/// Candidates must have completed onboarding, recorded at least one
/// native or learning language, and be neither the viewer nor one of the
/// viewer's existing connections.
#[inline]
pub fn is_eligible_candidate(
    account: &AccountRecord,
    viewer_id: &str,
    excluded: &HashSet<String>,
) -> bool {
    if account.id == viewer_id || excluded.contains(&account.id) {
        return false;
    }

    account.onboarding_completed && account.has_languages()
}

/// Check whether a result clears the minimum-viability threshold
#[inline]
pub fn is_viable(result: &CompatibilityResult, min_viable_score: u8) -> bool {
    result.overall_score > min_viable_score
}
