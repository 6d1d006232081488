use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;

use crate::core::Matcher;
use crate::models::{CompatibilityResult, MatchingProfile};
use crate::services::aggregator::{ProfileError, ProfileSource};
use crate::services::pool::CandidatePoolBuilder;

/// Errors surfaced to callers of the matching service
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Viewer not found: {0}")]
    ViewerNotFound(String),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),

    #[error("Matching computation failed: {0}")]
    Computation(#[source] ProfileError),
}

impl MatchingError {
    fn for_viewer(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(id) => MatchingError::ViewerNotFound(id),
            other => MatchingError::Computation(other),
        }
    }

    fn for_candidate(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(id) => MatchingError::CandidateNotFound(id),
            other => MatchingError::Computation(other),
        }
    }
}

/// Ranked recommendations for one viewer
#[derive(Debug)]
pub struct Recommendations {
    pub matches: Vec<CompatibilityResult>,
    pub total_candidates: usize,
    /// Candidates dropped because their profile could not be resolved
    pub skipped: usize,
}

/// Async entry points of the matching engine
///
/// Profile fetching is the only step touching external data; scoring and
/// ranking are delegated to the pure [`Matcher`].
#[derive(Clone)]
pub struct MatchingService {
    source: Arc<dyn ProfileSource>,
    matcher: Matcher,
    fetch_concurrency: usize,
}

impl MatchingService {
    pub fn new(source: Arc<dyn ProfileSource>, matcher: Matcher, fetch_concurrency: usize) -> Self {
        Self {
            source,
            matcher,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Bulk recommendation: ranked practice partners for a viewer
    pub async fn find_matches(
        &self,
        viewer_id: &str,
        limit: Option<usize>,
    ) -> Result<Recommendations, MatchingError> {
        let rules = self.matcher.rules();
        let limit = rules.effective_limit(limit);

        let viewer = self
            .source
            .get_matching_profile(viewer_id)
            .await
            .map_err(MatchingError::for_viewer)?;

        let pool = CandidatePoolBuilder::new(rules.candidate_pool_cap)
            .build(self.source.as_ref(), viewer_id)
            .await
            .map_err(MatchingError::Computation)?;

        let total_candidates = pool.candidate_ids.len();
        let (profiles, skipped) = self.resolve_candidates(pool.candidate_ids).await;

        let result = self.matcher.rank(&viewer, &profiles, limit);

        tracing::info!(
            "Returning {} matches for {} (pool: {}, skipped: {})",
            result.matches.len(),
            viewer_id,
            total_candidates,
            skipped
        );

        Ok(Recommendations {
            matches: result.matches,
            total_candidates,
            skipped,
        })
    }

    /// Pairwise explanation for one specific viewer/candidate pair
    pub async fn explain(
        &self,
        viewer_id: &str,
        candidate_id: &str,
    ) -> Result<CompatibilityResult, MatchingError> {
        let (viewer, candidate) = tokio::join!(
            self.source.get_matching_profile(viewer_id),
            self.source.get_matching_profile(candidate_id),
        );

        let viewer = viewer.map_err(MatchingError::for_viewer)?;
        let candidate = candidate.map_err(MatchingError::for_candidate)?;

        Ok(self.matcher.explain(&viewer, &candidate))
    }

    /// Fetch candidate profiles concurrently, skipping those that fail
    async fn resolve_candidates(&self, ids: Vec<String>) -> (Vec<MatchingProfile>, usize) {
        let source = &self.source;
        let outcomes: Vec<Result<MatchingProfile, ProfileError>> = stream::iter(ids)
            .map(|id| async move { source.get_matching_profile(&id).await })
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

        let mut profiles = Vec::with_capacity(outcomes.len());
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                Ok(profile) => profiles.push(profile),
                Err(e) => {
                    tracing::warn!("Skipping candidate: {}", e);
                    skipped += 1;
                }
            }
        }

        (profiles, skipped)
    }
}
