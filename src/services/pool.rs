use std::collections::HashSet;

use crate::services::aggregator::{ProfileError, ProfileSource};

/// Bounded set of candidate ids considered for one viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    pub viewer_id: String,
    pub candidate_ids: Vec<String>,
    pub excluded: usize,
}

/// Selects eligible candidates for a viewer
///
/// The cap only bounds the cost of pairwise scoring; a larger pool
/// simply costs more compute.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePoolBuilder {
    cap: usize,
}

impl CandidatePoolBuilder {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    pub async fn build(&self, source: &dyn ProfileSource, viewer_id: &str) -> Result<CandidatePool, ProfileError> {
        let connections = source.get_connections(viewer_id).await?;

        let listed = source
            .list_eligible_candidates(viewer_id, &connections, self.cap)
            .await?;

        // The source is asked to exclude these already; enforce it regardless
        let mut seen = HashSet::new();
        let candidate_ids: Vec<String> = listed
            .into_iter()
            .filter(|id| id != viewer_id && !connections.contains(id))
            .filter(|id| seen.insert(id.clone()))
            .take(self.cap)
            .collect();

        tracing::debug!(
            "Built candidate pool of {} for {} ({} connections excluded)",
            candidate_ids.len(),
            viewer_id,
            connections.len()
        );

        Ok(CandidatePool {
            viewer_id: viewer_id.to_string(),
            candidate_ids,
            excluded: connections.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchingProfile;
    use async_trait::async_trait;

    struct RepeatingSource;

    #[async_trait]
    impl ProfileSource for RepeatingSource {
        async fn get_matching_profile(&self, user_id: &str) -> Result<MatchingProfile, ProfileError> {
            Ok(MatchingProfile::new(user_id))
        }

        async fn get_connections(&self, _user_id: &str) -> Result<HashSet<String>, ProfileError> {
            Ok(["blocked".to_string()].into_iter().collect())
        }

        async fn list_eligible_candidates(
            &self,
            _viewer_id: &str,
            _exclude_ids: &HashSet<String>,
            _cap: usize,
        ) -> Result<Vec<String>, ProfileError> {
            Ok(["me", "x", "blocked", "x", "y", "z"].iter().map(|s| s.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn test_pool_is_deduplicated_and_capped() {
        let pool = CandidatePoolBuilder::new(2).build(&RepeatingSource, "me").await.unwrap();

        assert_eq!(pool.candidate_ids, vec!["x", "y"]);
        assert_eq!(pool.excluded, 1);
    }
}
