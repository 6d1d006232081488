use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::MatchingProfile;

/// Request for ranked practice-partner recommendations
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Query for the pairwise "why are we matched" view
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PairQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "viewer_id", rename = "viewerId")]
    pub viewer_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "candidate_id", rename = "candidateId")]
    pub candidate_id: String,
}

/// In-memory ranking of profiles the caller already holds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankProfilesRequest {
    pub viewer: MatchingProfile,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub candidates: Vec<MatchingProfile>,
    #[serde(default)]
    pub limit: Option<u16>,
}
