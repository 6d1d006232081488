use serde::{Deserialize, Serialize};

use crate::models::domain::CompatibilityResult;

/// Response for the find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<CompatibilityResult>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    /// Candidates whose profile could not be resolved
    pub skipped: usize,
}

/// Response for the in-memory ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankProfilesResponse {
    pub matches: Vec<CompatibilityResult>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
