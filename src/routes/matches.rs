use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::models::{
    ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, PairQuery,
    RankProfilesRequest, RankProfilesResponse,
};
use crate::services::{MatchingError, MatchingService, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matching: MatchingService,
    /// Store for last-calculated scores; absent when running without a database
    pub postgres: Option<Arc<PostgresClient>>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/explain", web::get().to(explain_match))
        .route("/matches/last", web::get().to(last_compatibility))
        .route("/matches/rank", web::post().to(rank_profiles));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn matching_error_response(err: &MatchingError) -> HttpResponse {
    use actix_web::http::StatusCode;

    match err {
        MatchingError::ViewerNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Viewer not found", err.to_string())
        }
        MatchingError::CandidateNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "Candidate not found", err.to_string())
        }
        MatchingError::Computation(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Matching failed", err.to_string())
        }
    }
}

fn validation_response(errors: validator::ValidationErrors) -> HttpResponse {
    error_response(
        actix_web::http::StatusCode::BAD_REQUEST,
        "Validation failed",
        errors.to_string(),
    )
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 10
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return validation_response(errors);
    }

    let user_id = &req.user_id;
    let limit = req.limit.map(usize::from);

    tracing::info!("Finding matches for user: {}, limit: {:?}", user_id, limit);

    match state.matching.find_matches(user_id, limit).await {
        Ok(recommendations) => HttpResponse::Ok().json(FindMatchesResponse {
            matches: recommendations.matches,
            total_candidates: recommendations.total_candidates,
            skipped: recommendations.skipped,
        }),
        Err(e) => {
            tracing::error!("Failed to find matches for {}: {}", user_id, e);
            matching_error_response(&e)
        }
    }
}

/// Pairwise explanation endpoint
///
/// GET /api/v1/matches/explain?viewerId={viewerId}&candidateId={candidateId}
///
/// The result is also stored as the pair's last-calculated score.
async fn explain_match(
    state: web::Data<AppState>,
    query: web::Query<PairQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }

    let result = match state.matching.explain(&query.viewer_id, &query.candidate_id).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                "Failed to explain {} -> {}: {}",
                query.viewer_id,
                query.candidate_id,
                e
            );
            return matching_error_response(&e);
        }
    };

    // Best effort: the caller gets the fresh result either way
    if let Some(postgres) = &state.postgres {
        if let Err(e) = postgres.record_compatibility(&result).await {
            tracing::warn!("Failed to store compatibility score: {}", e);
        }
    }

    HttpResponse::Ok().json(result)
}

/// Last stored score for a pair
///
/// GET /api/v1/matches/last?viewerId={viewerId}&candidateId={candidateId}
async fn last_compatibility(
    state: web::Data<AppState>,
    query: web::Query<PairQuery>,
) -> impl Responder {
    use actix_web::http::StatusCode;

    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }

    let Some(postgres) = &state.postgres else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Score store unavailable",
            "No database configured".to_string(),
        );
    };

    match postgres.get_last_compatibility(&query.viewer_id, &query.candidate_id).await {
        Ok(Some(stored)) => HttpResponse::Ok().json(stored),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "No stored score",
            format!("No score recorded for {} -> {}", query.viewer_id, query.candidate_id),
        ),
        Err(e) => {
            tracing::error!("Failed to read stored score: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read stored score", e.to_string())
        }
    }
}

/// In-memory ranking of already-fetched profiles
///
/// POST /api/v1/matches/rank
///
/// No pool exclusion or cap is applied; only the viability threshold.
async fn rank_profiles(
    state: web::Data<AppState>,
    req: web::Json<RankProfilesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_response(errors);
    }

    let matcher = state.matching.matcher().clone();
    let RankProfilesRequest { viewer, candidates, limit } = req.into_inner();
    let limit = matcher.rules().effective_limit(limit.map(usize::from));

    // Scoring fans out over rayon; keep it off the async worker
    match web::block(move || matcher.rank(&viewer, &candidates, limit)).await {
        Ok(result) => HttpResponse::Ok().json(RankProfilesResponse {
            matches: result.matches,
            total_candidates: result.total_candidates,
        }),
        Err(e) => {
            tracing::error!("Ranking task failed: {}", e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Ranking failed",
                e.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Matcher;
    use crate::models::{CompatibilityResult, MatchingProfile};
    use crate::services::{ProfileError, ProfileSource};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};

    struct StaticSource {
        profiles: HashMap<String, MatchingProfile>,
    }

    #[async_trait]
    impl ProfileSource for StaticSource {
        async fn get_matching_profile(&self, user_id: &str) -> Result<MatchingProfile, ProfileError> {
            self.profiles
                .get(user_id)
                .cloned()
                .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))
        }

        async fn get_connections(&self, _user_id: &str) -> Result<HashSet<String>, ProfileError> {
            Ok(HashSet::new())
        }

        async fn list_eligible_candidates(
            &self,
            _viewer_id: &str,
            _exclude_ids: &HashSet<String>,
            cap: usize,
        ) -> Result<Vec<String>, ProfileError> {
            let mut ids: Vec<String> = self.profiles.keys().cloned().collect();
            ids.sort();
            ids.truncate(cap);
            Ok(ids)
        }
    }

    fn learner(id: &str, native: &str, learning: &str) -> MatchingProfile {
        MatchingProfile {
            native_languages: [native.to_string()].into_iter().collect(),
            learning_languages: [learning.to_string()].into_iter().collect(),
            ..MatchingProfile::new(id)
        }
    }

    fn state() -> AppState {
        let profiles = [
            learner("ana", "Spanish", "English"),
            learner("ben", "English", "Spanish"),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

        AppState {
            matching: MatchingService::new(Arc::new(StaticSource { profiles }), Matcher::with_defaults(), 4),
            postgres: None,
        }
    }

    #[actix_web::test]
    async fn test_find_matches_route() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/find")
            .set_json(serde_json::json!({"userId": "ana"}))
            .to_request();
        let resp: FindMatchesResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.matches.len(), 1);
        assert_eq!(resp.matches[0].candidate_id, "ben");
        assert_eq!(resp.matches[0].score_breakdown.language_compatibility, 100);
    }

    #[actix_web::test]
    async fn test_explain_unknown_viewer_is_404() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/matches/explain?viewerId=ghost&candidateId=ben")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_explain_route() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/matches/explain?viewerId=ana&candidateId=ben")
            .to_request();
        let result: CompatibilityResult = test::call_and_read_body_json(&app, req).await;

        assert_eq!(result.viewer_id, "ana");
        assert!(result.reasons.len() <= 4);
    }

    #[actix_web::test]
    async fn test_rank_route_sorts_in_memory() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/rank")
            .set_json(serde_json::json!({
                "viewer": {"id": "me", "nativeLanguages": ["Spanish"], "learningLanguages": ["English"]},
                "candidates": [
                    {"id": "colearner", "nativeLanguages": ["German"], "learningLanguages": ["English"]},
                    {"id": "partner", "nativeLanguages": ["English"], "learningLanguages": ["Spanish"]}
                ]
            }))
            .to_request();
        let resp: RankProfilesResponse = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = resp.matches.iter().map(|m| m.candidate_id.as_str()).collect();
        assert_eq!(ids, vec!["partner", "colearner"]);
        assert_eq!(resp.total_candidates, 2);
    }

    #[actix_web::test]
    async fn test_find_matches_validation() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/find")
            .set_json(serde_json::json!({"userId": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_rank_route_applies_limit() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/rank")
            .set_json(serde_json::json!({
                "viewer": {"id": "me", "nativeLanguages": ["Spanish"], "learningLanguages": ["English"]},
                "candidates": [
                    {"id": "colearner", "nativeLanguages": ["German"], "learningLanguages": ["English"]},
                    {"id": "partner", "nativeLanguages": ["English"], "learningLanguages": ["Spanish"]}
                ],
                "limit": 1
            }))
            .to_request();
        let resp: RankProfilesResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.matches.len(), 1);
        assert_eq!(resp.matches[0].candidate_id, "partner");
        assert_eq!(resp.total_candidates, 2);
    }
}
