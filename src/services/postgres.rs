use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CompatibilityResult, ScoreBreakdown};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// A stored compatibility result with the time it was calculated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCompatibility {
    #[serde(flatten)]
    pub result: CompatibilityResult,
    #[serde(rename = "calculatedAt")]
    pub calculated_at: chrono::DateTime<chrono::Utc>,
}

/// PostgreSQL client for last-calculated compatibility scores
///
/// Scores are always recomputed on request; this store only records the
/// most recent result per pair for later inspection.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            acquire_timeout_secs.unwrap_or(5),
            idle_timeout_secs.unwrap_or(600),
        )
        .await
    }

    /// Record the latest result for a viewer/candidate pair
    ///
    /// Uses INSERT ... ON CONFLICT so that each pair keeps one row.
    pub async fn record_compatibility(&self, result: &CompatibilityResult) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO compatibility_scores
                (viewer_id, candidate_id, overall_score, breakdown, reasons, calculated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (viewer_id, candidate_id)
            DO UPDATE SET
                overall_score = EXCLUDED.overall_score,
                breakdown = EXCLUDED.breakdown,
                reasons = EXCLUDED.reasons,
                calculated_at = EXCLUDED.calculated_at
        "#;

        sqlx::query(query)
            .bind(&result.viewer_id)
            .bind(&result.candidate_id)
            .bind(result.overall_score as i16)
            .bind(Json(&result.score_breakdown))
            .bind(Json(&result.reasons))
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded compatibility {} -> {}: {}",
            result.viewer_id,
            result.candidate_id,
            result.overall_score
        );

        Ok(())
    }

    /// Fetch the last recorded result for a pair, if any
    pub async fn get_last_compatibility(
        &self,
        viewer_id: &str,
        candidate_id: &str,
    ) -> Result<Option<StoredCompatibility>, PostgresError> {
        let query = r#"
            SELECT viewer_id, candidate_id, overall_score, breakdown, reasons, calculated_at
            FROM compatibility_scores
            WHERE viewer_id = $1 AND candidate_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(viewer_id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let overall_score: i16 = row.try_get("overall_score")?;
        let breakdown: Json<ScoreBreakdown> = row.try_get("breakdown")?;
        let reasons: Json<Vec<String>> = row.try_get("reasons")?;

        Ok(Some(StoredCompatibility {
            result: CompatibilityResult {
                viewer_id: row.try_get("viewer_id")?,
                candidate_id: row.try_get("candidate_id")?,
                overall_score: overall_score.clamp(0, 100) as u8,
                score_breakdown: breakdown.0,
                reasons: reasons.0,
            },
            calculated_at: row.try_get("calculated_at")?,
        }))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
