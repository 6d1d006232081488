use crate::core::filters::is_eligible_candidate;
use crate::models::{AccountRecord, PreferenceRecord, ProgressRecord};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the account service
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Raw record access for learner accounts
///
/// Absent records are `Ok(None)` / empty, never errors.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn fetch_account(&self, user_id: &str) -> Result<Option<AccountRecord>, DirectoryError>;

    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, DirectoryError>;

    async fn fetch_preferences(&self, user_id: &str) -> Result<Option<PreferenceRecord>, DirectoryError>;

    async fn fetch_connections(&self, user_id: &str) -> Result<Vec<String>, DirectoryError>;

    /// Onboarded accounts with at least one language, minus `exclude_ids`
    async fn list_eligible(
        &self,
        viewer_id: &str,
        exclude_ids: &HashSet<String>,
        cap: usize,
    ) -> Result<Vec<String>, DirectoryError>;
}

/// Account service API client
///
/// Handles all communication with the account service including:
/// - Fetching account, progress and preference records
/// - Fetching a learner's connections
/// - Listing eligible candidates
pub struct AccountServiceClient {
    base_url: String,
    api_key: String,
    project_id: String,
    client: Client,
}

impl AccountServiceClient {
    /// Create a new account service client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        timeout_secs: u64,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET a JSON document, mapping 404 to `None`
    async fn get_json(&self, url: &str) -> Result<Option<Value>, DirectoryError> {
        tracing::debug!("Fetching from account service: {}", url);

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .header("X-Project-Id", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DirectoryError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Account service request failed: {} - {}", status, body);
            return Err(DirectoryError::ApiError(format!("{} returned {}", url, status)));
        }

        Ok(Some(response.json().await?))
    }

    /// Parse the `documents` array out of a list response
    fn documents<T: DeserializeOwned>(json: &Value, what: &str) -> Result<Vec<T>, DirectoryError> {
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

        documents
            .iter()
            .map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone())
                    .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
            })
            .collect()
    }
}

#[async_trait]
impl AccountDirectory for AccountServiceClient {
    async fn fetch_account(&self, user_id: &str) -> Result<Option<AccountRecord>, DirectoryError> {
        let url = self.url(&format!("accounts/{}", urlencoding::encode(user_id)));

        let Some(json) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let data = json.get("data").unwrap_or(&json);
        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse account: {}", e)))
    }

    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, DirectoryError> {
        let url = self.url(&format!("accounts/{}/progress", urlencoding::encode(user_id)));

        match self.get_json(&url).await? {
            Some(json) => Self::documents(&json, "progress"),
            None => Ok(vec![]),
        }
    }

    async fn fetch_preferences(&self, user_id: &str) -> Result<Option<PreferenceRecord>, DirectoryError> {
        let url = self.url(&format!("accounts/{}/preferences", urlencoding::encode(user_id)));

        let Some(json) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let data = json.get("data").unwrap_or(&json);
        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| DirectoryError::InvalidResponse(format!("Failed to parse preferences: {}", e)))
    }

    async fn fetch_connections(&self, user_id: &str) -> Result<Vec<String>, DirectoryError> {
        let url = self.url(&format!("accounts/{}/connections", urlencoding::encode(user_id)));

        let Some(json) = self.get_json(&url).await? else {
            return Ok(vec![]);
        };

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents
            .iter()
            .filter_map(|doc| doc.get("userId").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect())
    }

    async fn list_eligible(
        &self,
        viewer_id: &str,
        exclude_ids: &HashSet<String>,
        cap: usize,
    ) -> Result<Vec<String>, DirectoryError> {
        let mut exclude: Vec<&str> = exclude_ids.iter().map(String::as_str).collect();
        exclude.push(viewer_id);
        exclude.sort_unstable();
        exclude.dedup();

        let url = format!(
            "{}?onboarded=true&limit={}&exclude={}",
            self.url("accounts"),
            cap,
            urlencoding::encode(&exclude.join(","))
        );

        let json = self
            .get_json(&url)
            .await?
            .ok_or_else(|| DirectoryError::ApiError("Account listing endpoint not found".into()))?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        // Remote filtering is advisory; re-apply eligibility here
        let accounts: Vec<AccountRecord> = Self::documents(&json, "account")?;
        let ids: Vec<String> = accounts
            .into_iter()
            .filter(|account| is_eligible_candidate(account, viewer_id, exclude_ids))
            .map(|account| account.id)
            .take(cap)
            .collect();

        tracing::debug!("Listed {} eligible candidates (total: {})", ids.len(), total);

        Ok(ids)
    }
}
