//! Profile aggregation: turns raw account, progress and preference records
//! into the single `MatchingProfile` shape the scoring core works on.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AccountRecord, LanguageProficiency, LearnerRecords, LearningGoal, MatchingProfile,
    PreferenceRecord, ProgressRecord,
};
use crate::services::account::{AccountDirectory, DirectoryError};
use crate::services::cache::{CacheKey, CacheManager};

/// Errors that can occur while resolving a matching profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Failed to build profile for {user_id}: {source}")]
    Computation {
        user_id: String,
        #[source]
        source: DirectoryError,
    },
}

/// Profile data the matching engine consumes
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_matching_profile(&self, user_id: &str) -> Result<MatchingProfile, ProfileError>;

    async fn get_connections(&self, user_id: &str) -> Result<HashSet<String>, ProfileError>;

    async fn list_eligible_candidates(
        &self,
        viewer_id: &str,
        exclude_ids: &HashSet<String>,
        cap: usize,
    ) -> Result<Vec<String>, ProfileError>;
}

/// Builds matching profiles from an account directory, with an optional
/// snapshot cache in front of it
pub struct ProfileAggregator {
    directory: Arc<dyn AccountDirectory>,
    cache: Option<Arc<CacheManager>>,
}

impl ProfileAggregator {
    pub fn new(directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            directory,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn fetch_records(&self, user_id: &str) -> Result<LearnerRecords, ProfileError> {
        let computation = |source| ProfileError::Computation {
            user_id: user_id.to_string(),
            source,
        };

        let account = self
            .directory
            .fetch_account(user_id)
            .await
            .map_err(computation)?
            .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))?;

        let (progress, preferences) = tokio::join!(
            self.directory.fetch_progress(user_id),
            self.directory.fetch_preferences(user_id),
        );

        Ok(LearnerRecords {
            account,
            progress: progress.map_err(computation)?,
            preferences: preferences.map_err(computation)?,
        })
    }
}

#[async_trait]
impl ProfileSource for ProfileAggregator {
    async fn get_matching_profile(&self, user_id: &str) -> Result<MatchingProfile, ProfileError> {
        let key = CacheKey::profile(user_id);

        if let Some(cache) = &self.cache {
            if let Ok(profile) = cache.get::<MatchingProfile>(&key).await {
                return Ok(profile);
            }
        }

        let records = self.fetch_records(user_id).await?;
        let profile = build_matching_profile(records);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &profile).await {
                tracing::warn!("Failed to cache profile for {}: {}", user_id, e);
            }
        }

        Ok(profile)
    }

    async fn get_connections(&self, user_id: &str) -> Result<HashSet<String>, ProfileError> {
        let key = CacheKey::connections(user_id);

        if let Some(cache) = &self.cache {
            if let Ok(connections) = cache.get::<HashSet<String>>(&key).await {
                return Ok(connections);
            }
        }

        let connections: HashSet<String> = self
            .directory
            .fetch_connections(user_id)
            .await
            .map_err(|source| ProfileError::Computation {
                user_id: user_id.to_string(),
                source,
            })?
            .into_iter()
            .collect();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &connections).await {
                tracing::warn!("Failed to cache connections for {}: {}", user_id, e);
            }
        }

        Ok(connections)
    }

    async fn list_eligible_candidates(
        &self,
        viewer_id: &str,
        exclude_ids: &HashSet<String>,
        cap: usize,
    ) -> Result<Vec<String>, ProfileError> {
        self.directory
            .list_eligible(viewer_id, exclude_ids, cap)
            .await
            .map_err(|source| ProfileError::Computation {
                user_id: viewer_id.to_string(),
                source,
            })
    }
}

/// Merge a learner's records into one matching profile
///
/// Missing auxiliary records leave the corresponding fields empty.
pub fn build_matching_profile(records: LearnerRecords) -> MatchingProfile {
    let LearnerRecords {
        account,
        progress,
        preferences,
    } = records;
    let AccountRecord {
        id,
        native_languages,
        learning_languages,
        location,
        last_active,
        ..
    } = account;
    let PreferenceRecord {
        availability,
        learning_goals,
    } = preferences.unwrap_or_default();

    let activity_stats = progress.iter().map(|p| p.sessions_completed).sum();
    let proficiency_by_language = normalize_progress(&id, &progress);

    MatchingProfile {
        native_languages: clean_tags(native_languages),
        learning_languages: clean_tags(learning_languages),
        proficiency_by_language,
        learning_goals: normalize_goals(learning_goals),
        availability: clean_tags(availability),
        location: location.map(|l| l.trim().to_string()).unwrap_or_default(),
        last_active,
        activity_stats,
        id,
    }
}

fn normalize_progress(user_id: &str, progress: &[ProgressRecord]) -> BTreeMap<String, LanguageProficiency> {
    let mut by_language = BTreeMap::new();

    for record in progress {
        let language = record.language.trim();
        if language.is_empty() {
            continue;
        }
        match record.level.normalize() {
            Ok(level) => {
                by_language.insert(
                    language.to_string(),
                    LanguageProficiency {
                        level,
                        started_at: record.started_at,
                    },
                );
            }
            Err(e) => {
                tracing::warn!("Ignoring progress for {} in {}: {}", user_id, language, e);
            }
        }
    }

    by_language
}

fn normalize_goals(goals: Vec<LearningGoal>) -> Vec<LearningGoal> {
    goals
        .into_iter()
        .filter_map(|goal| {
            let language = goal.language.trim().to_string();
            if language.is_empty() {
                return None;
            }
            Some(LearningGoal {
                language,
                goals: clean_tags(goal.goals),
                priority: goal.priority,
            })
        })
        .collect()
}

fn clean_tags<I: IntoIterator<Item = String>>(tags: I) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProficiencyLevel, RawProficiency};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeDirectory {
        accounts: HashMap<String, AccountRecord>,
        progress: HashMap<String, Vec<ProgressRecord>>,
        preferences: HashMap<String, PreferenceRecord>,
        broken_progress: bool,
        account_fetches: AtomicUsize,
        connection_fetches: AtomicUsize,
    }

    #[async_trait]
    impl AccountDirectory for FakeDirectory {
        async fn fetch_account(&self, user_id: &str) -> Result<Option<AccountRecord>, DirectoryError> {
            self.account_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.accounts.get(user_id).cloned())
        }

        async fn fetch_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, DirectoryError> {
            if self.broken_progress {
                return Err(DirectoryError::ApiError("progress store down".into()));
            }
            Ok(self.progress.get(user_id).cloned().unwrap_or_default())
        }

        async fn fetch_preferences(&self, user_id: &str) -> Result<Option<PreferenceRecord>, DirectoryError> {
            Ok(self.preferences.get(user_id).cloned())
        }

        async fn fetch_connections(&self, _user_id: &str) -> Result<Vec<String>, DirectoryError> {
            self.connection_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["u2".to_string(), "u2".to_string()])
        }

        async fn list_eligible(
            &self,
            _viewer_id: &str,
            _exclude_ids: &HashSet<String>,
            _cap: usize,
        ) -> Result<Vec<String>, DirectoryError> {
            Ok(vec![])
        }
    }

    fn account(id: &str) -> AccountRecord {
        AccountRecord {
            id: id.to_string(),
            native_languages: vec![" Spanish ".to_string(), "".to_string()],
            learning_languages: vec!["English".to_string()],
            location: Some(" Madrid, Spain ".to_string()),
            last_active: None,
            onboarding_completed: true,
        }
    }

    fn progress(language: &str, level: RawProficiency, sessions: u32) -> ProgressRecord {
        ProgressRecord {
            language: language.to_string(),
            level,
            started_at: None,
            sessions_completed: sessions,
        }
    }

    #[test]
    fn test_profile_from_account_only() {
        let profile = build_matching_profile(LearnerRecords {
            account: account("u1"),
            progress: vec![],
            preferences: None,
        });

        assert_eq!(profile.id, "u1");
        assert_eq!(profile.native_languages.iter().collect::<Vec<_>>(), vec!["Spanish"]);
        assert_eq!(profile.location, "Madrid, Spain");
        assert!(profile.availability.is_empty());
        assert!(profile.learning_goals.is_empty());
        assert!(profile.proficiency_by_language.is_empty());
        assert_eq!(profile.activity_stats, 0);
    }

    #[test]
    fn test_progress_shapes_normalized_and_sessions_summed() {
        let profile = build_matching_profile(LearnerRecords {
            account: account("u1"),
            progress: vec![
                progress("English", RawProficiency::Tag("B2".into()), 7),
                progress("French", RawProficiency::Wrapped { level: "beginner".into() }, 3),
                progress("German", RawProficiency::Tag("expert".into()), 2),
            ],
            preferences: Some(PreferenceRecord {
                availability: vec!["Evenings".into(), " ".into()],
                learning_goals: vec![],
            }),
        });

        assert_eq!(profile.proficiency_by_language["English"].level, ProficiencyLevel::B2);
        assert_eq!(profile.proficiency_by_language["French"].level, ProficiencyLevel::Beginner);
        assert!(!profile.proficiency_by_language.contains_key("German"));
        assert_eq!(profile.activity_stats, 12);
        assert_eq!(profile.availability.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let aggregator = ProfileAggregator::new(Arc::new(FakeDirectory::default()));

        let err = aggregator.get_matching_profile("ghost").await.unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_auxiliary_fault_is_computation_error() {
        let mut directory = FakeDirectory { broken_progress: true, ..FakeDirectory::default() };
        directory.accounts.insert("u1".into(), account("u1"));
        let aggregator = ProfileAggregator::new(Arc::new(directory));

        let err = aggregator.get_matching_profile("u1").await.unwrap_err();
        assert!(matches!(err, ProfileError::Computation { .. }));
    }

    #[tokio::test]
    async fn test_cached_profile_skips_directory() {
        let mut directory = FakeDirectory::default();
        directory.accounts.insert("u1".into(), account("u1"));
        let directory = Arc::new(directory);

        let aggregator = ProfileAggregator::new(directory.clone())
            .with_cache(Arc::new(CacheManager::local(100, 60)));

        let first = aggregator.get_matching_profile("u1").await.unwrap();
        let second = aggregator.get_matching_profile("u1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(directory.account_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connections_deduplicated() {
        let aggregator = ProfileAggregator::new(Arc::new(FakeDirectory::default()));
        let connections = aggregator.get_connections("u1").await.unwrap();
        assert_eq!(connections.len(), 1);
    }

    #[tokio::test]
    async fn test_cached_connections_skip_directory() {
        let directory = Arc::new(FakeDirectory::default());
        let aggregator = ProfileAggregator::new(directory.clone())
            .with_cache(Arc::new(CacheManager::local(100, 60)));

        let first = aggregator.get_connections("u1").await.unwrap();
        let second = aggregator.get_connections("u1").await.unwrap();

        assert_eq!(first, second);
        assert!(second.contains("u2"));
        assert_eq!(directory.connection_fetches.load(Ordering::SeqCst), 1);
    }
}
