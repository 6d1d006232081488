use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::MAX_REASONS;
use crate::models::{MatchingRules, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub account_service: AccountServiceSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountServiceSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: None,
            ttl_secs: None,
            l1_cache_size: None,
        }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_pool_cap")]
    pub candidate_pool_cap: usize,
    #[serde(default = "default_min_viable_score")]
    pub min_viable_score: u8,
    #[serde(default = "default_max_reasons")]
    pub max_reasons: usize,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            candidate_pool_cap: default_pool_cap(),
            min_viable_score: default_min_viable_score(),
            max_reasons: default_max_reasons(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

impl MatchingSettings {
    pub fn rules(&self) -> MatchingRules {
        MatchingRules {
            min_viable_score: self.min_viable_score,
            max_reasons: self.max_reasons,
            candidate_pool_cap: self.candidate_pool_cap,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

fn default_limit() -> usize { 10 }
fn default_max_limit() -> usize { 50 }
fn default_pool_cap() -> usize { 100 }
fn default_min_viable_score() -> u8 { 30 }
fn default_max_reasons() -> usize { 4 }
fn default_fetch_concurrency() -> usize { 16 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_language_weight")]
    pub language: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
    #[serde(default = "default_goals_weight")]
    pub goals: f64,
    #[serde(default = "default_experience_weight")]
    pub experience: f64,
    #[serde(default = "default_activity_weight")]
    pub activity: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            language: default_language_weight(),
            availability: default_availability_weight(),
            goals: default_goals_weight(),
            experience: default_experience_weight(),
            activity: default_activity_weight(),
            location: default_location_weight(),
        }
    }
}

impl WeightsConfig {
    /// Convert to scoring weights, rejecting negative weights or a sum other than 1.0
    pub fn to_weights(&self) -> Result<ScoringWeights, ConfigError> {
        let weights = ScoringWeights {
            language: self.language,
            availability: self.availability,
            goals: self.goals,
            experience: self.experience,
            activity: self.activity,
            location: self.location,
        };
        weights
            .validate()
            .map_err(|e| ConfigError::Message(format!("scoring.weights: {}", e)))?;
        Ok(weights)
    }
}

fn default_language_weight() -> f64 { 0.40 }
fn default_availability_weight() -> f64 { 0.25 }
fn default_goals_weight() -> f64 { 0.15 }
fn default_experience_weight() -> f64 { 0.10 }
fn default_activity_weight() -> f64 { 0.05 }
fn default_location_weight() -> f64 { 0.05 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// Apply `LOG_LEVEL` / `LOG_FORMAT` on top of the configured values
    pub fn with_env_overrides(&self) -> Self {
        self.overridden(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok())
    }

    fn overridden(&self, level: Option<String>, format: Option<String>) -> Self {
        Self {
            level: level.filter(|l| !l.trim().is_empty()).unwrap_or_else(|| self.level.clone()),
            format: format.filter(|f| !f.trim().is_empty()).unwrap_or_else(|| self.format.clone()),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TANDEM__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TANDEM__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TANDEM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("TANDEM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.weights.to_weights()?;

        if self.matching.max_limit == 0 || self.matching.candidate_pool_cap == 0 {
            return Err(ConfigError::Message(
                "matching.max_limit and matching.candidate_pool_cap must be positive".to_string(),
            ));
        }
        if self.matching.max_reasons == 0 || self.matching.max_reasons > MAX_REASONS {
            return Err(ConfigError::Message(format!(
                "matching.max_reasons must be within 1..={}, got {}",
                MAX_REASONS, self.matching.max_reasons
            )));
        }
        if self.matching.min_viable_score > 100 {
            return Err(ConfigError::Message(
                "matching.min_viable_score must be within 0..=100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Apply well-known environment variables that do not follow the prefix scheme
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }

    builder.build()
}
