use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Proficiency level for a language being tracked
///
/// Accepts both the CEFR scale (A1..C2) and the coarser
/// beginner/intermediate/advanced/native scale used by some clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProficiencyLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    Beginner,
    Intermediate,
    Advanced,
    Native,
}

impl ProficiencyLevel {
    /// Ordinal on the CEFR scale (A1 = 1 .. C2 = 6)
    pub fn ordinal(self) -> u8 {
        match self {
            ProficiencyLevel::A1 | ProficiencyLevel::Beginner => 1,
            ProficiencyLevel::A2 => 2,
            ProficiencyLevel::B1 | ProficiencyLevel::Intermediate => 3,
            ProficiencyLevel::B2 => 4,
            ProficiencyLevel::C1 | ProficiencyLevel::Advanced => 5,
            ProficiencyLevel::C2 | ProficiencyLevel::Native => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProficiencyLevel::A1 => "A1",
            ProficiencyLevel::A2 => "A2",
            ProficiencyLevel::B1 => "B1",
            ProficiencyLevel::B2 => "B2",
            ProficiencyLevel::C1 => "C1",
            ProficiencyLevel::C2 => "C2",
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
            ProficiencyLevel::Native => "native",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown proficiency level '{0}'")]
pub struct UnknownLevel(pub String);

impl FromStr for ProficiencyLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a1" => Ok(ProficiencyLevel::A1),
            "a2" => Ok(ProficiencyLevel::A2),
            "b1" => Ok(ProficiencyLevel::B1),
            "b2" => Ok(ProficiencyLevel::B2),
            "c1" => Ok(ProficiencyLevel::C1),
            "c2" => Ok(ProficiencyLevel::C2),
            "beginner" => Ok(ProficiencyLevel::Beginner),
            "intermediate" => Ok(ProficiencyLevel::Intermediate),
            "advanced" => Ok(ProficiencyLevel::Advanced),
            "native" => Ok(ProficiencyLevel::Native),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProficiencyLevel {
    type Error = UnknownLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProficiencyLevel> for String {
    fn from(value: ProficiencyLevel) -> Self {
        value.as_str().to_string()
    }
}

/// Progress in one language: the level plus when learning started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageProficiency {
    pub level: ProficiencyLevel,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// A learner's goals for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningGoal {
    pub language: String,
    #[serde(default)]
    pub goals: BTreeSet<String>,
    #[serde(default)]
    pub priority: u8,
}

/// Unified snapshot of a learner used only during scoring
///
/// Sets are ordered so that anything derived from them (reasons, shared
/// slots, tie-breaks) is reproducible for identical inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingProfile {
    pub id: String,
    #[serde(default)]
    pub native_languages: BTreeSet<String>,
    #[serde(default)]
    pub learning_languages: BTreeSet<String>,
    #[serde(default)]
    pub proficiency_by_language: BTreeMap<String, LanguageProficiency>,
    #[serde(default)]
    pub learning_goals: Vec<LearningGoal>,
    #[serde(default)]
    pub availability: BTreeSet<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity_stats: u32,
}

impl MatchingProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn has_languages(&self) -> bool {
        !self.native_languages.is_empty() || !self.learning_languages.is_empty()
    }
}

/// Per-dimension sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub language_compatibility: u8,
    pub availability_match: u8,
    pub goals_alignment: u8,
    pub experience_match: u8,
    pub activity_level: u8,
    pub location_bonus: u8,
}

/// Scored, explained pairing of a viewer with one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub viewer_id: String,
    pub candidate_id: String,
    pub overall_score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub reasons: Vec<String>,
}

/// Reasons a set of scoring weights is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    #[error("weight '{name}' must be a non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("weights must sum to 1.0, got {0}")]
    BadTotal(f64),
}

/// Scoring weights, one per sub-score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub language: f64,
    pub availability: f64,
    pub goals: f64,
    pub experience: f64,
    pub activity: f64,
    pub location: f64,
}

impl ScoringWeights {
    /// Weights in basis points, so the weighted sum can be computed exactly
    pub fn basis_points(&self) -> [u32; 6] {
        let bp = |w: f64| (w.max(0.0) * 10_000.0).round() as u32;
        [
            bp(self.language),
            bp(self.availability),
            bp(self.goals),
            bp(self.experience),
            bp(self.activity),
            bp(self.location),
        ]
    }

    pub fn total(&self) -> f64 {
        self.language + self.availability + self.goals + self.experience + self.activity + self.location
    }

    /// Weights must be non-negative and sum to 1.0
    pub fn validate(&self) -> Result<(), WeightsError> {
        let all = [
            ("language", self.language),
            ("availability", self.availability),
            ("goals", self.goals),
            ("experience", self.experience),
            ("activity", self.activity),
            ("location", self.location),
        ];
        if let Some(&(name, value)) = all.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(WeightsError::InvalidWeight { name, value });
        }
        let total = self.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(WeightsError::BadTotal(total));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            language: 0.40,
            availability: 0.25,
            goals: 0.15,
            experience: 0.10,
            activity: 0.05,
            location: 0.05,
        }
    }
}

/// Cut-offs and caps that shape a ranked list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRules {
    /// Results must score strictly above this to be listed
    pub min_viable_score: u8,
    pub max_reasons: usize,
    pub candidate_pool_cap: usize,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for MatchingRules {
    fn default() -> Self {
        Self {
            min_viable_score: 30,
            max_reasons: 4,
            candidate_pool_cap: 100,
            default_limit: 10,
            max_limit: 50,
        }
    }
}

impl MatchingRules {
    /// Resolve a requested limit against the default and maximum
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}
