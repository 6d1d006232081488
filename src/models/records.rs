use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{LearningGoal, ProficiencyLevel, UnknownLevel};

/// Core account record as stored by the account service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(alias = "$id", alias = "userId")]
    pub id: String,
    #[serde(rename = "nativeLanguages", default)]
    pub native_languages: Vec<String>,
    #[serde(rename = "learningLanguages", default)]
    pub learning_languages: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "lastActive", default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(rename = "onboardingCompleted", default)]
    pub onboarding_completed: bool,
}

impl AccountRecord {
    /// At least one native or learning language recorded
    pub fn has_languages(&self) -> bool {
        self.native_languages
            .iter()
            .chain(self.learning_languages.iter())
            .any(|lang| !lang.trim().is_empty())
    }
}

/// Proficiency as it arrives on the wire: either a bare tag (`"B1"`)
/// or an object wrapping one (`{"level": "B1"}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawProficiency {
    Tag(String),
    Wrapped { level: String },
}

impl RawProficiency {
    pub fn tag(&self) -> &str {
        match self {
            RawProficiency::Tag(tag) => tag,
            RawProficiency::Wrapped { level } => level,
        }
    }

    pub fn normalize(&self) -> Result<ProficiencyLevel, UnknownLevel> {
        self.tag().parse()
    }
}

/// Learning-progress record for one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub language: String,
    pub level: RawProficiency,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "sessionsCompleted", default)]
    pub sessions_completed: u32,
}

/// Matching preferences record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceRecord {
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(rename = "learningGoals", default)]
    pub learning_goals: Vec<LearningGoal>,
}

/// Everything known about one learner before normalization
#[derive(Debug, Clone)]
pub struct LearnerRecords {
    pub account: AccountRecord,
    pub progress: Vec<ProgressRecord>,
    pub preferences: Option<PreferenceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_proficiency_accepts_both_shapes() {
        let bare: ProgressRecord =
            serde_json::from_str(r#"{"language": "Spanish", "level": "B1"}"#).unwrap();
        let wrapped: ProgressRecord =
            serde_json::from_str(r#"{"language": "Spanish", "level": {"level": "b1"}}"#).unwrap();

        assert_eq!(bare.level.normalize(), Ok(ProficiencyLevel::B1));
        assert_eq!(wrapped.level.normalize(), Ok(ProficiencyLevel::B1));
        assert_eq!(bare.sessions_completed, 0);
    }

    #[test]
    fn test_account_language_presence() {
        let account: AccountRecord = serde_json::from_str(
            r#"{"$id": "u1", "nativeLanguages": [" "], "learningLanguages": []}"#,
        )
        .unwrap();
        assert_eq!(account.id, "u1");
        assert!(!account.has_languages());
        assert!(!account.onboarding_completed);
    }
}
