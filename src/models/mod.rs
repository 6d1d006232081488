// Model exports
pub mod domain;
pub mod records;
pub mod requests;
pub mod responses;

pub use domain::{
    CompatibilityResult, LanguageProficiency, LearningGoal, MatchingProfile, MatchingRules,
    ProficiencyLevel, ScoreBreakdown, ScoringWeights, WeightsError,
};
pub use records::{AccountRecord, LearnerRecords, PreferenceRecord, ProgressRecord, RawProficiency};
pub use requests::{FindMatchesRequest, PairQuery, RankProfilesRequest};
pub use responses::{ErrorResponse, FindMatchesResponse, HealthResponse, RankProfilesResponse};
