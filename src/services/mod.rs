// Service exports
pub mod account;
pub mod aggregator;
pub mod cache;
pub mod matching;
pub mod pool;
pub mod postgres;

pub use account::{AccountDirectory, AccountServiceClient, DirectoryError};
pub use aggregator::{build_matching_profile, ProfileAggregator, ProfileError, ProfileSource};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use matching::{MatchingError, MatchingService, Recommendations};
pub use pool::{CandidatePool, CandidatePoolBuilder};
pub use postgres::{PostgresClient, PostgresError, StoredCompatibility};
