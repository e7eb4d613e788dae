//! MediRisk Persistence - prediction history and account storage
//!
//! This crate provides:
//! - Persistence trait abstractions for unified storage
//! - Domain model types for persistence operations
//! - Statistics computed over the history
//! - JSON file and embedded RocksDB backends

pub mod embedded;
pub mod file;
pub mod model;
pub mod statistics;
pub mod traits;

/// Message returned when registering an email that is already in use
pub const EMAIL_TAKEN: &str = "An account already exists with this email";

// Re-export persistence traits
pub use traits::{PersistenceService, PredictionPersistence, UserPersistence};

// Re-export backends
pub use embedded::EmbeddedPersistService;
pub use file::FilePersistService;

// Re-export model types
pub use model::{HistoryQuery, Page, PredictionRecord, StorageMode, UserInfo};
pub use statistics::{DailyCount, PredictionStatistics, StatisticsSummary};
