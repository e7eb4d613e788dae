//! Persistence traits for the unified storage abstraction layer
//!
//! This module defines the core persistence traits that abstract over the
//! storage backends: JSON files on local disk and embedded RocksDB.

pub mod prediction;
pub mod user;

pub use prediction::PredictionPersistence;
pub use user::UserPersistence;

use async_trait::async_trait;

use crate::model::StorageMode;

/// Unified persistence service trait
///
/// This is the main interface for all storage operations. Implementations
/// dispatch to the appropriate storage backend based on the configured mode.
#[async_trait]
pub trait PersistenceService: PredictionPersistence + UserPersistence + Send + Sync {
    /// Get the current storage mode
    fn storage_mode(&self) -> StorageMode;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}
