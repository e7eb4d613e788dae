//! Prediction history persistence trait

use async_trait::async_trait;

use medirisk_predict::DiseaseType;

use crate::model::{HistoryQuery, Page, PredictionRecord};

/// Prediction history operations
#[async_trait]
pub trait PredictionPersistence: Send + Sync {
    /// Append a record to the history
    async fn prediction_add(&self, record: PredictionRecord) -> anyhow::Result<()>;

    /// All records, oldest first
    async fn prediction_find_all(&self) -> anyhow::Result<Vec<PredictionRecord>>;

    /// Filtered page of records, newest first
    async fn prediction_find_page(
        &self,
        query: &HistoryQuery,
    ) -> anyhow::Result<Page<PredictionRecord>>;

    /// Record with the greatest timestamp for a disease
    async fn prediction_find_last(
        &self,
        disease: DiseaseType,
    ) -> anyhow::Result<Option<PredictionRecord>>;

    /// Records made by a signed-in user, oldest first
    async fn prediction_find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<PredictionRecord>>;
}
