//! Error types for model training and prediction

use crate::validation::ValidationError;

/// Failures while fitting, evaluating or persisting a model
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyDataset,

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{rows} rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("model is not fitted")]
    NotFitted,

    #[error("invalid feature distribution: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    #[error("snapshot is missing the {0} model")]
    MissingModel(String),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Failures returned by `PredictionEngine::predict`
#[derive(thiserror::Error, Debug)]
pub enum PredictError {
    #[error("The data is incomplete. Please fill in all fields.")]
    Incomplete,

    #[error("Unrecognized disease type: {0}")]
    UnknownDisease(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictError {
    /// Short machine-readable reason, used as a metric label
    pub fn reason(&self) -> &'static str {
        match self {
            PredictError::Incomplete => "incomplete",
            PredictError::UnknownDisease(_) => "unknown_disease",
            PredictError::Validation(_) => "validation",
            PredictError::Model(_) => "model",
        }
    }
}
