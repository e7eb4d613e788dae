//! MediRisk Predict - disease risk scoring
//!
//! This crate provides:
//! - Supported diseases and their input fields (`disease`)
//! - Input validation (`validation`)
//! - Synthetic training data (`dataset`)
//! - Feature scaling and a random forest classifier (`scaler`, `forest`)
//! - Risk levels, risk factors and recommendations (`assessment`)
//! - The `PredictionEngine` tying it together (`engine`)

pub mod assessment;
pub mod dataset;
pub mod disease;
pub mod engine;
pub mod error;
pub mod forest;
pub mod scaler;
pub mod validation;

pub use assessment::{Prediction, RecommendationGroup, RiskFactor, RiskLevel, Severity};
pub use disease::{DiseaseType, FieldRange, MetricInput, unit_for};
pub use engine::{DiseaseModel, ModelSettings, PredictionEngine};
pub use error::{ModelError, PredictError};
pub use validation::ValidationError;
