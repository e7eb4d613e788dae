use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assessment::{Prediction, assess};
use crate::dataset::synthesize;
use crate::disease::{DiseaseType, MetricInput};
use crate::error::{ModelError, PredictError};
use crate::forest::{ForestParams, RandomForest};
use crate::scaler::StandardScaler;
use crate::validation::validate;

/// Every disease is scored on three features
const FEATURES: usize = 3;

/// Training knobs shared by the three disease models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
    pub samples: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            seed: 42,
            samples: 1000,
        }
    }
}

impl ModelSettings {
    fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Scaler and forest trained for one disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseModel {
    pub disease: DiseaseType,
    scaler: StandardScaler,
    forest: RandomForest,
}

impl DiseaseModel {
    pub fn train(disease: DiseaseType, settings: &ModelSettings) -> Result<Self, ModelError> {
        let started = Instant::now();
        let data = synthesize(disease, settings.samples, settings.seed)?;
        let scaler = StandardScaler::fit(&data.rows)?;
        let scaled = scaler.transform_all(&data.rows)?;
        let forest = RandomForest::fit(settings.forest_params(), &scaled, &data.labels)?;

        info!(
            disease = %disease,
            samples = data.len(),
            positive_rate = data.positive_rate(),
            trees = forest.trees().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Disease model trained"
        );

        Ok(Self {
            disease,
            scaler,
            forest,
        })
    }

    /// Reject a model whose scaler or trees cannot score three features
    pub fn validate(&self) -> Result<(), ModelError> {
        self.scaler.validate(FEATURES)?;
        if self.forest.n_features() != FEATURES {
            return Err(ModelError::DimensionMismatch {
                expected: FEATURES,
                actual: self.forest.n_features(),
            });
        }
        self.forest.validate()
    }

    /// Positive-class probability for a raw (unscaled) feature vector
    pub fn probability(&self, features: &[f64; 3]) -> Result<f64, ModelError> {
        let scaled = self.scaler.transform(features)?;
        self.forest.predict_proba(&scaled)
    }
}

/// The three trained models behind the prediction endpoint
///
/// Immutable once built, so it can be shared across workers behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEngine {
    settings: ModelSettings,
    models: BTreeMap<DiseaseType, DiseaseModel>,
}

impl PredictionEngine {
    /// Train every disease model sequentially
    pub fn train(settings: ModelSettings) -> Result<Self, ModelError> {
        let models = DiseaseType::ALL
            .into_iter()
            .map(|d| DiseaseModel::train(d, &settings))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_models(settings, models)
    }

    /// Assemble an engine from models trained elsewhere
    pub fn from_models(
        settings: ModelSettings,
        models: impl IntoIterator<Item = DiseaseModel>,
    ) -> Result<Self, ModelError> {
        let models: BTreeMap<_, _> = models.into_iter().map(|m| (m.disease, m)).collect();
        if let Some(missing) = DiseaseType::ALL.iter().find(|d| !models.contains_key(*d)) {
            return Err(ModelError::MissingModel(missing.to_string()));
        }
        Ok(Self { settings, models })
    }

    /// Read a snapshot written by [`PredictionEngine::save`]
    ///
    /// Every model is validated, so a tampered or truncated cache fails here
    /// instead of at prediction time.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        let engine: PredictionEngine = serde_json::from_slice(&bytes)?;
        for (disease, model) in &engine.models {
            if model.disease != *disease {
                return Err(ModelError::CorruptSnapshot(format!(
                    "{} model stored under {}",
                    model.disease, disease
                )));
            }
            model.validate()?;
        }
        Self::from_models(engine.settings, engine.models.into_values())
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn model(&self, disease: DiseaseType) -> Option<&DiseaseModel> {
        self.models.get(&disease)
    }

    /// Validate, score and assess one submission
    pub fn predict(&self, disease: &str, input: &MetricInput) -> Result<Prediction, PredictError> {
        if disease.is_empty() || input.is_empty() {
            return Err(PredictError::Incomplete);
        }
        let disease: DiseaseType = disease.parse()?;
        let features = validate(disease, input)?;

        let model = self
            .models
            .get(&disease)
            .ok_or_else(|| ModelError::MissingModel(disease.to_string()))?;
        let probability = model.probability(&features)?;

        debug!(disease = %disease, ?features, probability, "Prediction computed");
        Ok(assess(disease, probability, &features, input))
    }
}
