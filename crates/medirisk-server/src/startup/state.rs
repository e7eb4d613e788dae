//! Application state construction: storage, models and accounts

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use medirisk_auth::{AccountService, TokenService};
use medirisk_persistence::{
    EmbeddedPersistService, FilePersistService, PersistenceService, StorageMode,
};
use medirisk_predict::{DiseaseModel, DiseaseType, ModelSettings, PredictionEngine};

use crate::metrics::{self, Timer};
use crate::middleware::rate_limit::{LoginLimiter, RateLimiterState};
use crate::model::{AppState, Configuration};

/// Train the three disease models in parallel on the blocking pool
pub async fn train_engine(settings: ModelSettings) -> anyhow::Result<PredictionEngine> {
    let timer = Timer::new();
    let tasks = DiseaseType::ALL.map(|disease| {
        tokio::task::spawn_blocking(move || {
            let timer = Timer::new();
            let model = DiseaseModel::train(disease, &settings);
            metrics::record_model_training(disease, timer.elapsed_secs());
            model
        })
    });

    let mut models = Vec::with_capacity(tasks.len());
    for task in tasks {
        models.push(task.await??);
    }

    let engine = PredictionEngine::from_models(settings, models)?;
    info!(
        estimators = settings.n_estimators,
        samples = settings.samples,
        elapsed_ms = (timer.elapsed_secs() * 1000.0) as u64,
        "Prediction models ready"
    );
    Ok(engine)
}

/// Reuse the cached engine when it was trained with the same settings
pub async fn load_or_train_engine(configuration: &Configuration) -> anyhow::Result<PredictionEngine> {
    let settings = configuration.model_settings();
    let Some(cache_path) = configuration.model_cache_path() else {
        return train_engine(settings).await;
    };

    if cache_path.exists() {
        let path = cache_path.clone();
        match tokio::task::spawn_blocking(move || PredictionEngine::load(&path)).await? {
            Ok(engine) if *engine.settings() == settings => {
                info!(path = %cache_path.display(), "Loaded prediction models from cache");
                return Ok(engine);
            }
            Ok(_) => {
                info!(path = %cache_path.display(), "Model cache has different settings, retraining");
            }
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "Model cache unreadable or invalid, retraining");
            }
        }
    }

    let engine = Arc::new(train_engine(settings).await?);
    let to_save = engine.clone();
    let path = cache_path.clone();
    match tokio::task::spawn_blocking(move || to_save.save(&path)).await? {
        Ok(()) => info!(path = %cache_path.display(), "Prediction models cached"),
        Err(e) => warn!(path = %cache_path.display(), error = %e, "Failed to cache prediction models"),
    }
    Ok(Arc::unwrap_or_clone(engine))
}

/// Open the configured storage backend
pub async fn open_persistence(
    configuration: &Configuration,
) -> anyhow::Result<Arc<dyn PersistenceService>> {
    let mode = configuration.storage_mode()?;
    info!(mode = %mode, "Persistence mode");

    let persistence: Arc<dyn PersistenceService> = match mode {
        StorageMode::File => {
            let path = configuration.history_path();
            info!(path = %path.display(), "Using JSON file storage");
            Arc::new(FilePersistService::new(path).await?)
        }
        StorageMode::Embedded => {
            let path = configuration.embedded_path();
            tokio::fs::create_dir_all(&path).await?;
            Arc::new(tokio::task::spawn_blocking(move || EmbeddedPersistService::open(path)).await??)
        }
    };
    Ok(persistence)
}

/// Assemble the shared state around an already trained engine
pub async fn build_state_with_engine(
    configuration: Configuration,
    engine: PredictionEngine,
    metrics_handle: Option<PrometheusHandle>,
) -> anyhow::Result<AppState> {
    let persistence = open_persistence(&configuration).await?;

    let tokens = Arc::new(TokenService::new(
        configuration.token_secret_key().as_deref(),
        configuration.token_expire_seconds(),
    )?);
    let accounts = Arc::new(
        AccountService::new(persistence.clone(), tokens.clone())
            .with_bcrypt_cost(configuration.bcrypt_cost()),
    );

    Ok(AppState {
        rate_limiter: Arc::new(RateLimiterState::new(configuration.rate_limit_config())),
        login_limiter: Arc::new(LoginLimiter::new(configuration.login_limit_config())),
        engine: Arc::new(engine),
        persistence,
        accounts,
        tokens,
        metrics_handle,
        configuration,
    })
}

pub async fn build_state(
    configuration: Configuration,
    metrics_handle: Option<PrometheusHandle>,
) -> anyhow::Result<AppState> {
    let engine = load_or_train_engine(&configuration).await?;
    build_state_with_engine(configuration, engine, metrics_handle).await
}

#[cfg(test)]
mod tests {
    use config::Config;
    use tempfile::TempDir;

    use super::*;
    use crate::model::constants::{MODEL_CACHE_PATH, MODEL_ESTIMATORS, MODEL_SAMPLES, STORAGE_DATA_DIR, STORAGE_MODE};

    fn configuration(dir: &TempDir, mode: &str) -> Configuration {
        let config = Config::builder()
            .set_override(STORAGE_DATA_DIR, dir.path().to_string_lossy().to_string())
            .unwrap()
            .set_override(STORAGE_MODE, mode)
            .unwrap()
            .set_override(MODEL_ESTIMATORS, 3)
            .unwrap()
            .set_override(MODEL_SAMPLES, 150)
            .unwrap()
            .set_override(
                MODEL_CACHE_PATH,
                dir.path().join("models.json").to_string_lossy().to_string(),
            )
            .unwrap()
            .build()
            .unwrap();
        Configuration::from_config(config)
    }

    #[tokio::test]
    async fn test_train_engine_has_every_disease() {
        let engine = train_engine(ModelSettings {
            n_estimators: 3,
            samples: 150,
            ..Default::default()
        })
        .await
        .unwrap();
        for disease in DiseaseType::ALL {
            assert!(engine.model(disease).is_some());
        }
    }

    #[tokio::test]
    async fn test_model_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let conf = configuration(&dir, "file");

        let trained = load_or_train_engine(&conf).await.unwrap();
        assert!(dir.path().join("models.json").exists());

        let cached = load_or_train_engine(&conf).await.unwrap();
        assert_eq!(trained.settings(), cached.settings());
        let features = [180.0, 50.0, 31.0];
        let a = trained.model(DiseaseType::Diabetes).unwrap().probability(&features).unwrap();
        let b = cached.model(DiseaseType::Diabetes).unwrap().probability(&features).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_corrupt_model_cache_is_retrained() {
        let dir = TempDir::new().unwrap();
        let conf = configuration(&dir, "file");
        let path = dir.path().join("models.json");
        load_or_train_engine(&conf).await.unwrap();

        let mut snapshot: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        snapshot["models"]["cardiovascular"]["forest"]["trees"][0]["nodes"][0] = serde_json::json!({
            "kind": "split", "feature": 9, "threshold": 0.0, "left": 0, "right": 0
        });
        std::fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        assert!(PredictionEngine::load(&path).is_err());

        let engine = load_or_train_engine(&conf).await.unwrap();
        let p = engine
            .model(DiseaseType::Cardiovascular)
            .unwrap()
            .probability(&[110.0, 260.0, 65.0])
            .unwrap();
        assert!((0.0..=1.0).contains(&p));
        // the rewritten cache loads cleanly
        assert!(PredictionEngine::load(&path).is_ok());
    }

    #[tokio::test]
    async fn test_open_persistence_modes() {
        let dir = TempDir::new().unwrap();
        let file = open_persistence(&configuration(&dir, "file")).await.unwrap();
        assert_eq!(file.storage_mode(), StorageMode::File);
        assert!(dir.path().join("prediction_history.json").exists());

        let embedded = open_persistence(&configuration(&dir, "embedded")).await.unwrap();
        assert_eq!(embedded.storage_mode(), StorageMode::Embedded);
        embedded.health_check().await.unwrap();
    }
}
