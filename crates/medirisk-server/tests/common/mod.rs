//! Common test utilities for the HTTP integration tests
//!
//! - `test_state`: an `AppState` over JSON file storage in a temp dir
//! - `test_app!`: the full middleware stack and route table as a test service

use std::sync::{Arc, OnceLock};

use config::Config;
use serde_json::{Value, json};
use tempfile::TempDir;

use medirisk_predict::{ModelSettings, PredictionEngine};
use medirisk_server::model::constants::{
    BCRYPT_COST, LOGIN_LIMIT_ENABLED, RATE_LIMIT_ENABLED, STORAGE_DATA_DIR,
};
use medirisk_server::{AppState, Configuration, startup};

/// Small models trained once per test binary
pub fn engine() -> PredictionEngine {
    static ENGINE: OnceLock<PredictionEngine> = OnceLock::new();
    ENGINE
        .get_or_init(|| {
            PredictionEngine::train(ModelSettings {
                n_estimators: 10,
                samples: 400,
                ..Default::default()
            })
            .expect("test models train")
        })
        .clone()
}

/// State over a fresh data dir; rate limits are off unless overridden
pub async fn test_state(overrides: &[(&str, &str)]) -> (Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut builder = Config::builder()
        .set_override(STORAGE_DATA_DIR, dir.path().to_string_lossy().to_string())
        .unwrap()
        .set_override(BCRYPT_COST, 4)
        .unwrap()
        .set_override(RATE_LIMIT_ENABLED, false)
        .unwrap()
        .set_override(LOGIN_LIMIT_ENABLED, false)
        .unwrap();
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }
    let configuration = Configuration::from_config(builder.build().unwrap());
    let state = startup::build_state_with_engine(configuration, engine(), None)
        .await
        .unwrap();
    (Arc::new(state), dir)
}

#[allow(dead_code)]
pub fn diabetes_request() -> Value {
    json!({
        "disease_type": "diabetes",
        "data": {"glucose": 250, "age": 60, "bmi": "35.2"}
    })
}

#[allow(dead_code)]
pub fn hypertension_request() -> Value {
    json!({
        "disease_type": "hypertension",
        "data": {"systolic": 120, "diastolic": 80, "age": 30}
    })
}

/// Wrap the route table in the server's middleware, as `http_server` does
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(medirisk_server::middleware::auth::Authentication)
                .wrap(medirisk_server::middleware::rate_limit::RateLimiter::new(
                    $state.rate_limiter.clone(),
                ))
                .app_data(actix_web::web::Data::from($state.clone()))
                .configure(medirisk_server::api::route::routes),
        )
        .await
    };
}
