//! Application state shared across all handlers

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use medirisk_auth::{AccountService, TokenService};
use medirisk_persistence::PersistenceService;
use medirisk_predict::PredictionEngine;

use super::config::Configuration;
use crate::middleware::rate_limit::{LoginLimiter, RateLimiterState};

/// Everything a handler needs, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub configuration: Configuration,
    /// Trained models; read-only after startup
    pub engine: Arc<PredictionEngine>,
    pub persistence: Arc<dyn PersistenceService>,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiterState>,
    pub login_limiter: Arc<LoginLimiter>,
    /// Present when the Prometheus recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("configuration", &self.configuration)
            .field("engine", self.engine.settings())
            .field("persistence", &self.persistence.storage_mode())
            .field("rate_limiter", self.rate_limiter.config())
            .field("metrics_handle", &self.metrics_handle.is_some())
            .finish()
    }
}

impl AppState {
    /// Author printed on prediction reports
    pub fn report_author(&self) -> String {
        self.configuration.report_author()
    }
}
