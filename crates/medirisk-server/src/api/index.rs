//! Service metadata, health and metrics endpoints

use actix_web::{HttpResponse, Responder, get, web};
use tracing::warn;

use medirisk_common::error::{RESOURCE_NOT_FOUND, SERVER_ERROR};
use medirisk_common::{SERVICE_NAME, SERVICE_VERSION};
use medirisk_predict::DiseaseType;

use super::model::{DiseaseInfo, HealthInfo, ServiceInfo};
use crate::model::{AppState, response::Result};

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// GET / - name, version and the accepted fields of every disease
#[get("/")]
pub async fn index() -> impl Responder {
    Result::<ServiceInfo>::http_success(ServiceInfo {
        name: SERVICE_NAME,
        version: SERVICE_VERSION,
        diseases: DiseaseType::ALL.into_iter().map(DiseaseInfo::from).collect(),
    })
}

/// GET /health - 200 when storage answers, 503 otherwise
#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> impl Responder {
    let storage = data.persistence.storage_mode();
    match data.persistence.health_check().await {
        Ok(()) => Result::<HealthInfo>::http_success(HealthInfo {
            status: "UP",
            storage,
        }),
        Err(e) => {
            warn!(error = %e, storage = %storage, "Storage health check failed");
            Result::<HealthInfo>::http_response(
                503,
                SERVER_ERROR.code,
                "Storage is unavailable".to_string(),
                HealthInfo {
                    status: "DOWN",
                    storage,
                },
            )
        }
    }
}

/// GET /metrics - Prometheus text exposition
#[get("/metrics")]
pub async fn metrics(data: web::Data<AppState>) -> impl Responder {
    match &data.metrics_handle {
        Some(handle) => HttpResponse::Ok()
            .content_type(PROMETHEUS_CONTENT_TYPE)
            .body(handle.render()),
        None => Result::<()>::http_response(
            404,
            RESOURCE_NOT_FOUND.code,
            "Metrics are disabled".to_string(),
            (),
        ),
    }
}
