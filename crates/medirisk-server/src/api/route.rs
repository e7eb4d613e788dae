//! Route table
//!
//! - GET  /                             service metadata
//! - GET  /health                       storage health
//! - GET  /metrics                      Prometheus exposition
//! - POST /predict                      score and store a prediction
//! - POST /generate_report              PDF of a posted prediction
//! - GET  /download_report/{disease}    PDF of the latest prediction
//! - GET  /history                      paged history
//! - GET  /statistics                   counts
//! - GET  /statistics/summary           counts, period and daily evolution
//! - GET  /statistics_report            statistics PDF
//! - POST /auth/register, /auth/login, /auth/logout
//! - GET  /auth/me, /auth/predictions

use actix_web::{Scope, web};

use super::{account, history, index, predict};

pub fn auth_routes() -> Scope {
    web::scope("/auth")
        .service(account::register)
        .service(account::login)
        .service(account::logout)
        .service(account::me)
        .service(account::predictions)
}

/// Register every route on an app or a test service
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(super::json_config())
        .app_data(super::query_config())
        .service(index::index)
        .service(index::health)
        .service(index::metrics)
        .service(predict::predict)
        .service(predict::generate_report)
        .service(predict::download_report)
        .service(history::history)
        .service(history::statistics)
        .service(history::statistics_summary)
        .service(history::statistics_pdf)
        .service(auth_routes());
}
