//! Main entry point for the MediRisk prediction server.

use std::sync::Arc;

use medirisk_server::{
    metrics,
    middleware::rate_limit::{self, CLEANUP_INTERVAL},
    model::Configuration,
    startup,
};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new();

    let logging_config = configuration.logging_config();
    let _logging_guard = startup::init_logging(&logging_config)?;

    let metrics_handle = if configuration.metrics_enabled() {
        metrics::init_metrics()
    } else {
        None
    };

    let server_address = configuration.server_address();
    let server_port = configuration.server_port();
    let workers = configuration.server_workers();

    let shutdown = startup::listen_for_shutdown_signal();

    info!("Training prediction models...");
    let Some(app_state) = startup::run_with_shutdown(
        startup::build_state(configuration, metrics_handle),
        shutdown.subscribe(),
    )
    .await
    else {
        info!("Shutdown requested during startup");
        return Ok(());
    };
    let app_state = Arc::new(app_state.map_err(|e| {
        error!(error = %e, "Failed to initialize application state");
        e.to_string()
    })?);

    let cleanup = rate_limit::start_cleanup_task(
        app_state.rate_limiter.clone(),
        app_state.login_limiter.clone(),
        CLEANUP_INTERVAL,
    );

    info!(
        "Starting MediRisk server on http://{}:{}",
        server_address, server_port
    );
    let server = startup::http_server(app_state, server_address, server_port, workers)?;
    let stopper = startup::stop_on_shutdown(server.handle(), &shutdown);

    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }

    cleanup.abort();
    stopper.abort();
    info!("MediRisk server shutdown complete");
    Ok(())
}
