//! HTTP server setup

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    dev::{Server, Service},
    middleware::Logger,
    web,
};

use crate::{
    api::route::routes,
    metrics::{Timer, record_http_request},
    middleware::{auth::Authentication, rate_limit::RateLimiter},
    model::AppState,
};

/// Creates and binds the HTTP server.
pub fn http_server(
    app_state: Arc<AppState>,
    address: String,
    port: u16,
    workers: Option<usize>,
) -> Result<Server, std::io::Error> {
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Authentication)
            .wrap(RateLimiter::new(app_state.rate_limiter.clone()))
            .wrap_fn(|req, srv| {
                let timer = Timer::new();
                let method = req.method().to_string();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let path = res
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string());
                    record_http_request(&method, &path, res.status().as_u16(), timer.elapsed_secs());
                    Ok(res)
                }
            })
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .configure(routes)
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    Ok(server.bind((address, port))?.run())
}
