// MediRisk HTTP server library
// Exposes the handlers, middleware and startup code used by the binary and the integration tests

pub mod api; // HTTP handlers and request models
pub mod error; // AppError and its HTTP mapping
pub mod metrics; // Prometheus metrics
pub mod middleware; // Authentication context and rate limiting
pub mod model; // Configuration, response envelope and shared state
pub mod startup; // Logging, state construction, HTTP server and shutdown

pub use error::AppError;
pub use model::{AppState, Configuration};
