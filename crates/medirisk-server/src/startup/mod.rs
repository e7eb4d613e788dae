//! Application startup utilities module.

mod http;
pub mod logging;
mod shutdown;
mod state;

pub use http::http_server;
pub use logging::{LoggingConfig, LoggingGuard, init_logging};
pub use shutdown::{ShutdownSignal, listen_for_shutdown_signal, run_with_shutdown, stop_on_shutdown};
pub use state::{build_state, build_state_with_engine, load_or_train_engine, open_persistence, train_engine};
