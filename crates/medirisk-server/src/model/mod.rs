//! Data models module
//!
//! - `constants` - Configuration keys, defaults and user-facing messages
//! - `config` - Configuration management
//! - `response` - The JSON envelope and PDF responses
//! - `app_state` - Application state shared across handlers

pub mod app_state;
pub mod config;
pub mod constants;
pub mod response;

pub use app_state::AppState;
pub use config::Configuration;
pub use constants::*;
pub use response::Result;
