//! MediRisk Auth - Accounts and authentication
//!
//! This crate provides:
//! - JWT token handling with caching and revocation
//! - Account registration and login with bcrypt password hashes
//! - The request auth context used by the HTTP middleware

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::account::AccountService;
pub use service::auth::TokenService;
