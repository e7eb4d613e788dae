//! MediRisk Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all MediRisk components:
//! - Error types and error codes
//! - Utility functions
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, MediRiskError};
pub use utils::{is_valid_email, json_as_f64, round1};

/// Service name reported by the index route and the PDF producer field
pub const SERVICE_NAME: &str = "MediRisk";

/// Service version
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Query parameter names
pub const DISEASE_TYPE: &str = "diseaseType";
pub const PAGE_NO: &str = "pageNo";
pub const PAGE_SIZE: &str = "pageSize";

/// Default page size for history listings
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Upper bound for a history page
pub const MAX_PAGE_SIZE: u64 = 500;
