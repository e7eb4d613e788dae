//! Error types and error codes for MediRisk
//!
//! This module defines:
//! - `MediRiskError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum MediRiskError {
    #[error("{0}")]
    IllegalArgument(String),

    #[error("{0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    AuthError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("report error: {0}")]
    ReportError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("{2}")]
    ApiError(u16, i32, String),
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_MISSING: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter missing",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const DATA_ACCESS_ERROR: ErrorCode<'static> = ErrorCode {
    code: 10002,
    message: "data access error",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const RESOURCE_CONFLICT: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "resource conflict",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const MODEL_ERROR: ErrorCode<'static> = ErrorCode {
    code: 31000,
    message: "model error",
};

pub const REPORT_ERROR: ErrorCode<'static> = ErrorCode {
    code: 32000,
    message: "report error",
};

pub const TOO_MANY_REQUESTS: ErrorCode<'static> = ErrorCode {
    code: 429,
    message: "too many requests",
};
