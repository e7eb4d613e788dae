// Error handling for HTTP handlers
// Maps domain errors carried in anyhow::Error onto status codes and the response envelope

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use tracing::error;

pub use medirisk_common::error::{
    ACCESS_DENIED, DATA_ACCESS_ERROR, ErrorCode, MODEL_ERROR, MediRiskError, PARAMETER_MISSING,
    PARAMETER_VALIDATE_ERROR, REPORT_ERROR, RESOURCE_CONFLICT, RESOURCE_NOT_FOUND, SERVER_ERROR,
    SUCCESS, TOO_MANY_REQUESTS,
};
use medirisk_predict::PredictError;

use crate::model::response::Result as ApiResult;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";
pub const STORAGE_ERROR_MESSAGE: &str = "Storage is temporarily unavailable";

// Local wrapper so actix's ResponseError can be implemented for anyhow errors
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<MediRiskError> for AppError {
    fn from(value: MediRiskError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl From<PredictError> for AppError {
    fn from(value: PredictError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Status, error code and user-facing message for this error
    pub fn classify(&self) -> (u16, i32, String) {
        if let Some(e) = self.downcast_ref::<PredictError>() {
            return match e {
                PredictError::Incomplete => (400, PARAMETER_MISSING.code, e.to_string()),
                PredictError::UnknownDisease(_) | PredictError::Validation(_) => {
                    (400, PARAMETER_VALIDATE_ERROR.code, e.to_string())
                }
                PredictError::Model(_) => {
                    error!(error = %e, "Model failure while scoring");
                    (500, MODEL_ERROR.code, UNEXPECTED_ERROR_MESSAGE.to_string())
                }
            };
        }

        if let Some(e) = self.downcast_ref::<MediRiskError>() {
            return match e {
                MediRiskError::IllegalArgument(message) => {
                    (400, PARAMETER_VALIDATE_ERROR.code, message.clone())
                }
                MediRiskError::ResourceNotFound(message) => {
                    (404, RESOURCE_NOT_FOUND.code, message.clone())
                }
                MediRiskError::Conflict(message) => (409, RESOURCE_CONFLICT.code, message.clone()),
                MediRiskError::AuthError(message) => (401, ACCESS_DENIED.code, message.clone()),
                MediRiskError::StorageError(_) => {
                    error!(error = %e, "Storage failure");
                    (500, DATA_ACCESS_ERROR.code, STORAGE_ERROR_MESSAGE.to_string())
                }
                MediRiskError::ModelError(_) => {
                    error!(error = %e, "Model failure");
                    (500, MODEL_ERROR.code, UNEXPECTED_ERROR_MESSAGE.to_string())
                }
                MediRiskError::ReportError(_) => {
                    error!(error = %e, "Report failure");
                    (500, REPORT_ERROR.code, UNEXPECTED_ERROR_MESSAGE.to_string())
                }
                MediRiskError::InternalError(_) => {
                    error!(error = %e, "Internal failure");
                    (500, SERVER_ERROR.code, UNEXPECTED_ERROR_MESSAGE.to_string())
                }
                MediRiskError::ApiError(status, code, message) => (*status, *code, message.clone()),
            };
        }

        error!(error = ?self.inner, "Unhandled failure");
        (500, SERVER_ERROR.code, UNEXPECTED_ERROR_MESSAGE.to_string())
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.classify().0)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code, message) = self.classify();
        ApiResult::<()>::http_response(status, code, message, ())
    }
}
