// HTTP API
// Handlers grouped by concern, wired together in `route`

pub mod account;
pub mod history;
pub mod index;
pub mod model;
pub mod predict;
pub mod route;

use actix_web::{HttpMessage, HttpRequest, error::InternalError, web};

use medirisk_auth::AuthContext;
use medirisk_common::MediRiskError;
use medirisk_common::error::PARAMETER_VALIDATE_ERROR;

use crate::error::AppError;
use crate::model::{LOGIN_REQUIRED, response::Result as ApiResult};

pub const MAX_JSON_BODY: usize = 256 * 1024;

/// The auth context set by the authentication middleware
pub fn auth_context(req: &HttpRequest) -> AuthContext {
    req.extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or_default()
}

/// The authenticated caller, or 401
pub fn require_auth(req: &HttpRequest) -> Result<AuthContext, AppError> {
    let ctx = auth_context(req);
    if ctx.is_authenticated() {
        return Ok(ctx);
    }
    let message = if ctx.jwt_error.is_some() {
        ctx.jwt_error_string()
    } else {
        LOGIN_REQUIRED.to_string()
    };
    Err(MediRiskError::AuthError(message).into())
}

/// Storage errors keep their domain meaning; anything else becomes a storage failure
pub fn storage_error(err: anyhow::Error) -> AppError {
    if err.downcast_ref::<MediRiskError>().is_some() {
        AppError::from(err)
    } else {
        MediRiskError::StorageError(format!("{:#}", err)).into()
    }
}

/// Malformed JSON bodies answer 400 with the usual envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| {
            let response = ApiResult::<()>::http_response(
                400,
                PARAMETER_VALIDATE_ERROR.code,
                err.to_string(),
                (),
            );
            InternalError::from_response(err, response).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response =
            ApiResult::<()>::http_response(400, PARAMETER_VALIDATE_ERROR.code, err.to_string(), ());
        InternalError::from_response(err, response).into()
    })
}
