//! Account endpoints under `/auth`

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use medirisk_auth::{AccountInfo, LoginResult};
use medirisk_common::MediRiskError;
use medirisk_common::error::TOO_MANY_REQUESTS;
use medirisk_persistence::PredictionRecord;

use super::model::{LoginRequest, RegisterRequest};
use super::{require_auth, storage_error};
use crate::error::AppError;
use crate::middleware::rate_limit::{LoginDecision, TOO_MANY_LOGIN_ATTEMPTS_MESSAGE};
use crate::model::{AppState, response::Result as ApiResult};

type HandlerResult = Result<HttpResponse, AppError>;

fn locked_out(retry_after_secs: u64) -> AppError {
    MediRiskError::ApiError(
        429,
        TOO_MANY_REQUESTS.code,
        format!(
            "{} Retry in {} seconds.",
            TOO_MANY_LOGIN_ATTEMPTS_MESSAGE, retry_after_secs
        ),
    )
    .into()
}

/// POST /auth/register - create an account and sign it in
#[post("/register")]
pub async fn register(data: web::Data<AppState>, body: web::Json<RegisterRequest>) -> HandlerResult {
    let result = data
        .accounts
        .register(&body.email, &body.password, &body.name)
        .await?;
    Ok(ApiResult::<LoginResult>::http_success(result))
}

/// POST /auth/login
///
/// Failed attempts are counted per email; reaching the limit locks the
/// email out for the configured duration.
#[post("/login")]
pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> HandlerResult {
    let key = body.email.trim().to_lowercase();
    if let LoginDecision::Locked { retry_after_secs } = data.login_limiter.check(&key) {
        return Err(locked_out(retry_after_secs));
    }

    match data.accounts.login(&body.email, &body.password).await {
        Ok(result) => {
            data.login_limiter.record_success(&key);
            Ok(ApiResult::<LoginResult>::http_success(result))
        }
        Err(e) => {
            if matches!(e.downcast_ref::<MediRiskError>(), Some(MediRiskError::AuthError(_))) {
                data.login_limiter.record_failure(&key);
            }
            Err(e.into())
        }
    }
}

/// POST /auth/logout - revoke the presented token
#[post("/logout")]
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> HandlerResult {
    let ctx = require_auth(&req)?;
    if let Some(token) = ctx.token.as_deref() {
        data.accounts.logout(token);
    }
    info!(user_id = %ctx.user_id, "User signed out");
    Ok(ApiResult::<bool>::http_success(true))
}

/// GET /auth/me
#[get("/me")]
pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> HandlerResult {
    let ctx = require_auth(&req)?;
    let user = data.accounts.current_user(&ctx.user_id).await?;
    Ok(ApiResult::<AccountInfo>::http_success(AccountInfo::from(user)))
}

/// GET /auth/predictions - the caller's own history, oldest first
#[get("/predictions")]
pub async fn predictions(req: HttpRequest, data: web::Data<AppState>) -> HandlerResult {
    let ctx = require_auth(&req)?;
    let records = data
        .persistence
        .prediction_find_by_user(&ctx.user_id)
        .await
        .map_err(storage_error)?;
    Ok(ApiResult::<Vec<PredictionRecord>>::http_success(records))
}
