// Authentication middleware for Actix-web
// Decodes an optional JWT and stores the resulting AuthContext in request extensions

use actix_service::forward_ready;
use actix_utils::future::{Ready, ok};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web::Data,
};
use futures::future::LocalBoxFuture;
use tracing::debug;

use medirisk_auth::{ACCESS_TOKEN, AUTHORIZATION_HEADER, AuthContext, TOKEN_PREFIX};

use crate::model::AppState;

/// Attaches an [`AuthContext`] to every request; anonymous requests get the default context
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware { service })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
}

/// Token sources in priority order:
/// 1. `accessToken` header
/// 2. `Authorization: Bearer <token>`
/// 3. `accessToken` query parameter
pub(crate) fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header_val) = req.headers().get(ACCESS_TOKEN)
        && let Ok(s) = header_val.to_str()
    {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    if let Some(header_val) = req.headers().get(AUTHORIZATION_HEADER)
        && let Ok(s) = header_val.to_str()
        && let Some(token) = s.trim().strip_prefix(TOKEN_PREFIX)
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    req.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            pair.split_once('=')
                .filter(|(key, value)| *key == ACCESS_TOKEN && !value.is_empty())
                .map(|(_, value)| value.to_string())
        })
    })
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if Method::OPTIONS != *req.method() {
            let mut auth_context = AuthContext::default();

            if let Some(token) = extract_token(&req) {
                auth_context.token_provided = true;

                if let Some(app_state) = req.app_data::<Data<AppState>>() {
                    match app_state.tokens.decode(&token) {
                        Ok(claims) => {
                            auth_context.user_id = claims.sub;
                            auth_context.name = claims.name;
                        }
                        Err(err) => {
                            debug!(path = %req.path(), error = %err, "Rejected access token");
                            auth_context.jwt_error = Some(err);
                        }
                    }
                } else {
                    tracing::error!("AppState not found in request app_data");
                }
                auth_context.token = Some(token);
            }

            req.extensions_mut().insert(auth_context);
        }

        let res = self.service.call(req);

        Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
    }
}
