// Rate limiting for the HTTP API
// Token bucket per client IP, plus a lockout tracker for login attempts

use std::future::{Future, Ready, ready};
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        StatusCode,
        header::{HeaderName, HeaderValue},
    },
};
use dashmap::DashMap;
use tracing::{debug, warn};

use medirisk_common::error::TOO_MANY_REQUESTS;

use crate::model::response::Result as ApiResult;

pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests. Please try again later.";
pub const TOO_MANY_LOGIN_ATTEMPTS_MESSAGE: &str =
    "Too many login attempts. Please try again later.";

/// Per-IP request budget
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    pub window_duration: Duration,
    pub enabled: bool,
    /// Peers whose `Forwarded`/`X-Forwarded-For` headers name the client
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_duration: Duration::from_secs(60),
            enabled: true,
            trusted_proxies: Vec::new(),
        }
    }
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|a| a.ip()))
}

/// Bucket key for a request: the socket peer, or the forwarded client when
/// the peer is a trusted proxy
pub fn client_key(req: &ServiceRequest, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = req.peer_addr().map(|a| a.ip()) else {
        return "unknown".to_string();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }
    req.connection_info()
        .realip_remote_addr()
        .and_then(parse_ip)
        .unwrap_or(peer)
        .to_string()
}

struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
    max_tokens: u32,
    refill_interval: Duration,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_interval,
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_refill) >= self.refill_interval {
            self.tokens = self.max_tokens;
            self.last_refill = now;
        }
    }
}

/// Buckets shared by every worker
pub struct RateLimiterState {
    buckets: DashMap<String, TokenBucket>,
    config: RateLimitConfig,
}

impl RateLimiterState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Consume one token for `key`; returns (allowed, remaining)
    pub fn check_rate_limit(&self, key: &str) -> (bool, u32) {
        if !self.config.enabled {
            return (true, self.config.max_requests);
        }

        let mut bucket = self.buckets.entry(key.to_string()).or_insert_with(|| {
            TokenBucket::new(self.config.max_requests, self.config.window_duration)
        });

        let allowed = bucket.try_consume();
        (allowed, bucket.tokens)
    }

    /// Drop buckets idle for two windows
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill) < self.config.window_duration * 2
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Rate limiting middleware factory
pub struct RateLimiter {
    state: Arc<RateLimiterState>,
}

impl RateLimiter {
    pub fn new(state: Arc<RateLimiterState>) -> Self {
        Self { state }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            state: self.state.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    state: Arc<RateLimiterState>,
}

fn header_value(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client_ip = client_key(&req, &self.state.config.trusted_proxies);

        let (allowed, remaining) = self.state.check_rate_limit(&client_ip);
        let max_requests = u64::from(self.state.config.max_requests);

        if !allowed {
            let retry_after = self.state.config.window_duration.as_secs();
            debug!(client_ip = %client_ip, path = %req.path(), "Request rate limited");
            let mut response = ApiResult::<()>::http_response(
                StatusCode::TOO_MANY_REQUESTS.as_u16(),
                TOO_MANY_REQUESTS.code,
                TOO_MANY_REQUESTS_MESSAGE.to_string(),
                (),
            );
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                header_value(max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_static("0"),
            );
            headers.insert(
                actix_web::http::header::RETRY_AFTER,
                header_value(retry_after),
            );

            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                header_value(max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                header_value(u64::from(remaining)),
            );
            Ok(res.map_into_left_body())
        })
    }
}

// ============================================================================
// Login attempt limiter
// ============================================================================

/// Lockout policy for `/auth/login`
#[derive(Clone, Debug, PartialEq)]
pub struct LoginLimitConfig {
    /// Failed attempts allowed per window
    pub max_attempts: u32,
    pub window_duration: Duration,
    pub lockout_duration: Duration,
    pub enabled: bool,
}

impl Default for LoginLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_duration: Duration::from_secs(60),
            lockout_duration: Duration::from_secs(300),
            enabled: true,
        }
    }
}

struct LoginAttempts {
    attempts: u32,
    first_attempt: Instant,
    locked_until: Option<Instant>,
}

impl LoginAttempts {
    fn new() -> Self {
        Self {
            attempts: 0,
            first_attempt: Instant::now(),
            locked_until: None,
        }
    }

    fn lockout_remaining(&self) -> Option<Duration> {
        self.locked_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
    }

    fn reset_if_expired(&mut self, window: Duration) {
        let now = Instant::now();
        if now.duration_since(self.first_attempt) >= window {
            self.attempts = 0;
            self.first_attempt = now;
            self.locked_until = None;
        }
    }
}

/// Outcome of a login limiter check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDecision {
    Allowed { remaining: u32 },
    Locked { retry_after_secs: u64 },
}

impl LoginDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LoginDecision::Allowed { .. })
    }
}

/// Counts failed logins per key (lower-cased email) and locks the key out
pub struct LoginLimiter {
    entries: DashMap<String, LoginAttempts>,
    config: LoginLimitConfig,
}

impl LoginLimiter {
    pub fn new(config: LoginLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Whether `key` may attempt a login right now
    pub fn check(&self, key: &str) -> LoginDecision {
        if !self.config.enabled {
            return LoginDecision::Allowed {
                remaining: self.config.max_attempts,
            };
        }
        let Some(mut entry) = self.entries.get_mut(key) else {
            return LoginDecision::Allowed {
                remaining: self.config.max_attempts,
            };
        };
        if let Some(left) = entry.lockout_remaining() {
            return LoginDecision::Locked {
                retry_after_secs: left.as_secs().max(1),
            };
        }
        entry.reset_if_expired(self.config.window_duration);
        LoginDecision::Allowed {
            remaining: self.config.max_attempts.saturating_sub(entry.attempts),
        }
    }

    /// Count a failed login; the attempt reaching the limit starts the lockout
    pub fn record_failure(&self, key: &str) -> LoginDecision {
        if !self.config.enabled {
            return LoginDecision::Allowed {
                remaining: self.config.max_attempts,
            };
        }

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(LoginAttempts::new);

        if let Some(left) = entry.lockout_remaining() {
            return LoginDecision::Locked {
                retry_after_secs: left.as_secs().max(1),
            };
        }
        entry.reset_if_expired(self.config.window_duration);
        entry.attempts += 1;

        if entry.attempts >= self.config.max_attempts {
            entry.locked_until = Some(Instant::now() + self.config.lockout_duration);
            warn!(
                key = %key,
                lockout_secs = self.config.lockout_duration.as_secs(),
                "Login attempts exceeded, key locked"
            );
            return LoginDecision::Locked {
                retry_after_secs: self.config.lockout_duration.as_secs(),
            };
        }

        LoginDecision::Allowed {
            remaining: self.config.max_attempts - entry.attempts,
        }
    }

    pub fn record_success(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        let max_age = self.config.window_duration + self.config.lockout_duration;
        self.entries.retain(|_, entry| {
            entry.lockout_remaining().is_some() || now.duration_since(entry.first_attempt) < max_age
        });
    }
}

pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Periodically drop stale buckets and login entries
pub fn start_cleanup_task(
    requests: Arc<RateLimiterState>,
    logins: Arc<LoginLimiter>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            requests.cleanup();
            logins.cleanup();
            debug!(
                clients = requests.tracked_clients(),
                "Rate limiter cleanup completed"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_config(max_attempts: u32, enabled: bool) -> LoginLimitConfig {
        LoginLimitConfig {
            max_attempts,
            window_duration: Duration::from_secs(60),
            lockout_duration: Duration::from_secs(300),
            enabled,
        }
    }

    #[test]
    fn test_token_bucket() {
        let mut bucket = TokenBucket::new(5, Duration::from_secs(60));
        for _ in 0..5 {
            assert!(bucket.try_consume());
        }
        assert!(!bucket.try_consume());
    }

    #[test]
    fn test_token_bucket_refills_after_window() {
        let mut bucket = TokenBucket::new(1, Duration::from_millis(1));
        assert!(bucket.try_consume());
        std::thread::sleep(Duration::from_millis(5));
        assert!(bucket.try_consume());
    }

    #[test]
    fn test_rate_limiter_state() {
        let state = RateLimiterState::new(RateLimitConfig {
            max_requests: 3,
            window_duration: Duration::from_secs(60),
            enabled: true,
            ..Default::default()
        });

        for expected in [2, 1, 0] {
            assert_eq!(state.check_rate_limit("10.0.0.1"), (true, expected));
        }
        assert_eq!(state.check_rate_limit("10.0.0.1"), (false, 0));
        // other clients have their own bucket
        assert!(state.check_rate_limit("10.0.0.2").0);
        assert_eq!(state.tracked_clients(), 2);
    }

    #[test]
    fn test_rate_limiter_disabled() {
        let state = RateLimiterState::new(RateLimitConfig {
            max_requests: 1,
            window_duration: Duration::from_secs(60),
            enabled: false,
            ..Default::default()
        });
        for _ in 0..10 {
            assert!(state.check_rate_limit("10.0.0.1").0);
        }
        assert_eq!(state.tracked_clients(), 0);
    }

    #[test]
    fn test_client_key_ignores_untrusted_forwarding() {
        let req = actix_web::test::TestRequest::default()
            .peer_addr("203.0.113.9:4000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "10.0.0.7"))
            .to_srv_request();
        assert_eq!(client_key(&req, &[]), "203.0.113.9");

        let proxy: IpAddr = "203.0.113.9".parse().unwrap();
        assert_eq!(client_key(&req, &[proxy]), "10.0.0.7");

        let no_peer = actix_web::test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "10.0.0.7"))
            .to_srv_request();
        assert_eq!(client_key(&no_peer, &[proxy]), "unknown");
    }

    #[test]
    fn test_cleanup_keeps_recent_buckets() {
        let state = RateLimiterState::new(RateLimitConfig::default());
        state.check_rate_limit("10.0.0.1");
        state.cleanup();
        assert_eq!(state.tracked_clients(), 1);
    }

    #[test]
    fn test_login_limiter_locks_after_max_failures() {
        let limiter = LoginLimiter::new(login_config(3, true));

        assert_eq!(
            limiter.record_failure("a@b.co"),
            LoginDecision::Allowed { remaining: 2 }
        );
        assert_eq!(
            limiter.record_failure("a@b.co"),
            LoginDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.record_failure("a@b.co"),
            LoginDecision::Locked {
                retry_after_secs: 300
            }
        );
        assert!(!limiter.check("a@b.co").is_allowed());
        assert!(limiter.check("c@d.co").is_allowed());
    }

    #[test]
    fn test_login_limiter_success_resets() {
        let limiter = LoginLimiter::new(login_config(3, true));
        limiter.record_failure("a@b.co");
        limiter.record_failure("a@b.co");
        limiter.record_success("a@b.co");
        assert_eq!(
            limiter.check("a@b.co"),
            LoginDecision::Allowed { remaining: 3 }
        );
    }

    #[test]
    fn test_login_limiter_disabled() {
        let limiter = LoginLimiter::new(login_config(1, false));
        for _ in 0..10 {
            assert!(limiter.record_failure("a@b.co").is_allowed());
        }
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = start_cleanup_task(
            Arc::new(RateLimiterState::new(RateLimitConfig::default())),
            Arc::new(LoginLimiter::new(LoginLimitConfig::default())),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
