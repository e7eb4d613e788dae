// HTTP middleware implementations
// Authentication context and rate limiting

pub mod auth;
pub mod rate_limit;
