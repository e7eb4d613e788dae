//! Authentication service implementations

pub mod account;
pub mod auth;
