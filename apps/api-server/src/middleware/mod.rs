//! Extractors, error mapping and request middleware.

pub mod auth;
pub mod error;

#[cfg(feature = "rate-limit")]
pub mod throttle;
