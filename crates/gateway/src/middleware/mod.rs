//! Gateway middleware

pub mod catch_panic;
pub mod request_metrics;
