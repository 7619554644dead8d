//! Invoice Intake Common Library
//!
//! Shared code for the Invoice Intake service including:
//! - Configuration management
//! - Error types and handling
//! - Bearer token authentication
//! - The SQLite invoice store and its row models
//! - Metrics helpers

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use auth::BearerAuth;
pub use config::AppConfig;
pub use db::InvoiceStore;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by the info endpoint
pub const SERVICE_NAME: &str = "JSON POST Endpoint API";
