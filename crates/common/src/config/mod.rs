//! Configuration management for Invoice Intake services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values
//!
//! The conventional `API_BEARER_TOKEN` variable overrides `auth.bearer_token`.

use crate::errors::Result;
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Insecure fallback used when no bearer token is configured
pub const DEFAULT_BEARER_TOKEN: &str = "your-secret-token-here";

/// Environment variable that carries the bearer token
pub const BEARER_TOKEN_ENV: &str = "API_BEARER_TOKEN";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// How long a connection waits on a locked database, in seconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Expected bearer token for protected routes
    #[serde(default = "default_bearer_token")]
    pub bearer_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_database_path() -> PathBuf { PathBuf::from("invoices.db") }
fn default_busy_timeout() -> u64 { 5 }
fn default_bearer_token() -> String { DEFAULT_BEARER_TOKEN.to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 0 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Self::builder_with_defaults()?
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .set_override_option("auth.bearer_token", std::env::var(BEARER_TOKEN_ENV).ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Self::builder_with_defaults()?
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .set_override_option("auth.bearer_token", std::env::var(BEARER_TOKEN_ENV).ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// One default per section so every table exists before deserializing
    fn builder_with_defaults() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "invoices.db")?
            .set_default("auth.bearer_token", DEFAULT_BEARER_TOKEN)?
            .set_default("observability.log_level", "info")
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    /// Get busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl AuthConfig {
    /// True when the token is still the documented insecure default
    pub fn uses_default_token(&self) -> bool {
        self.bearer_token == DEFAULT_BEARER_TOKEN
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            database: DatabaseConfig {
                path: default_database_path(),
                busy_timeout_secs: default_busy_timeout(),
            },
            auth: AuthConfig {
                bearer_token: default_bearer_token(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
            },
        }
    }
}
