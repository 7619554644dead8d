//! Database layer for Invoice Intake
//!
//! Provides:
//! - Row models for the `invoices` table
//! - The invoice store (create, list, lookup, count, delete)
//! - Per-operation SQLite connections

pub mod models;
mod store;

pub use store::InvoiceStore;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;

/// Opens a fresh SQLite connection for every store operation.
///
/// There is no pool and no long-lived handle: callers `acquire` a
/// connection, run their statements, and hand it back to `release`.
/// A connection dropped on an early return is closed by its destructor.
#[derive(Clone, Debug)]
pub struct Connector {
    options: SqliteConnectOptions,
}

impl Connector {
    /// Build connect options from configuration; does not touch the file
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout());

        Self { options }
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        self.options.get_filename()
    }

    /// Open a connection to the database file
    pub async fn acquire(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to open {}: {}", self.path().display(), e),
            })
    }

    /// Close a connection, logging rather than failing if the close errors
    pub async fn release(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection");
        }
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.acquire().await?;
        let outcome = sqlx::query("SELECT 1").execute(&mut conn).await;
        Self::release(conn).await;

        outcome.map(|_| ()).map_err(|e| AppError::DatabaseConnection {
            message: format!("Ping failed: {}", e),
        })
    }
}
