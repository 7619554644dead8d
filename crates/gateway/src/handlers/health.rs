//! Service info and health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;
use invoice_intake_common::SERVICE_NAME;

use super::utc_timestamp;

#[derive(Serialize)]
pub struct InfoResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Static service description
pub async fn root() -> Json<InfoResponse> {
    let endpoints = BTreeMap::from([
        ("GET /health", "Health check"),
        ("GET /ready", "Readiness check"),
        ("POST /data", "Submit JSON data wrapped in a data field (echo only)"),
        ("POST /data/raw", "Submit and store any JSON object"),
        ("GET /invoices", "List stored invoices"),
        ("GET /invoices/{invoice_number}", "Look up an invoice by number"),
    ]);

    Json(InfoResponse {
        message: SERVICE_NAME,
        status: "running",
        version: invoice_intake_common::VERSION,
        endpoints,
    })
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: utc_timestamp(),
    })
}

/// Readiness probe - checks the database file can be opened
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let db_check = match state.store.ping().await {
        Ok(_) => CheckResult {
            status: "up",
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down",
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = db_check.status == "up";
    let status = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" },
            checks: HealthChecks {
                database: db_check,
            },
        }),
    )
}
