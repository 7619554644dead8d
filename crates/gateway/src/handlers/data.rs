//! Payload submission handlers
//!
//! `/data` is an echo-only demo path; `/data/raw` is the ingestion path
//! that persists the payload.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{value::RawValue, Map, Value};

use crate::AppState;
use invoice_intake_common::{
    db::models::InvoiceFields,
    errors::{AppError, Result},
    metrics,
};

use super::utc_timestamp;

/// Body accepted by `/data`
#[derive(Debug, Deserialize)]
pub struct DataRequest {
    pub data: Map<String, Value>,
}

#[derive(Serialize)]
pub struct DataResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub received_data: Map<String, Value>,
    pub timestamp: String,
    pub data_keys: Vec<String>,
}

#[derive(Serialize)]
pub struct RawDataResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub received_data: Box<RawValue>,
    pub database_id: i64,
    pub timestamp: String,
}

/// Echo a `{"data": {...}}` body back; nothing is stored
pub async fn receive_data(
    payload: std::result::Result<Json<DataRequest>, JsonRejection>,
) -> Result<Json<DataResponse>> {
    let Json(request) = payload?;

    let data_keys: Vec<String> = request.data.keys().cloned().collect();
    tracing::info!(keys = ?data_keys, "Received data");

    Ok(Json(DataResponse {
        status: "success",
        message: "Data received successfully",
        received_data: request.data,
        timestamp: utc_timestamp(),
        data_keys,
    }))
}

/// Persist any JSON object and return the assigned id.
///
/// The body text is kept byte for byte; it is parsed only to check that it
/// is an object and to pull out the known fields.
pub async fn receive_raw_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RawDataResponse>> {
    if !has_json_content_type(&headers) {
        return Err(AppError::validation(
            "Expected request with `Content-Type: application/json`",
        ));
    }

    let Json(object) = Json::<Map<String, Value>>::from_bytes(&body)?;
    let fields = InvoiceFields::extract(&object);

    let text = String::from_utf8(body.to_vec())
        .map_err(|e| AppError::validation(format!("Request body is not UTF-8: {}", e)))?;
    let received = RawValue::from_string(text)?;
    tracing::debug!(payload = received.get(), "Received raw data");

    let database_id = state.store.insert(&fields, received.get()).await?;
    metrics::record_invoice_stored();

    Ok(Json(RawDataResponse {
        status: "success",
        message: "Raw data received successfully",
        received_data: received,
        database_id,
        timestamp: utc_timestamp(),
    }))
}

// `application/json` or any `+json` media type, parameters ignored
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json")
            || subtype.to_ascii_lowercase().ends_with("+json"))
}
