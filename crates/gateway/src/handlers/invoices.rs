//! Invoice read handlers

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use invoice_intake_common::{
    db::models::Invoice,
    errors::{AppError, Result},
};

/// Paging parameters for `/invoices`
#[derive(Debug, Deserialize, Validate)]
pub struct ListInvoicesQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

fn default_limit() -> i64 { 100 }

#[derive(Serialize)]
pub struct ListInvoicesResponse {
    pub status: &'static str,
    pub total_count: i64,
    pub returned_count: usize,
    pub limit: i64,
    pub offset: i64,
    pub invoices: Vec<Invoice>,
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub status: &'static str,
    pub invoice: Invoice,
}

/// List stored invoices, most recent first
pub async fn list_invoices(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListInvoicesQuery>, QueryRejection>,
) -> Result<Json<ListInvoicesResponse>> {
    let Query(params) = query?;
    params
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let invoices = state.store.list(params.limit, params.offset).await?;
    let total_count = state.store.count().await?;

    Ok(Json(ListInvoicesResponse {
        status: "success",
        total_count,
        returned_count: invoices.len(),
        limit: params.limit,
        offset: params.offset,
        invoices,
    }))
}

/// Look up the most recent invoice with this number
pub async fn get_invoice(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<InvoiceResponse>> {
    let Path(invoice_number) = path?;

    let invoice = state
        .store
        .find_by_invoice_number(&invoice_number)
        .await?
        .ok_or(AppError::InvoiceNotFound { invoice_number })?;

    Ok(Json(InvoiceResponse {
        status: "success",
        invoice,
    }))
}
