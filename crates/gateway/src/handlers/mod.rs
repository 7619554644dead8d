//! API handlers module

pub mod data;
pub mod health;
pub mod invoices;

use chrono::Utc;

/// Current UTC time as RFC 3339
pub(crate) fn utc_timestamp() -> String {
    Utc::now().to_rfc3339()
}
