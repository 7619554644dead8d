//! Invoice entity and the typed projection extracted from raw payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored invoice row.
///
/// The typed columns are a denormalized projection of `raw_payload`, which
/// stays the source of truth.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,

    pub file_name: Option<String>,

    pub invoice_number: Option<String>,

    pub invoice_date: Option<String>,

    pub total_amount: Option<f64>,

    pub ct_number: Option<String>,

    pub mot: Option<String>,

    pub office: Option<String>,

    pub direction: Option<String>,

    pub calculated_code: Option<i64>,

    /// UTC RFC 3339 timestamp set at insertion
    pub created_at: String,

    /// The received JSON, serialized
    pub raw_payload: String,
}

impl Invoice {
    /// Parse the stored payload back into a JSON value
    pub fn payload(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.raw_payload)
    }
}

/// Known invoice fields looked up by exact key name.
///
/// Every lookup is independent: an absent key, a `null`, or a value the
/// column cannot hold leaves the field `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceFields {
    pub file_name: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub total_amount: Option<f64>,
    pub ct_number: Option<String>,
    pub mot: Option<String>,
    pub office: Option<String>,
    pub direction: Option<String>,
    pub calculated_code: Option<i64>,
}

impl InvoiceFields {
    /// Extract the known fields from a payload object
    pub fn extract(payload: &Map<String, Value>) -> Self {
        Self {
            file_name: text_field(payload, "file_name"),
            invoice_number: text_field(payload, "invoice_number"),
            invoice_date: text_field(payload, "invoice_date"),
            total_amount: real_field(payload, "total_amount"),
            ct_number: text_field(payload, "ct_number"),
            mot: text_field(payload, "mot"),
            office: text_field(payload, "office"),
            direction: text_field(payload, "direction"),
            calculated_code: integer_field(payload, "calculated_code"),
        }
    }
}

// Booleans bind as the integers 1 and 0, as SQLite stores them
fn text_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(i64::from(*b).to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn real_field(payload: &Map<String, Value>, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn integer_field(payload: &Map<String, Value>, key: &str) -> Option<i64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64)
                .map(|v| v as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extract_known_fields() {
        let fields = InvoiceFields::extract(&object(json!({
            "file_name": "scan-001.pdf",
            "invoice_number": "INV-1",
            "invoice_date": "2024-03-01",
            "total_amount": 42.5,
            "ct_number": "CT-77",
            "mot": "SEA",
            "office": "ROTTERDAM",
            "direction": "IMPORT",
            "calculated_code": 7
        })));

        assert_eq!(fields.file_name.as_deref(), Some("scan-001.pdf"));
        assert_eq!(fields.invoice_number.as_deref(), Some("INV-1"));
        assert_eq!(fields.invoice_date.as_deref(), Some("2024-03-01"));
        assert_eq!(fields.total_amount, Some(42.5));
        assert_eq!(fields.ct_number.as_deref(), Some("CT-77"));
        assert_eq!(fields.mot.as_deref(), Some("SEA"));
        assert_eq!(fields.office.as_deref(), Some("ROTTERDAM"));
        assert_eq!(fields.direction.as_deref(), Some("IMPORT"));
        assert_eq!(fields.calculated_code, Some(7));
    }

    #[test]
    fn test_unknown_keys_leave_fields_empty() {
        let fields = InvoiceFields::extract(&object(json!({ "foo": "bar" })));
        assert_eq!(fields, InvoiceFields::default());
    }

    #[test]
    fn test_lookups_fail_independently() {
        let fields = InvoiceFields::extract(&object(json!({
            "invoice_number": 1001,
            "total_amount": "19.99",
            "calculated_code": 12.0,
            "office": ["a", "b"],
            "mot": null,
            "direction": { "from": "x" }
        })));

        assert_eq!(fields.invoice_number.as_deref(), Some("1001"));
        assert_eq!(fields.total_amount, Some(19.99));
        assert_eq!(fields.calculated_code, Some(12));
        assert_eq!(fields.office, None);
        assert_eq!(fields.mot, None);
        assert_eq!(fields.direction, None);
    }

    #[test]
    fn test_incompatible_numeric_values() {
        let fields = InvoiceFields::extract(&object(json!({
            "total_amount": "n/a",
            "calculated_code": 3.5
        })));
        assert_eq!(fields.total_amount, None);
        assert_eq!(fields.calculated_code, None);
    }

    #[test]
    fn test_booleans_bind_as_integers() {
        let fields = InvoiceFields::extract(&object(json!({
            "office": true,
            "mot": false,
            "total_amount": true,
            "calculated_code": false
        })));
        assert_eq!(fields.office.as_deref(), Some("1"));
        assert_eq!(fields.mot.as_deref(), Some("0"));
        assert_eq!(fields.total_amount, Some(1.0));
        assert_eq!(fields.calculated_code, Some(0));
    }
}
