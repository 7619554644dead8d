//! Invoice store: durable CRUD over the `invoices` table
//!
//! The store trusts its caller for field extraction and performs no
//! business validation. Each operation acquires its own connection and
//! releases it before returning, whether the statement succeeded or not.

use crate::config::DatabaseConfig;
use crate::db::models::{Invoice, InvoiceFields};
use crate::db::Connector;
use crate::errors::Result;
use crate::metrics::record_store_operation;
use chrono::{SecondsFormat, Utc};
use std::time::Instant;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_name TEXT,
        invoice_number TEXT,
        invoice_date TEXT,
        total_amount REAL,
        ct_number TEXT,
        mot TEXT,
        office TEXT,
        direction TEXT,
        calculated_code INTEGER,
        created_at TEXT NOT NULL,
        raw_payload TEXT NOT NULL
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_invoice_number ON invoices(invoice_number)";

const INSERT_INVOICE: &str = r#"
    INSERT INTO invoices (
        file_name, invoice_number, invoice_date, total_amount,
        ct_number, mot, office, direction, calculated_code,
        created_at, raw_payload
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_COLUMNS: &str = r#"
    SELECT id, file_name, invoice_number, invoice_date, total_amount,
           ct_number, mot, office, direction, calculated_code,
           created_at, raw_payload
    FROM invoices
"#;

/// Store for invoice records
#[derive(Clone, Debug)]
pub struct InvoiceStore {
    connector: Connector,
}

impl InvoiceStore {
    /// Create a store over the configured database file
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            connector: Connector::new(config),
        }
    }

    /// Get the connector backing this store
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.connector.ping().await
    }

    /// Create the table and the `invoice_number` index if missing.
    ///
    /// Safe to call on every start.
    pub async fn initialize(&self) -> Result<()> {
        let mut conn = self.connector.acquire().await?;
        let outcome = async {
            sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
            sqlx::query(CREATE_INDEX).execute(&mut conn).await?;
            Ok::<_, sqlx::Error>(())
        }
        .await;
        Connector::release(conn).await;
        outcome?;

        tracing::info!(path = %self.connector.path().display(), "Database initialized");
        Ok(())
    }

    /// Append a record and return its id.
    ///
    /// `raw_payload` is the JSON text exactly as received; it is stored
    /// unchanged.
    pub async fn insert(&self, fields: &InvoiceFields, raw_payload: &str) -> Result<i64> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
        let start = Instant::now();

        let mut conn = self.connector.acquire().await?;
        let outcome = sqlx::query(INSERT_INVOICE)
            .bind(fields.file_name.as_deref())
            .bind(fields.invoice_number.as_deref())
            .bind(fields.invoice_date.as_deref())
            .bind(fields.total_amount)
            .bind(fields.ct_number.as_deref())
            .bind(fields.mot.as_deref())
            .bind(fields.office.as_deref())
            .bind(fields.direction.as_deref())
            .bind(fields.calculated_code)
            .bind(&created_at)
            .bind(raw_payload)
            .execute(&mut conn)
            .await;
        Connector::release(conn).await;
        record_store_operation("insert", start.elapsed().as_secs_f64(), outcome.is_ok());

        let id = outcome?.last_insert_rowid();
        tracing::info!(
            id,
            invoice_number = fields.invoice_number.as_deref().unwrap_or("<none>"),
            "Saved invoice"
        );
        Ok(id)
    }

    /// Most recent records first, skipping `offset` and returning at most `limit`.
    ///
    /// Bounds are the caller's job; whatever is passed goes to SQLite.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Invoice>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?", SELECT_COLUMNS);
        let start = Instant::now();

        let mut conn = self.connector.acquire().await?;
        let outcome = sqlx::query_as::<_, Invoice>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut conn)
            .await;
        Connector::release(conn).await;
        record_store_operation("list", start.elapsed().as_secs_f64(), outcome.is_ok());

        Ok(outcome?)
    }

    /// Most recently created record with this exact invoice number
    pub async fn find_by_invoice_number(&self, invoice_number: &str) -> Result<Option<Invoice>> {
        let sql = format!(
            "{} WHERE invoice_number = ? ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let start = Instant::now();

        let mut conn = self.connector.acquire().await?;
        let outcome = sqlx::query_as::<_, Invoice>(&sql)
            .bind(invoice_number)
            .fetch_optional(&mut conn)
            .await;
        Connector::release(conn).await;
        record_store_operation("find", start.elapsed().as_secs_f64(), outcome.is_ok());

        Ok(outcome?)
    }

    /// Total number of stored records
    pub async fn count(&self) -> Result<i64> {
        let start = Instant::now();

        let mut conn = self.connector.acquire().await?;
        let outcome = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(&mut conn)
            .await;
        Connector::release(conn).await;
        record_store_operation("count", start.elapsed().as_secs_f64(), outcome.is_ok());

        Ok(outcome?)
    }

    /// Hard delete by id; false when no such row existed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let start = Instant::now();

        let mut conn = self.connector.acquire().await?;
        let outcome = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await;
        Connector::release(conn).await;
        record_store_operation("delete", start.elapsed().as_secs_f64(), outcome.is_ok());

        let deleted = outcome?.rows_affected() > 0;
        if deleted {
            tracing::info!(id, "Deleted invoice");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, InvoiceStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("invoices.db"),
            busy_timeout_secs: 5,
        };
        let store = InvoiceStore::new(&config);
        store.initialize().await.unwrap();
        (dir, store)
    }

    async fn insert_payload(store: &InvoiceStore, payload: serde_json::Value) -> i64 {
        let fields = payload
            .as_object()
            .map(InvoiceFields::extract)
            .unwrap_or_default();
        store.insert(&fields, &payload.to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (_dir, store) = open_store().await;
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        let mut conn = store.connector().acquire().await.unwrap();
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'invoices'",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        let indexes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_invoice_number'",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        Connector::release(conn).await;

        assert_eq!(tables, 1);
        assert_eq!(indexes, 1);
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let (_dir, store) = open_store().await;
        let payload = json!({
            "invoice_number": "INV-1",
            "total_amount": 42.5,
            "lines": [{ "sku": "A-1", "qty": 2 }],
            "note": null
        });

        let id = insert_payload(&store, payload.clone()).await;
        let invoice = store.find_by_invoice_number("INV-1").await.unwrap().unwrap();

        assert_eq!(invoice.id, id);
        assert_eq!(invoice.total_amount, Some(42.5));
        assert_eq!(invoice.file_name, None);
        assert_eq!(invoice.payload().unwrap(), payload);
        assert!(chrono::DateTime::parse_from_rfc3339(&invoice.created_at).is_ok());
    }

    #[tokio::test]
    async fn test_raw_payload_is_stored_verbatim() {
        let (_dir, store) = open_store().await;
        let raw = r#"{"invoice_number":"BIG","ref":123456789012345678901234567890,"z":1,"a":2.50}"#;
        let fields = InvoiceFields {
            invoice_number: Some("BIG".to_string()),
            ..Default::default()
        };

        store.insert(&fields, raw).await.unwrap();
        let invoice = store.find_by_invoice_number("BIG").await.unwrap().unwrap();
        assert_eq!(invoice.raw_payload, raw);
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let (_dir, store) = open_store().await;
        let first = insert_payload(&store, json!({ "a": 1 })).await;
        let second = insert_payload(&store, json!({ "a": 2 })).await;
        store.delete(second).await.unwrap();
        let third = insert_payload(&store, json!({ "a": 3 })).await;

        assert!(second > first);
        assert!(third > second);
    }

    #[tokio::test]
    async fn test_find_returns_most_recent_match() {
        let (_dir, store) = open_store().await;
        insert_payload(&store, json!({ "invoice_number": "DUP", "office": "first" })).await;
        let latest = insert_payload(&store, json!({ "invoice_number": "DUP", "office": "second" })).await;

        let invoice = store.find_by_invoice_number("DUP").await.unwrap().unwrap();
        assert_eq!(invoice.id, latest);
        assert_eq!(invoice.office.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_find_is_exact_match() {
        let (_dir, store) = open_store().await;
        insert_payload(&store, json!({ "invoice_number": "INV-100" })).await;

        assert!(store.find_by_invoice_number("INV-10").await.unwrap().is_none());
        assert!(store.find_by_invoice_number("inv-100").await.unwrap().is_none());
        assert!(store.find_by_invoice_number("INV-100").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_paging_and_order() {
        let (_dir, store) = open_store().await;
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(insert_payload(&store, json!({ "invoice_number": format!("INV-{}", n) })).await);
        }

        let all = store.list(100, 0).await.unwrap();
        let listed: Vec<i64> = all.iter().map(|i| i.id).collect();
        let expected: Vec<i64> = ids.iter().rev().copied().collect();
        assert_eq!(listed, expected);

        let page = store.list(2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[3]);
        assert_eq!(page[1].id, ids[2]);

        assert_eq!(store.list(10, 4).await.unwrap().len(), 1);
        assert!(store.list(10, 5).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list(100, 0).await.unwrap().is_empty());
        assert!(store.find_by_invoice_number("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = open_store().await;
        let id = insert_payload(&store, json!({ "invoice_number": "GONE" })).await;

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(!store.delete(9999).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("missing-dir").join("invoices.db"),
            busy_timeout_secs: 1,
        };
        let store = InvoiceStore::new(&config);

        let err = store.initialize().await.unwrap_err();
        assert!(err.is_server_error());
        assert!(store.ping().await.is_err());
    }
}
