//! Row models for the invoice store

mod invoice;

pub use invoice::{Invoice, InvoiceFields};
