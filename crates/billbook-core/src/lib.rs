//! Core types and traits for Billbook record stores.
//!
//! This crate provides the bill record shapes, the `StoredRecord` trait the
//! generic store is written against, and the `SlotBackend` trait that lets
//! persisted slots live in memory, in SQLite, or in plain JSON files.

pub mod invoice;
pub mod models;
pub mod record;
pub mod storage;

// Re-export key types at crate root for convenience
pub use invoice::{format_invoice_number, parse_invoice_number, InvoiceSequence};
pub use models::{PaymentStatus, RecordMeta};
pub use models::bill::{Bill, BillDraft, BillPatch, BillTotals, LineItem, TaxComponent};
pub use models::summary::{BillSummary, BillSummaryDraft, BillSummaryPatch, SameCustomerAndReference};
pub use record::{timestamp_now, DuplicateCheck, StoredRecord};
pub use storage::{SlotBackend, SlotUpdate, StorageError};
