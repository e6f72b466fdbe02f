//! Billbook keeps bill records in two independent persisted slots.
//!
//! [`RecordStore`] is the generic store; [`Billbook`] wires up the full bill
//! store and the duplicate-checked summary store on one slot backend.

pub mod billbook;
pub mod commands;
pub mod config;
pub mod file_storage;
pub mod store;
pub mod table;

// Re-export core types so callers only need this crate
pub use billbook::{BillStore, BillSummaryStore, Billbook};
pub use billbook_core::{
    Bill, BillDraft, BillPatch, BillSummary, BillSummaryDraft, BillSummaryPatch, BillTotals,
    InvoiceSequence, LineItem, PaymentStatus, RecordMeta, SlotBackend, StorageError,
    StoredRecord, TaxComponent,
};
pub use store::RecordStore;
