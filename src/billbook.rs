use std::{fs, sync::Arc};

use billbook_core::{Bill, BillSummary, SameCustomerAndReference, SlotBackend, StorageError};
use billbook_memory::MemorySlots;
use billbook_sqlite::SqliteSlots;

use crate::{
    config::{BackendKind, Config, StorageConfig, StoresConfig},
    file_storage::FileSlots,
    store::RecordStore,
};

/// File name of the SQLite database inside the data directory.
pub const SQLITE_FILE: &str = "billbook.sqlite3";

pub type BillStore = RecordStore<Bill>;
pub type BillSummaryStore = RecordStore<BillSummary>;

/// The two independent record stores, sharing one backend.
pub struct Billbook {
    pub bills: BillStore,
    pub summaries: BillSummaryStore,
}

impl Billbook {
    pub fn new(backend: Arc<dyn SlotBackend>, stores: &StoresConfig) -> Self {
        Self {
            bills: RecordStore::new(backend.clone(), &stores.bills_slot)
                .with_sequence(stores.invoice_sequence),
            summaries: RecordStore::new(backend, &stores.summaries_slot)
                .with_sequence(stores.invoice_sequence)
                .with_duplicate_check(Arc::new(SameCustomerAndReference)),
        }
    }

    pub fn open(config: &Config) -> Result<Self, StorageError> {
        let backend = open_backend(&config.storage)?;
        Ok(Self::new(backend, &config.stores))
    }
}

pub fn open_backend(storage: &StorageConfig) -> Result<Arc<dyn SlotBackend>, StorageError> {
    tracing::info!(backend = ?storage.backend, path = %storage.path.display(), "Opening storage");
    match storage.backend {
        BackendKind::File => Ok(Arc::new(FileSlots::open(&storage.path)?)),
        BackendKind::Sqlite => {
            fs::create_dir_all(&storage.path)?;
            let db = storage.path.join(SQLITE_FILE);
            Ok(Arc::new(SqliteSlots::new(&db.to_string_lossy())?))
        }
        BackendKind::Memory => Ok(Arc::new(MemorySlots::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbook_core::{BillSummaryDraft, InvoiceSequence, StoredRecord};
    use tempfile::TempDir;

    #[test]
    fn test_stores_use_separate_slots() {
        let backend: Arc<dyn SlotBackend> = Arc::new(MemorySlots::new());
        let book = Billbook::new(backend.clone(), &StoresConfig::default());

        book.summaries.save(BillSummaryDraft::default()).unwrap();
        assert_eq!(backend.list_slots().unwrap(), vec!["saved_bills02"]);
        assert!(book.bills.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_open_each_backend() {
        let dir = TempDir::new().unwrap();
        for backend in [BackendKind::File, BackendKind::Sqlite, BackendKind::Memory] {
            let config = Config {
                storage: StorageConfig {
                    backend,
                    path: dir.path().join(format!("{:?}", backend)),
                },
                stores: StoresConfig {
                    invoice_sequence: InvoiceSequence::NextAfterHighest,
                    ..StoresConfig::default()
                },
                ..Config::default()
            };
            let book = Billbook::open(&config).unwrap();
            let saved = book.summaries.save(BillSummaryDraft::default()).unwrap();
            assert_eq!(book.summaries.get_by_id(saved.id()).unwrap(), Some(saved));
        }
        assert!(dir.path().join("Sqlite").join(SQLITE_FILE).exists());
        assert!(dir.path().join("File").join("saved_bills02.json").exists());
    }
}
