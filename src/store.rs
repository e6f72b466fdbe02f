//! Generic record store over one persisted slot.
//!
//! A store keeps every record of one shape as a single JSON array under one
//! slot key. Reads decode the whole array; mutations decode, change and
//! re-encode it inside [`SlotBackend::modify_slot`] while holding the store's
//! own lock, so two operations on the same store never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use billbook_core::{
    format_invoice_number, timestamp_now, DuplicateCheck, InvoiceSequence, PaymentStatus,
    RecordMeta, SlotBackend, StorageError, StoredRecord,
};

/// Record keys set by the store and never taken from an update patch.
const MANAGED_KEYS: [&str; 4] = ["id", "invoiceNumber", "createdAt", "updatedAt"];

pub struct RecordStore<R: StoredRecord> {
    backend: Arc<dyn SlotBackend>,
    slot: Arc<str>,
    sequence: InvoiceSequence,
    duplicate_check: Option<Arc<dyn DuplicateCheck<R>>>,
    lock: Mutex<()>,
}

impl<R: StoredRecord> RecordStore<R> {
    pub fn new(backend: Arc<dyn SlotBackend>, slot: &str) -> Self {
        Self {
            backend,
            slot: Arc::from(slot),
            sequence: InvoiceSequence::default(),
            duplicate_check: None,
            lock: Mutex::new(()),
        }
    }

    pub fn with_sequence(mut self, sequence: InvoiceSequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_duplicate_check(mut self, check: Arc<dyn DuplicateCheck<R>>) -> Self {
        self.duplicate_check = Some(check);
        self
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Creates a record from `draft` with a fresh id, invoice number and
    /// creation time, status `Pending`, and appends it to the slot.
    pub fn save(&self, draft: R::Draft) -> Result<R, StorageError> {
        self.modify(|records| {
            if let Some(check) = &self.duplicate_check {
                if let Some(existing) = records.iter().find(|r| check.is_duplicate(&draft, r)) {
                    tracing::debug!(slot = %self.slot, existing_id = existing.id(), "Duplicate record rejected");
                    return Err(StorageError::DuplicateRecord {
                        existing_id: existing.id().to_string(),
                        invoice_number: existing.meta().invoice_number.clone(),
                    });
                }
            }

            let now = timestamp_now();
            let sequence = self.sequence.next(
                now.year(),
                records.iter().map(|r| r.meta().invoice_number.as_str()),
            );
            let meta = RecordMeta {
                id: next_id(now, records),
                invoice_number: format_invoice_number(now.year(), sequence),
                status: PaymentStatus::Pending,
                created_at: now,
                updated_at: None,
            };
            let record = R::from_draft(draft.clone(), meta);
            tracing::debug!(
                slot = %self.slot,
                id = record.id(),
                invoice_number = %record.meta().invoice_number,
                "Record saved"
            );
            records.push(record.clone());
            Ok((record, true))
        })
    }

    /// All records in stored order. A missing or unreadable slot is empty.
    pub fn get_all(&self) -> Result<Vec<R>, StorageError> {
        let _guard = self.guard()?;
        let text = self.backend.read_slot(&self.slot)?;
        Ok(self.decode(text.as_deref()))
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<R>, StorageError> {
        Ok(self.get_all()?.into_iter().find(|r| r.id() == id))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.get_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Merges the fields of `patch` over the stored record.
    ///
    /// `patch` must serialize to a JSON object. Its keys replace the
    /// record's keys one for one, except the store-managed id, invoice
    /// number and timestamps, which are ignored whatever their value. The
    /// update time is then set to now.
    pub fn update<P: Serialize>(&self, id: &str, patch: &P) -> Result<R, StorageError> {
        let fields = match serde_json::to_value(patch) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(StorageError::InvalidPatch("patch must be a JSON object".into())),
            Err(e) => return Err(StorageError::InvalidPatch(e.to_string())),
        };

        self.modify(|records| {
            let index = position(records, id).ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            let original = &records[index];

            let mut merged = serde_json::to_value(original)?;
            if let Value::Object(target) = &mut merged {
                for (key, value) in &fields {
                    if !MANAGED_KEYS.contains(&key.as_str()) {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
            let mut updated: R = serde_json::from_value(merged)
                .map_err(|e| StorageError::InvalidPatch(e.to_string()))?;
            updated.meta_mut().restore_identity(original.meta());
            updated.meta_mut().touch(timestamp_now());

            tracing::debug!(slot = %self.slot, id, fields = fields.len(), "Record updated");
            records[index] = updated.clone();
            Ok((updated, true))
        })
    }

    /// Sets the status of a record. Does nothing if `id` is not stored.
    pub fn update_status(&self, id: &str, status: PaymentStatus) -> Result<(), StorageError> {
        self.modify(|records| match position(records, id) {
            Some(index) => {
                let meta = records[index].meta_mut();
                meta.status = status;
                meta.touch(timestamp_now());
                tracing::debug!(slot = %self.slot, id, %status, "Record status updated");
                Ok(((), true))
            }
            None => {
                tracing::debug!(slot = %self.slot, id, "Status update for unknown record ignored");
                Ok(((), false))
            }
        })
    }

    /// Removes a record. Returns `false` if `id` is not stored.
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        self.modify(|records| match position(records, id) {
            Some(index) => {
                records.remove(index);
                tracing::debug!(slot = %self.slot, id, "Record deleted");
                Ok((true, true))
            }
            None => Ok((false, false)),
        })
    }

    /// The stored array as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&self.get_all()?)?)
    }

    /// Replaces the slot content with the records in `text`.
    ///
    /// Unlike reads, an import is strict: `text` must be a JSON array of
    /// records of this store's shape with unique ids.
    pub fn import_json(&self, text: &str) -> Result<usize, StorageError> {
        let records: Vec<R> =
            serde_json::from_str(text).map_err(|e| StorageError::InvalidImport(e.to_string()))?;
        for (i, record) in records.iter().enumerate() {
            if records[..i].iter().any(|r| r.id() == record.id()) {
                return Err(StorageError::InvalidImport(format!("duplicate id {}", record.id())));
            }
        }

        let _guard = self.guard()?;
        self.backend.write_slot(&self.slot, &serde_json::to_string(&records)?)?;
        tracing::info!(slot = %self.slot, count = records.len(), "Records imported");
        Ok(records.len())
    }

    /// Drops the slot entirely.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        self.backend.remove_slot(&self.slot)?;
        tracing::info!(slot = %self.slot, "Slot cleared");
        Ok(())
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.lock
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire store lock: {}", e)))
    }

    fn decode(&self, text: Option<&str>) -> Vec<R> {
        let Some(text) = text else {
            return Vec::new();
        };
        match serde_json::from_str(text) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Unreadable slot treated as empty");
                Vec::new()
            }
        }
    }

    /// Runs one read-modify-write cycle. `apply` returns its result and
    /// whether the array changed; unchanged arrays are not written back.
    fn modify<T>(
        &self,
        mut apply: impl FnMut(&mut Vec<R>) -> Result<(T, bool), StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self.guard()?;
        let mut outcome = None;
        self.backend.modify_slot(&self.slot, &mut |current| {
            let mut records = self.decode(current);
            let (value, changed) = apply(&mut records)?;
            outcome = Some(value);
            if changed {
                Ok(Some(serde_json::to_string(&records)?))
            } else {
                Ok(None)
            }
        })?;
        outcome.ok_or_else(|| StorageError::Other(format!("slot {} was never read", self.slot)))
    }
}

fn position<R: StoredRecord>(records: &[R], id: &str) -> Option<usize> {
    records.iter().position(|r| r.id() == id)
}

/// Millisecond timestamp of `now`, bumped past any id already in use.
fn next_id<R: StoredRecord>(now: OffsetDateTime, records: &[R]) -> String {
    let mut candidate = now.unix_timestamp_nanos() / 1_000_000;
    loop {
        let id = candidate.to_string();
        if !records.iter().any(|r| r.id() == id) {
            return id;
        }
        candidate += 1;
    }
}
