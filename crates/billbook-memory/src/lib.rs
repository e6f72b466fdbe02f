//! In-memory slot backend for Billbook.
//!
//! Slots live in a `BTreeMap` behind an `RwLock` and vanish with the process.
//! Useful for tests and for one-off sessions.

use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use billbook_core::storage::validate_slot_key;
use billbook_core::{SlotBackend, SlotUpdate, StorageError};

pub struct MemorySlots {
    slots: RwLock<BTreeMap<String, String>>,
}

impl Default for MemorySlots {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySlots {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.slots
            .read()
            .map_err(|e| StorageError::Other(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.slots
            .write()
            .map_err(|e| StorageError::Other(format!("Failed to acquire write lock: {}", e)))
    }
}

impl SlotBackend for MemorySlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_slot_key(key)?;
        Ok(self.read()?.get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        self.write()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        self.write()?.remove(key);
        Ok(())
    }

    fn list_slots(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn modify_slot(&self, key: &str, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        let mut slots = self.write()?;
        if let Some(next) = apply(slots.get(key).map(String::as_str))? {
            tracing::debug!(slot = key, bytes = next.len(), "Memory slot written");
            slots.insert(key.to_string(), next);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_remove() {
        let slots = MemorySlots::new();
        assert_eq!(slots.read_slot("saved_bills").unwrap(), None);

        slots.write_slot("saved_bills", "[]").unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap().as_deref(), Some("[]"));

        slots.write_slot("saved_bills02", "[1]").unwrap();
        assert_eq!(slots.list_slots().unwrap(), vec!["saved_bills", "saved_bills02"]);

        slots.remove_slot("saved_bills").unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap(), None);
        assert_eq!(slots.read_slot("saved_bills02").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_modify_writes_result() {
        let slots = MemorySlots::new();
        slots
            .modify_slot("saved_bills", &mut |current| {
                assert_eq!(current, None);
                Ok(Some("[\"a\"]".to_string()))
            })
            .unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap().as_deref(), Some("[\"a\"]"));
    }

    #[test]
    fn test_modify_error_leaves_slot_untouched() {
        let slots = MemorySlots::new();
        slots.write_slot("saved_bills", "[]").unwrap();

        let result = slots.modify_slot("saved_bills", &mut |_| Err(StorageError::NotFound("x".into())));
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        slots.modify_slot("saved_bills", &mut |_| Ok(None)).unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_rejects_unsafe_keys() {
        let slots = MemorySlots::new();
        assert!(matches!(
            slots.write_slot("../bills", "[]"),
            Err(StorageError::InvalidSlotKey(_))
        ));
        assert!(matches!(slots.read_slot("../bills"), Err(StorageError::InvalidSlotKey(_))));
        assert!(matches!(slots.remove_slot("../bills"), Err(StorageError::InvalidSlotKey(_))));
        assert!(matches!(
            slots.modify_slot("../bills", &mut |_| Ok(None)),
            Err(StorageError::InvalidSlotKey(_))
        ));
    }
}
