use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("duplicate record: matches existing record {existing_id} ({invoice_number})")]
    DuplicateRecord {
        existing_id: String,
        invoice_number: String,
    },
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("invalid import: {0}")]
    InvalidImport(String),
    #[error("invalid slot key: {0}")]
    InvalidSlotKey(String),
}

/// Read-modify-write callback passed to [`SlotBackend::modify_slot`].
///
/// Receives the current slot text (if any) and returns `Some(text)` to
/// replace it or `None` to leave the slot untouched. An error aborts the
/// operation without writing.
pub type SlotUpdate<'a> = dyn FnMut(Option<&str>) -> Result<Option<String>, StorageError> + 'a;

/// A string-keyed persistent store holding one serialized blob per slot.
pub trait SlotBackend: Send + Sync {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_slot(&self, key: &str) -> Result<(), StorageError>;
    fn list_slots(&self) -> Result<Vec<String>, StorageError>;

    /// Runs `apply` against the current slot content and writes its result.
    ///
    /// The default implementation is a plain read followed by a write.
    /// Backends that can hold a lock or transaction across both steps
    /// override it.
    fn modify_slot(&self, key: &str, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        let current = self.read_slot(key)?;
        if let Some(next) = apply(current.as_deref())? {
            self.write_slot(key, &next)?;
        }
        Ok(())
    }
}

/// Slot keys double as file names and table keys, so keep them to a safe
/// identifier alphabet.
pub fn validate_slot_key(key: &str) -> Result<(), StorageError> {
    let safe = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !safe {
        return Err(StorageError::InvalidSlotKey(key.to_string()));
    }
    Ok(())
}
