//! JSON-file slot backend: one `<key>.json` file per slot in a directory.
//!
//! Writes land in a temporary file that is renamed over the slot file, so a
//! reader sees either the old array or the new one. Read-modify-write across
//! processes is not coordinated; the last writer wins.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use billbook_core::storage::validate_slot_key;
use billbook_core::{SlotBackend, StorageError};
use uuid::Uuid;

const EXTENSION: &str = "json";

pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "File slot store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_slot_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl SlotBackend for FileSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(slot = key, bytes = value.len(), "Slot file written");
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_slots(&self) -> Result<Vec<String>, StorageError> {
        let mut result = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_slot_key(stem).is_ok() {
                    result.push(stem.to_string());
                }
            }
        }
        result.sort();
        Ok(result)
    }
}
