//! SQLite slot backend for Billbook.
//!
//! Every slot is one row of the `slots` table. `modify_slot` runs inside an
//! immediate transaction, so concurrent processes sharing the database file
//! serialize their read-modify-write cycles.

use std::sync::{Mutex, MutexGuard};

use billbook_core::storage::validate_slot_key;
use billbook_core::{SlotBackend, SlotUpdate, StorageError};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub struct SqliteSlots {
    conn: Mutex<Connection>,
}

fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::Other(e.to_string())
}

fn now_str() -> Result<String, StorageError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StorageError::Other(e.to_string()))
}

impl SqliteSlots {
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(sql_err)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
            .map_err(sql_err)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        tracing::debug!(path, "SQLite slot store opened");
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(sql_err)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire connection lock: {}", e)))
    }
}

fn select_value(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    conn.query_row("SELECT value FROM slots WHERE key = ?1", params![key], |r| r.get(0))
        .optional()
        .map_err(sql_err)
}

fn upsert_value(conn: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now_str()?],
    )
    .map_err(sql_err)?;
    Ok(())
}

impl SlotBackend for SqliteSlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_slot_key(key)?;
        let conn = self.lock()?;
        select_value(&conn, key)
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        let conn = self.lock()?;
        upsert_value(&conn, key, value)
    }

    fn remove_slot(&self, key: &str) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        let conn = self.lock()?;
        conn.execute("DELETE FROM slots WHERE key = ?1", params![key])
            .map_err(sql_err)?;
        Ok(())
    }

    fn list_slots(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key FROM slots ORDER BY key")
            .map_err(sql_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sql_err)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(sql_err)?);
        }
        Ok(result)
    }

    fn modify_slot(&self, key: &str, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        validate_slot_key(key)?;
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sql_err)?;

        let current = select_value(&tx, key)?;
        // Returning without commit drops the transaction, which rolls it back.
        if let Some(next) = apply(current.as_deref())? {
            upsert_value(&tx, key, &next)?;
            tx.commit().map_err(sql_err)?;
            tracing::debug!(slot = key, bytes = next.len(), "SQLite slot committed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_basic_operations() {
        let slots = SqliteSlots::new(":memory:").unwrap();

        assert_eq!(slots.read_slot("saved_bills").unwrap(), None);
        slots.write_slot("saved_bills", "[]").unwrap();
        slots.write_slot("saved_bills", "[{\"id\":\"1\"}]").unwrap();
        slots.write_slot("saved_bills02", "[]").unwrap();

        assert_eq!(
            slots.read_slot("saved_bills").unwrap().as_deref(),
            Some("[{\"id\":\"1\"}]")
        );
        assert_eq!(slots.list_slots().unwrap(), vec!["saved_bills", "saved_bills02"]);

        slots.remove_slot("saved_bills").unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap(), None);
    }

    #[test]
    fn test_sqlite_modify_rollback() {
        let slots = SqliteSlots::new(":memory:").unwrap();
        slots.write_slot("saved_bills", "[]").unwrap();

        let result = slots.modify_slot("saved_bills", &mut |current| {
            assert_eq!(current, Some("[]"));
            Err(StorageError::NotFound("missing".into()))
        });
        assert!(result.is_err());
        assert_eq!(slots.read_slot("saved_bills").unwrap().as_deref(), Some("[]"));

        slots
            .modify_slot("saved_bills", &mut |_| Ok(Some("[1]".into())))
            .unwrap();
        assert_eq!(slots.read_slot("saved_bills").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_sqlite_rejects_unsafe_keys() {
        let slots = SqliteSlots::new(":memory:").unwrap();
        for key in ["", "../bills", "saved bills"] {
            assert!(matches!(slots.read_slot(key), Err(StorageError::InvalidSlotKey(_))));
            assert!(matches!(slots.write_slot(key, "[]"), Err(StorageError::InvalidSlotKey(_))));
            assert!(matches!(slots.remove_slot(key), Err(StorageError::InvalidSlotKey(_))));
        }
        assert!(slots.list_slots().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_persists_across_connections() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("billbook.sqlite3");
        let path = path.to_str().unwrap();

        {
            let slots = SqliteSlots::new(path).unwrap();
            slots.write_slot("saved_bills02", "[\"kept\"]").unwrap();
        }

        let reopened = SqliteSlots::new(path).unwrap();
        assert_eq!(
            reopened.read_slot("saved_bills02").unwrap().as_deref(),
            Some("[\"kept\"]")
        );
    }
}
