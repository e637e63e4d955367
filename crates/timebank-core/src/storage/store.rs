//! Shared key-value store visible to every execution context.
//!
//! The foreground app, the background activity monitor and the
//! block-screen handler all open their own handle to the same SQLite
//! file and exchange whole JSON documents through it. Writers rewrite a
//! record wholesale; there are no partial-document updates.
//!
//! Each row carries a version counter so a read-modify-write cycle can
//! detect a concurrent writer via [`SharedStore::compare_and_swap`].
//! Plain [`SharedStore::put_json`] bumps the version unconditionally --
//! two contexts writing the same key concurrently will lose one update,
//! which is an accepted limitation of the design, not something the
//! store papers over.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data_dir;
use crate::error::StoreError;

/// Handle to the shared store.
///
/// Every execution context constructs its own handle; the rows are the
/// shared state, not this struct.
pub struct SharedStore {
    conn: Mutex<Connection>,
}

impl SharedStore {
    /// Open the store at `~/.config/timebank/timebank.db`.
    ///
    /// Creates the file and schema if they don't exist.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map(|d| d.join("timebank.db"))
            .unwrap_or_else(|_| PathBuf::from("timebank.db"));
        Self::open_at(&path)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.lock().unwrap().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key     TEXT PRIMARY KEY,
                value   TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1
            );",
        )?;
        Ok(())
    }

    /// Raw JSON text of a record, if present.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .lock()
            .unwrap()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Decode a record. A missing record and an undecodable record both
    /// read back as `None` -- corrupted state is treated as absence of
    /// data, never surfaced to callers as an error.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key, %err, "dropping undecodable record");
                Ok(None)
            }
        }
    }

    /// Write a record, bumping its version. Last writer wins.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|err| StoreError::Decode {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        self.conn.lock().unwrap().execute(
            "INSERT INTO kv (key, value, version) VALUES (?1, ?2, 1)
             ON CONFLICT(key) DO UPDATE SET value = ?2, version = kv.version + 1",
            params![key, raw],
        )?;
        Ok(())
    }

    /// Decode a record along with its version. Version 0 means absent.
    pub fn versioned_get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<(Option<T>, i64), StoreError> {
        let row = self
            .conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT value, version FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((raw, version)) = row else {
            return Ok((None, 0));
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok((Some(value), version)),
            Err(err) => {
                tracing::warn!(key, %err, "dropping undecodable record");
                Ok((None, version))
            }
        }
    }

    /// Write a record only if its version still matches `expected`
    /// (0 for a record the caller read as absent). Returns the new
    /// version on success, `StoreError::Conflict` if another context
    /// wrote in between.
    pub fn compare_and_swap<T: Serialize>(
        &self,
        key: &str,
        expected: i64,
        value: &T,
    ) -> Result<i64, StoreError> {
        let raw = serde_json::to_string(value).map_err(|err| StoreError::Decode {
            key: key.to_string(),
            message: err.to_string(),
        })?;
        let changed = if expected == 0 {
            self.conn.lock().unwrap().execute(
                "INSERT INTO kv (key, value, version) VALUES (?1, ?2, 1)
                 ON CONFLICT(key) DO NOTHING",
                params![key, raw],
            )?
        } else {
            self.conn.lock().unwrap().execute(
                "UPDATE kv SET value = ?2, version = version + 1
                 WHERE key = ?1 AND version = ?3",
                params![key, raw, expected],
            )?
        };
        if changed == 0 {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected,
            });
        }
        Ok(expected + 1)
    }

    /// Remove a record. No-op if absent.
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .lock()
            .unwrap()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Numeric record, 0.0 when absent or undecodable.
    pub fn get_f64(&self, key: &str) -> f64 {
        self.get_json::<f64>(key).ok().flatten().unwrap_or(0.0)
    }

    /// Boolean record, false when absent or undecodable.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_json::<bool>(key).ok().flatten().unwrap_or(false)
    }
}
