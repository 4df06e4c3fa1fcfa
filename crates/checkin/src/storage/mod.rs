//! Storage layer for checkin.
//!
//! This module provides a `SQLite`-backed key-value item store. It keeps the
//! contract of a browser's local storage: string keys, whole string values,
//! each write replacing the previous value atomically.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Persistence backend holding whole string values under string keys.
pub trait ItemStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is rejected or cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite` item store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Largest accepted value in bytes.
    quota: Option<usize>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn,
            quota: None,
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            quota: None,
        })
    }

    /// Limit the size of stored values. `None` removes the limit.
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the value stored under `key`.
    ///
    /// Returns `true` if a value was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM items WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    /// Count stored items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Check whether no items are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ItemStore for Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(Error::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }

        self.conn.execute(
            r"
            INSERT INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }
}
