//! Local persistent key-value storage for the clients.
//!
//! Each client owns one store. Values are opaque strings; the few structured
//! records the clients keep (profile, active ride) are serialized as JSON by
//! [`read_json`] / [`write_json`]. Callers talk to the [`KeyValueStore`]
//! trait so tests can swap the `SQLite` file for a [`MemoryStore`].

pub mod memory;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStore;

/// Keys the clients read and write.
pub mod keys {
    /// `"true"` while a user is signed in.
    pub const LOGGED_IN: &str = "isLoggedIn";
    /// JSON-serialized [`UserProfile`](crate::session::UserProfile).
    pub const USER: &str = "user";
    /// JSON-serialized active ride stage record (driver only).
    pub const ACTIVE_RIDE: &str = "activeRide";
}

/// Asynchronous key-value storage, in the shape of a mobile app's local
/// storage: string keys, string values, no transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value under `key`, or `None` if there is none.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON record.
///
/// # Errors
///
/// Returns the store's error, or [`Error::CorruptValue`] if the stored text
/// is not a valid `T`.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = store.get_item(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| Error::CorruptValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Serialize and write a JSON record.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn write_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set_item(key, &raw).await
}

/// `SQLite`-backed store.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a store at the given path.
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

        debug!("Opening store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
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
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("store connection lock poisoned"))
    }

    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            r"
            INSERT INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Delete `key`.
    ///
    /// Returns `true` if a value was deleted, `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM items WHERE key = ?1", [key])?;
        debug!("Removed {} ({} rows)", key, affected);
        Ok(affected > 0)
    }

    /// List all keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM items ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let item_count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            item_count,
            db_size_bytes,
        })
    }
}

#[async_trait]
impl KeyValueStore for Storage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value)
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.remove(key).map(|_| ())
    }
}

/// Statistics about a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys held.
    pub item_count: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
