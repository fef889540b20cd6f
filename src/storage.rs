//! Durable key/value storage backed by SQLite.
//!
//! Plays the role a browser's `localStorage` plays for a web page: string
//! values under string keys, surviving restarts, overwritten whole on write.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS storage (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
";

/// SQLite-backed string store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Database connection (shared across clones).
    conn: Arc<Mutex<Connection>>,
}

impl LocalStorage {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let conn = Connection::open(path).context("Failed to open local storage database")?;

        // Readers don't block the writer.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA synchronous=NORMAL;")?;

        let storage = Self::with_connection(conn)?;
        info!("Local storage initialized at {:?}", path);
        Ok(storage)
    }

    /// Opens a throwaway in-memory store.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory storage")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize storage schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Returns the value stored under `key`, if any.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.query_row(
            "SELECT value FROM storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read storage key '{}'", key))
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%s', 'now')",
            params![key, value],
        )
        .with_context(|| format!("Failed to write storage key '{}'", key))?;
        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }
}

/// Default location of the storage database.
///
/// Uses `./data/local_storage.db` if the `data/` directory exists
/// (e.g., a mounted volume), otherwise falls back to the current directory.
pub fn default_storage_path() -> PathBuf {
    let data_dir = PathBuf::from("data");
    if data_dir.is_dir() {
        data_dir.join("local_storage.db")
    } else {
        PathBuf::from("local_storage.db")
    }
}
