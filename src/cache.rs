//! Session translation cache.
//!
//! Words resolved through the remote cache or the provider are kept in memory
//! for the rest of the session and mirrored to [`LocalStorage`] under a
//! single key, so they survive restarts. Entries never expire.

use crate::storage::LocalStorage;
use crate::word::{normalize_keys, Word};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Storage key holding the JSON-encoded Word→Translation map.
pub const STORAGE_KEY: &str = "wordCache";

/// In-memory Word→Translation map with write-through persistence.
#[derive(Debug)]
pub struct SessionCache {
    entries: Mutex<HashMap<Word, String>>,
    /// Durable mirror; `None` keeps the cache purely in memory.
    storage: Option<LocalStorage>,
}

impl SessionCache {
    /// Creates a cache backed by `storage`, seeded from whatever was persisted
    /// by a previous session.
    ///
    /// A missing or unreadable stored value starts the session empty.
    pub fn load(storage: LocalStorage) -> Self {
        let entries = match read_entries(&storage) {
            Ok(entries) => {
                info!("Loaded {} cached word translations", entries.len());
                entries
            }
            Err(e) => {
                warn!("Ignoring persisted word cache: {:#}", e);
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            storage: Some(storage),
        }
    }

    /// Creates an empty cache with no durable mirror.
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            storage: None,
        }
    }

    pub fn get(&self, word: &Word) -> Option<String> {
        self.entries
            .lock()
            .expect("session cache mutex poisoned")
            .get(word)
            .cloned()
    }

    /// Records a translation for `word` and rewrites the durable copy.
    ///
    /// Existing entries are never replaced; returns `false` if `word` was
    /// already cached. Persistence failures are logged, the in-memory entry
    /// stays.
    pub fn insert(&self, word: Word, translation: String) -> bool {
        let mut entries = self.entries.lock().expect("session cache mutex poisoned");
        if entries.contains_key(&word) {
            debug!("Word '{}' already cached, keeping existing entry", word);
            return false;
        }
        entries.insert(word, translation);

        if let Some(storage) = &self.storage {
            if let Err(e) = write_entries(storage, &entries) {
                warn!("Failed to persist word cache: {:#}", e);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("session cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stored keys may predate normalization or come from another writer, so they
/// are re-keyed by [`Word`] on load.
fn read_entries(storage: &LocalStorage) -> Result<HashMap<Word, String>> {
    let Some(json) = storage.get_item(STORAGE_KEY)? else {
        return Ok(HashMap::new());
    };
    let raw: HashMap<String, String> =
        serde_json::from_str(&json).context("Stored word cache is not valid JSON")?;
    Ok(normalize_keys(raw))
}

fn write_entries(storage: &LocalStorage, entries: &HashMap<Word, String>) -> Result<()> {
    let json = serde_json::to_string(entries).context("Failed to encode word cache")?;
    storage.set_item(STORAGE_KEY, &json)
}
