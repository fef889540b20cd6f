//! Per-topic local dictionaries.
//!
//! Each topic has a `{topic}.json` file mapping English words to their
//! Spanish translation. Dictionary entries take precedence over every other
//! lookup tier.

use crate::word::{normalize_keys, Word};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of per-topic dictionary files.
#[async_trait]
pub trait DictionaryLoader: Send + Sync {
    /// Loads the raw word→translation mapping for `topic`.
    async fn load(&self, topic: &str) -> Result<HashMap<String, String>>;
}

/// Word→Translation mapping for the currently selected topic.
#[derive(Debug, Clone, Default)]
pub struct LocalDictionary {
    topic: String,
    entries: HashMap<Word, String>,
}

impl LocalDictionary {
    pub fn empty(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Builds a dictionary from raw file contents, normalizing every key.
    ///
    /// Collisions follow [`normalize_keys`]: the key already in normalized
    /// form wins.
    pub fn from_entries(topic: &str, raw: HashMap<String, String>) -> Self {
        let total = raw.len();
        let entries = normalize_keys(raw);
        if entries.len() < total {
            debug!(
                "Topic '{}': {} dictionary keys dropped or merged",
                topic,
                total - entries.len()
            );
        }
        Self {
            topic: topic.to_string(),
            entries,
        }
    }

    pub fn get(&self, word: &Word) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads `{topic}.json` from a local directory.
#[derive(Debug, Clone)]
pub struct FileDictionaryLoader {
    dir: PathBuf,
}

impl FileDictionaryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DictionaryLoader for FileDictionaryLoader {
    async fn load(&self, topic: &str) -> Result<HashMap<String, String>> {
        validate_topic(topic)?;
        let path = self.dir.join(format!("{}.json", topic));
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read dictionary file {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Dictionary file {:?} is not a JSON object of strings", path))
    }
}

/// Fetches `GET {base_url}/{topic}.json`.
#[derive(Debug, Clone)]
pub struct HttpDictionaryLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDictionaryLoader {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DictionaryLoader for HttpDictionaryLoader {
    async fn load(&self, topic: &str) -> Result<HashMap<String, String>> {
        validate_topic(topic)?;
        let url = format!("{}/{}.json", self.base_url, urlencoding::encode(topic));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send dictionary request")?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Dictionary request for '{}' failed: {}", topic, status);
            bail!("Dictionary server returned status: {}", status);
        }

        response
            .json()
            .await
            .context("Failed to parse dictionary response")
    }
}

/// Topics name files, so they are limited to ASCII letters, digits, `_` and `-`.
fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty()
        || !topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("Invalid topic name '{}'", topic);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_entries_normalizes_keys() {
        let dict =
            LocalDictionary::from_entries("animals", raw(&[("Cat", "gato"), ("dog!", "perro")]));
        assert_eq!(dict.get(&Word::normalize("cat").unwrap()), Some("gato"));
        assert_eq!(dict.get(&Word::normalize("Dog").unwrap()), Some("perro"));
        assert_eq!(dict.topic(), "animals");
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_from_entries_exact_key_wins_collision() {
        for _ in 0..50 {
            let dict = LocalDictionary::from_entries("t", raw(&[("Cat", "A"), ("cat", "B")]));
            assert_eq!(dict.get(&Word::normalize("cat").unwrap()), Some("B"));
            assert_eq!(dict.len(), 1);
        }
    }

    #[test]
    fn test_from_entries_drops_empty_keys() {
        let dict = LocalDictionary::from_entries("t", raw(&[("?!", "nada"), ("yes", "sí")]));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_empty_dictionary() {
        let dict = LocalDictionary::empty("general");
        assert!(dict.is_empty());
        assert!(dict.get(&Word::normalize("cat").unwrap()).is_none());
    }

    #[test]
    fn test_validate_topic() {
        assert!(validate_topic("daily_life").is_ok());
        assert!(validate_topic("travel-2").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("../secrets").is_err());
        assert!(validate_topic("a/b").is_err());
    }

    #[tokio::test]
    async fn test_file_loader_reads_topic_file() {
        let dir = std::env::temp_dir()
            .join(format!("hover_translator_dict_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("animals.json"),
            r#"{"cat": "gato", "dog": "perro"}"#,
        )
        .unwrap();

        let loader = FileDictionaryLoader::new(&dir);
        let entries = loader.load("animals").await.unwrap();
        assert_eq!(entries.get("cat").map(String::as_str), Some("gato"));
        assert_eq!(entries.len(), 2);

        assert!(loader.load("missing_topic").await.is_err());

        std::fs::write(dir.join("broken.json"), "[1, 2, 3]").unwrap();
        assert!(loader.load("broken").await.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
