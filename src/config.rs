//! Configuration module for the hover translator.
//!
//! Handles loading configuration from environment variables and .env files.

use crate::storage::default_storage_path;
use crate::translator::TranslationBackend;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Where per-topic dictionaries come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionarySource {
    /// A directory holding `{topic}.json` files.
    Directory(PathBuf),
    /// An HTTP base URL serving `{topic}.json`.
    Url(String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the translation provider.
    pub translation_api_url: String,

    /// Which translation backend to use (mymemory or libretranslate).
    pub translation_backend: TranslationBackend,

    /// Base URL of the remote translation cache service.
    pub remote_cache_url: String,

    pub dictionary_source: DictionarySource,

    /// Topic selected at startup.
    pub topic: String,

    /// SQLite file backing the persisted word cache.
    pub storage_path: PathBuf,

    /// Timeout applied to every outgoing HTTP request.
    pub http_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `TRANSLATION_BACKEND`: "mymemory" (default) or "libretranslate"
    /// - `TRANSLATION_API_URL`: provider endpoint (default depends on backend)
    /// - `REMOTE_CACHE_URL`: remote cache base URL (default: http://127.0.0.1:8000)
    /// - `DICTIONARY_URL`: HTTP base for `{topic}.json`; takes precedence over `DICTIONARY_DIR`
    /// - `DICTIONARY_DIR`: directory of `{topic}.json` files (default: dictionaries)
    /// - `TOPIC`: initial topic (default: general)
    /// - `STORAGE_PATH`: word cache database (default: data/local_storage.db or local_storage.db)
    /// - `HTTP_TIMEOUT_SECS`: request timeout in seconds (default: 10)
    pub fn load() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let translation_backend: TranslationBackend = std::env::var("TRANSLATION_BACKEND")
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        let default_url = match translation_backend {
            TranslationBackend::MyMemory => "https://api.mymemory.translated.net/get",
            TranslationBackend::LibreTranslate => "http://localhost:5000/translate",
        };

        let translation_api_url =
            std::env::var("TRANSLATION_API_URL").unwrap_or_else(|_| default_url.to_string());

        let remote_cache_url = std::env::var("REMOTE_CACHE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

        let dictionary_source = match std::env::var("DICTIONARY_URL") {
            Ok(url) => DictionarySource::Url(url),
            Err(_) => DictionarySource::Directory(
                std::env::var("DICTIONARY_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("dictionaries")),
            ),
        };

        let topic = std::env::var("TOPIC").unwrap_or_else(|_| "general".to_string());

        let storage_path = std::env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_storage_path());

        let http_timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid positive number")?;

        Ok(Config {
            translation_api_url,
            translation_backend,
            remote_cache_url,
            dictionary_source,
            topic,
            storage_path,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Builds the HTTP client shared by all outgoing requests.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .context("Failed to create HTTP client")
    }
}
