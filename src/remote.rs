//! Client for the shared remote translation cache.
//!
//! The backend keeps translations other sessions already paid for. Lookups
//! are optional: any failure is reported as an error the resolver treats as a
//! miss.

use crate::word::Word;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backend-held Word→Translation cache.
#[async_trait]
pub trait RemoteCache: Send + Sync {
    /// Looks up a cached translation. `Ok(None)` is a plain miss.
    async fn lookup(&self, word: &Word) -> Result<Option<String>>;

    /// Offers a newly learned translation for reuse by later lookups.
    async fn submit(&self, word: &Word, translation: &str) -> Result<()>;
}

/// Response body of `GET /get_translation/{word}`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    translation: Option<String>,
}

/// Request body of `POST /cache_translation`.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    word: &'a str,
    translation: &'a str,
}

/// HTTP client for the translation cache API.
#[derive(Debug, Clone)]
pub struct RemoteCacheClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteCacheClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteCache for RemoteCacheClient {
    async fn lookup(&self, word: &Word) -> Result<Option<String>> {
        let url = format!(
            "{}/get_translation/{}",
            self.base_url,
            urlencoding::encode(word.as_str())
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to remote cache")?;

        // A 404 is just a miss.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("Remote cache returned status: {}", response.status());
        }

        let body: LookupResponse = response
            .json()
            .await
            .context("Failed to parse remote cache response")?;

        let translation = body.translation.filter(|t| !t.trim().is_empty());
        debug!("Remote cache lookup '{}': {:?}", word, translation);
        Ok(translation)
    }

    async fn submit(&self, word: &Word, translation: &str) -> Result<()> {
        let url = format!("{}/cache_translation", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest {
                word: word.as_str(),
                translation,
            })
            .send()
            .await
            .context("Failed to send translation to remote cache")?;

        if !response.status().is_success() {
            bail!("Remote cache rejected submission: {}", response.status());
        }
        Ok(())
    }
}
