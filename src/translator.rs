//! Machine translation of single words via MyMemory or LibreTranslate.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

/// Language the learner reads.
pub const SOURCE_LANG: &str = "en";

/// Language translations are shown in.
pub const TARGET_LANG: &str = "es";

/// Third-party translation service.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translates `text` from [`SOURCE_LANG`] to [`TARGET_LANG`].
    ///
    /// `Ok(None)` means the service answered but the payload held no usable
    /// translation. Transport and decoding failures are errors.
    async fn translate(&self, text: &str) -> Result<Option<String>>;
}

/// Translation backend to use.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TranslationBackend {
    /// MyMemory public API (`GET ?q=..&langpair=en|es`).
    #[default]
    MyMemory,
    /// Self-hosted LibreTranslate (`POST` JSON).
    LibreTranslate,
}

impl FromStr for TranslationBackend {
    type Err = std::convert::Infallible;

    /// Accepts "libretranslate" or "libre" for LibreTranslate, defaults to MyMemory.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "libretranslate" | "libre" => TranslationBackend::LibreTranslate,
            _ => TranslationBackend::MyMemory,
        })
    }
}

/// Request body for LibreTranslate API.
#[derive(Debug, Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

/// Response from LibreTranslate API.
#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText", default)]
    translated_text: Option<String>,
}

/// HTTP translation client.
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,

    /// Endpoint of the selected backend.
    api_url: String,

    backend: TranslationBackend,
}

impl Translator {
    pub fn new(client: reqwest::Client, api_url: &str, backend: TranslationBackend) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            backend,
        }
    }

    /// Queries MyMemory.
    ///
    /// The body is parsed loosely: anything other than a non-empty
    /// `responseData.translatedText` string counts as no translation.
    async fn translate_with_mymemory(&self, text: &str) -> Result<Option<String>> {
        let url = format!(
            "{}?q={}&langpair={}",
            self.api_url,
            urlencoding::encode(text),
            urlencoding::encode(&format!("{}|{}", SOURCE_LANG, TARGET_LANG))
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to translation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Translation API error: {} - {}", status, body);
            bail!("Translation API returned status: {}", status);
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse translation API response")?;

        let translation = extract_mymemory_translation(&json);
        debug!("MyMemory: '{}' -> {:?}", text, translation);
        Ok(translation)
    }

    async fn translate_with_libretranslate(&self, text: &str) -> Result<Option<String>> {
        let request = LibreTranslateRequest {
            q: text,
            source: SOURCE_LANG,
            target: TARGET_LANG,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LibreTranslate API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("LibreTranslate API error: {} - {}", status, body);
            bail!("LibreTranslate API returned status: {}", status);
        }

        let result: LibreTranslateResponse = response
            .json()
            .await
            .context("Failed to parse LibreTranslate API response")?;

        Ok(result.translated_text.filter(|t| !t.trim().is_empty()))
    }
}

#[async_trait]
impl TranslationProvider for Translator {
    async fn translate(&self, text: &str) -> Result<Option<String>> {
        match self.backend {
            TranslationBackend::MyMemory => self.translate_with_mymemory(text).await,
            TranslationBackend::LibreTranslate => self.translate_with_libretranslate(text).await,
        }
    }
}

/// Pulls `responseData.translatedText` out of a MyMemory reply.
///
/// MyMemory reports quota and language-pair problems with HTTP 200 and a
/// non-200 `responseStatus`, echoing the error message in `translatedText`;
/// those replies carry no translation.
fn extract_mymemory_translation(json: &Value) -> Option<String> {
    if let Some(status) = json.get("responseStatus").and_then(status_code) {
        if status != 200 {
            warn!("MyMemory responseStatus {}", status);
            return None;
        }
    }

    json.get("responseData")
        .and_then(|data| data.get("translatedText"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `responseStatus` arrives as a number or as a numeric string.
fn status_code(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
