//! Hover Translator
//!
//! A terminal practice widget for English learners: type a sentence, point
//! at a word, and its Spanish translation appears in a tooltip. Word lookups
//! go through a topic dictionary, a persisted session cache, a shared remote
//! cache and finally a machine translation service.

mod cache;
mod config;
mod dictionary;
mod remote;
mod resolver;
mod storage;
#[cfg(test)]
mod testing;
mod tooltip;
mod translator;
mod widget;
mod word;

use anyhow::Result;
use cache::SessionCache;
use colored::Colorize;
use config::{Config, DictionarySource};
use dictionary::{DictionaryLoader, FileDictionaryLoader, HttpDictionaryLoader};
use remote::RemoteCacheClient;
use resolver::WordResolver;
use std::sync::Arc;
use storage::LocalStorage;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use translator::Translator;
use widget::PracticeSession;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the widget on stdout.
    // RUST_LOG overrides the default level.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hover_translator=info")),
        )
        .init();

    let config = Config::load()?;

    widget::print_header("Hover Translator", "English → Spanish word practice");

    let client = config.http_client()?;

    let loader: Arc<dyn DictionaryLoader> = match &config.dictionary_source {
        DictionarySource::Directory(dir) => Arc::new(FileDictionaryLoader::new(dir)),
        DictionarySource::Url(url) => Arc::new(HttpDictionaryLoader::new(client.clone(), url)),
    };

    let storage = LocalStorage::open(&config.storage_path)?;
    let session = SessionCache::load(storage);

    let remote = Arc::new(RemoteCacheClient::new(
        client.clone(),
        &config.remote_cache_url,
    ));
    let provider = Arc::new(Translator::new(
        client,
        &config.translation_api_url,
        config.translation_backend.clone(),
    ));

    info!(
        "Using {:?} at {} (remote cache: {})",
        config.translation_backend, config.translation_api_url, config.remote_cache_url
    );

    let resolver = Arc::new(WordResolver::new(loader, session, remote, provider));
    resolver.change_topic(&config.topic).await;

    println!(
        "{} {}\n",
        "Cached words:".bright_yellow(),
        resolver.session().len().to_string().bright_green().bold()
    );

    PracticeSession::new(resolver).run().await
}
