//! Word translation resolution.
//!
//! A hovered token is resolved through four tiers in strict order, stopping
//! at the first hit:
//!
//! 1. the local dictionary of the current topic,
//! 2. the session cache,
//! 3. the remote cache service,
//! 4. the translation provider.
//!
//! Results from tiers 3 and 4 are written to the session cache; provider
//! results are also offered back to the remote cache in the background.
//! Resolution never fails: every error ends as a [`Translation`] sentinel.

use crate::cache::SessionCache;
use crate::dictionary::{DictionaryLoader, LocalDictionary};
use crate::remote::RemoteCache;
use crate::translator::TranslationProvider;
use crate::word::Word;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Shown when the provider answered without a usable translation.
pub const NO_TRANSLATION: &str = "Sin traducción";

/// Shown when the provider could not be reached or its reply was unreadable.
pub const TRANSLATION_ERROR: &str = "Error";

/// Outcome of resolving a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// A translation from any tier.
    Text(String),
    /// The token has no translation (empty after normalization, or the
    /// provider returned nothing usable).
    Missing,
    /// The provider failed.
    Failed,
}

impl Translation {
    /// Text to display for this outcome.
    pub fn as_str(&self) -> &str {
        match self {
            Translation::Text(text) => text,
            Translation::Missing => NO_TRANSLATION,
            Translation::Failed => TRANSLATION_ERROR,
        }
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolver context: the active dictionary, the session cache and handles to
/// the remote collaborators.
pub struct WordResolver {
    dictionary: RwLock<LocalDictionary>,

    /// Bumped on every topic change; a load only installs its dictionary if
    /// no newer change started while it was in flight.
    topic_generation: AtomicU64,

    loader: Arc<dyn DictionaryLoader>,
    session: SessionCache,
    remote: Arc<dyn RemoteCache>,
    provider: Arc<dyn TranslationProvider>,
}

impl WordResolver {
    /// Creates a resolver with an empty dictionary. Call
    /// [`change_topic`](Self::change_topic) to load the first topic.
    pub fn new(
        loader: Arc<dyn DictionaryLoader>,
        session: SessionCache,
        remote: Arc<dyn RemoteCache>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self {
            dictionary: RwLock::new(LocalDictionary::default()),
            topic_generation: AtomicU64::new(0),
            loader,
            session,
            remote,
            provider,
        }
    }

    /// Loads the dictionary for `topic` and makes it current.
    ///
    /// A failed load installs an empty dictionary for the topic. Returns
    /// `false` if another topic change started while this one was loading,
    /// in which case the newer change wins and this result is dropped.
    pub async fn change_topic(&self, topic: &str) -> bool {
        let generation = self.topic_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let dictionary = match self.loader.load(topic).await {
            Ok(raw) => LocalDictionary::from_entries(topic, raw),
            Err(e) => {
                warn!("Failed to load dictionary for topic '{}': {:#}", topic, e);
                LocalDictionary::empty(topic)
            }
        };

        if self.topic_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale dictionary for topic '{}'", topic);
            return false;
        }

        info!(
            "Dictionary for topic '{}' loaded ({} words)",
            topic,
            dictionary.len()
        );
        *self.dictionary.write().expect("dictionary lock poisoned") = dictionary;
        true
    }

    /// Topic of the dictionary currently in use.
    pub fn topic(&self) -> String {
        self.dictionary
            .read()
            .expect("dictionary lock poisoned")
            .topic()
            .to_string()
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    /// Resolves a raw display token to its translation.
    pub async fn resolve(&self, raw_token: &str) -> Translation {
        let Some(word) = Word::normalize(raw_token) else {
            debug!("Token '{}' has no word to translate", raw_token);
            return Translation::Missing;
        };

        if let Some(text) = self.lookup_dictionary(&word) {
            debug!("Dictionary hit for '{}'", word);
            return Translation::Text(text);
        }

        if let Some(text) = self.session.get(&word) {
            debug!("Session cache hit for '{}'", word);
            return Translation::Text(text);
        }

        match self.remote.lookup(&word).await {
            Ok(Some(text)) => {
                debug!("Remote cache hit for '{}'", word);
                let (text, _) = self.remember(word, text);
                return Translation::Text(text);
            }
            Ok(None) => debug!("Remote cache miss for '{}'", word),
            Err(e) => warn!("Remote cache lookup for '{}' failed: {:#}", word, e),
        }

        match self.provider.translate(word.as_str()).await {
            Ok(Some(text)) => {
                let (text, inserted) = self.remember(word.clone(), text);
                if inserted {
                    self.submit_in_background(word, text.clone());
                }
                Translation::Text(text)
            }
            Ok(None) => {
                debug!("Provider has no translation for '{}'", word);
                Translation::Missing
            }
            Err(e) => {
                warn!("Translation of '{}' failed: {:#}", word, e);
                Translation::Failed
            }
        }
    }

    fn lookup_dictionary(&self, word: &Word) -> Option<String> {
        self.dictionary
            .read()
            .expect("dictionary lock poisoned")
            .get(word)
            .map(str::to_string)
    }

    /// Caches `text` for `word` and returns the cached value.
    ///
    /// If an overlapping resolution cached the word first, its entry is kept
    /// and returned with `false`.
    fn remember(&self, word: Word, text: String) -> (String, bool) {
        if self.session.insert(word.clone(), text.clone()) {
            return (text, true);
        }
        let cached = self.session.get(&word).unwrap_or(text);
        (cached, false)
    }

    /// Offers a provider result to the remote cache on a detached task.
    ///
    /// Nothing waits for the task and its outcome only reaches the debug log.
    fn submit_in_background(&self, word: Word, text: String) {
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            match remote.submit(&word, &text).await {
                Ok(()) => debug!("Submitted '{}' to remote cache", word),
                Err(e) => debug!("Remote cache submission for '{}' failed: {:#}", word, e),
            }
        });
    }
}
