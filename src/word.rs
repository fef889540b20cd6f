//! Word normalization.
//!
//! Display tokens come straight out of the sentence ("Cat,", "Hello!") while
//! every lookup tier is keyed by the normalized form ("cat", "hello").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Punctuation stripped from the edges of a display token.
const EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?'];

/// A normalized lookup key: lower-cased, with surrounding whitespace and
/// `.,!?` removed from both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(String);

impl Word {
    /// Normalizes a raw display token.
    ///
    /// Returns `None` when nothing is left after stripping, e.g. for `"?!"`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let core = raw.trim().trim_matches(EDGE_PUNCTUATION).trim();
        if core.is_empty() {
            return None;
        }
        Some(Self(core.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Re-keys a raw token→translation map by [`Word`].
///
/// Keys that normalize to nothing are dropped. When several keys collide, a
/// key already in normalized form wins over its variants ("cat" over "Cat");
/// among variants the lexicographically smallest key wins.
pub fn normalize_keys(raw: HashMap<String, String>) -> HashMap<Word, String> {
    let mut pairs: Vec<_> = raw.into_iter().collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut entries = HashMap::with_capacity(pairs.len());
    for (key, translation) in pairs {
        let Some(word) = Word::normalize(&key) else {
            continue;
        };
        if key == word.as_str() {
            entries.insert(word, translation);
        } else {
            entries.entry(word).or_insert(translation);
        }
    }
    entries
}
