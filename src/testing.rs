//! Test doubles for the resolver's collaborators and the tooltip overlay, plus
//! a throwaway HTTP server for exercising the real clients.

use crate::dictionary::DictionaryLoader;
use crate::remote::RemoteCache;
use crate::tooltip::{Overlay, Position, TooltipId};
use crate::translator::TranslationProvider;
use crate::word::Word;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Semaphore};

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// HTTP client for talking to [`serve`]d apps, ignoring any proxy settings.
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

/// In-memory dictionary files, optionally held back by a semaphore.
#[derive(Default)]
pub struct MockLoader {
    topics: HashMap<String, HashMap<String, String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topic(mut self, topic: &str, pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.topics.insert(topic.to_string(), entries);
        self
    }

    /// Makes loads of `topic` wait for a permit on the returned semaphore.
    pub fn gate(&self, topic: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(topic.to_string(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl DictionaryLoader for MockLoader {
    async fn load(&self, topic: &str) -> Result<HashMap<String, String>> {
        let gate = self.gates.lock().unwrap().get(topic).cloned();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }
        self.topics
            .get(topic)
            .cloned()
            .ok_or_else(|| anyhow!("no dictionary for topic '{}'", topic))
    }
}

/// Remote cache double that counts lookups and reports submissions on a channel.
pub struct MockRemote {
    entries: HashMap<String, String>,
    reachable: bool,
    lookups: AtomicUsize,
    submissions: mpsc::UnboundedSender<(String, String)>,
}

impl MockRemote {
    /// An empty, reachable remote cache.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, String)>) {
        Self::build(&[], true)
    }

    pub fn with_entries(
        pairs: &[(&str, &str)],
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(String, String)>) {
        Self::build(pairs, true)
    }

    /// A remote cache whose every call fails after being recorded.
    pub fn unreachable() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, String)>) {
        Self::build(&[], false)
    }

    fn build(
        pairs: &[(&str, &str)],
        reachable: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let remote = Self {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            reachable,
            lookups: AtomicUsize::new(0),
            submissions: tx,
        };
        (Arc::new(remote), rx)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCache for MockRemote {
    async fn lookup(&self, word: &Word) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            bail!("connection refused");
        }
        Ok(self.entries.get(word.as_str()).cloned())
    }

    async fn submit(&self, word: &Word, translation: &str) -> Result<()> {
        let _ = self
            .submissions
            .send((word.as_str().to_string(), translation.to_string()));
        if !self.reachable {
            bail!("connection refused");
        }
        Ok(())
    }
}

enum ProviderReply {
    Text(String),
    Missing,
}

/// Provider double with canned replies; unknown words fail.
#[derive(Default)]
pub struct MockProvider {
    replies: HashMap<String, ProviderReply>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_text(self: Arc<Self>, word: &str, text: &str) -> Arc<Self> {
        Self::with_reply(self, word, ProviderReply::Text(text.to_string()))
    }

    pub fn with_missing(self: Arc<Self>, word: &str) -> Arc<Self> {
        Self::with_reply(self, word, ProviderReply::Missing)
    }

    /// Makes every call wait for a permit on `gate`.
    pub fn gated(self: Arc<Self>, gate: Arc<Semaphore>) -> Arc<Self> {
        let mut provider = Self::unwrap(self);
        provider.gate = Some(gate);
        Arc::new(provider)
    }

    fn with_reply(self: Arc<Self>, word: &str, reply: ProviderReply) -> Arc<Self> {
        let mut provider = Self::unwrap(self);
        provider.replies.insert(word.to_string(), reply);
        Arc::new(provider)
    }

    fn unwrap(this: Arc<Self>) -> Self {
        Arc::try_unwrap(this)
            .ok()
            .expect("configure MockProvider before sharing it")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(&self, text: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        match self.replies.get(text) {
            Some(ProviderReply::Text(t)) => Ok(Some(t.clone())),
            Some(ProviderReply::Missing) => Ok(None),
            None => bail!("provider unreachable"),
        }
    }
}

/// A node currently attached to the [`RecordingOverlay`].
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayNode {
    pub id: TooltipId,
    pub position: Position,
    pub text: String,
}

#[derive(Default)]
struct OverlayLog {
    nodes: Vec<OverlayNode>,
    updates: Vec<TooltipId>,
    removals: Vec<TooltipId>,
}

/// Overlay that keeps its nodes in memory; clones share state.
#[derive(Clone, Default)]
pub struct RecordingOverlay {
    log: Arc<Mutex<OverlayLog>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> Vec<OverlayNode> {
        self.log.lock().unwrap().nodes.clone()
    }

    /// Ids that received a content update, in order.
    pub fn updates(&self) -> Vec<TooltipId> {
        self.log.lock().unwrap().updates.clone()
    }

    pub fn removals(&self) -> Vec<TooltipId> {
        self.log.lock().unwrap().removals.clone()
    }
}

impl Overlay for RecordingOverlay {
    fn show(&mut self, id: TooltipId, position: Position, text: &str) {
        self.log.lock().unwrap().nodes.push(OverlayNode {
            id,
            position,
            text: text.to_string(),
        });
    }

    fn update(&mut self, id: TooltipId, text: &str) {
        let mut log = self.log.lock().unwrap();
        log.updates.push(id);
        if let Some(node) = log.nodes.iter_mut().find(|n| n.id == id) {
            node.text = text.to_string();
        }
    }

    fn remove(&mut self, id: TooltipId) {
        let mut log = self.log.lock().unwrap();
        log.removals.push(id);
        log.nodes.retain(|n| n.id != id);
    }
}
