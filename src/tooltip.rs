//! Hover tooltip lifecycle.
//!
//! At most one tooltip exists at a time. Its lifecycle is an explicit state
//! machine:
//!
//! ```text
//!            hover-start              resolution-complete
//! Absent ───────────────▶ Loading(id) ───────────────────▶ Showing(id)
//!                           │    ▲                            │
//!                 hover-end │    │ hover-start (replaces id)  │ hover-end
//!                           ▼    │                            ▼
//!                         Dismissed(id) ◀─────────────────────┘
//! ```
//!
//! Resolutions complete on their own task and may arrive after the tooltip
//! they were started for has been dismissed or replaced; such results are
//! dropped by the `Loading(id)` guard.

use crate::resolver::{Translation, WordResolver};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Content shown while a word is being resolved.
pub const LOADING_PLACEHOLDER: &str = "Traduciendo...";

/// Vertical distance between the tooltip's top edge and the word's top edge.
pub const TOOLTIP_OFFSET: f64 = 30.0;

/// Identifies one tooltip instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TooltipId(pub(crate) u64);

/// On-screen bounding box of a word element, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Current scroll offset of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scroll {
    pub x: f64,
    pub y: f64,
}

/// Document coordinates of a tooltip's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

impl Position {
    /// Just above `rect`, left-aligned with it.
    pub fn above(rect: &ElementRect, scroll: Scroll) -> Self {
        Self {
            left: rect.left + scroll.x,
            top: rect.top - TOOLTIP_OFFSET + scroll.y,
        }
    }
}

/// A hoverable word in the sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct WordElement {
    /// Display text, punctuation included.
    pub text: String,
    pub rect: ElementRect,
}

/// The surface tooltips are attached to.
pub trait Overlay: Send + 'static {
    fn show(&mut self, id: TooltipId, position: Position, text: &str);
    fn update(&mut self, id: TooltipId, text: &str);
    fn remove(&mut self, id: TooltipId);
}

/// Lifecycle state of the singleton tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipState {
    /// No tooltip was ever shown.
    Absent,
    /// Attached, showing [`LOADING_PLACEHOLDER`].
    Loading(TooltipId),
    /// Attached, showing the resolved text.
    Showing(TooltipId),
    /// Removed; late results for this id are ignored.
    Dismissed(TooltipId),
}

impl TooltipState {
    /// Id of the tooltip currently attached, if any.
    fn attached(self) -> Option<TooltipId> {
        match self {
            TooltipState::Loading(id) | TooltipState::Showing(id) => Some(id),
            TooltipState::Absent | TooltipState::Dismissed(_) => None,
        }
    }
}

struct Inner<O> {
    overlay: O,
    state: TooltipState,
    next_id: u64,
}

/// Creates, updates and removes the hover tooltip.
pub struct TooltipManager<O> {
    inner: Arc<Mutex<Inner<O>>>,
    resolver: Arc<WordResolver>,
}

impl<O> Clone for TooltipManager<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<O: Overlay> TooltipManager<O> {
    pub fn new(overlay: O, resolver: Arc<WordResolver>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                overlay,
                state: TooltipState::Absent,
                next_id: 0,
            })),
            resolver,
        }
    }

    pub fn state(&self) -> TooltipState {
        self.inner.lock().expect("tooltip mutex poisoned").state
    }

    /// Handles hover-start over `element`.
    ///
    /// Removes any tooltip still attached, attaches a new one with the
    /// loading placeholder, and starts resolving the element's text. The
    /// returned [`Hover`] is the one-shot hover-end handler.
    pub fn hover_start(&self, element: &WordElement, scroll: Scroll) -> Hover<O> {
        let id = {
            let mut inner = self.inner.lock().expect("tooltip mutex poisoned");
            if let Some(stale) = inner.state.attached() {
                debug!("Replacing tooltip {:?}", stale);
                inner.overlay.remove(stale);
            }

            inner.next_id += 1;
            let id = TooltipId(inner.next_id);
            let position = Position::above(&element.rect, scroll);
            inner.overlay.show(id, position, LOADING_PLACEHOLDER);
            inner.state = TooltipState::Loading(id);
            id
        };

        let manager = self.clone();
        let text = element.text.clone();
        let resolution = tokio::spawn(async move {
            let translation = manager.resolver.resolve(&text).await;
            manager.resolution_complete(id, &translation);
        });

        Hover {
            id,
            manager: self.clone(),
            resolution: Some(resolution),
        }
    }

    /// Removes whatever tooltip is attached, e.g. because the sentence
    /// changed underneath it.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("tooltip mutex poisoned");
        if let Some(id) = inner.state.attached() {
            inner.overlay.remove(id);
            inner.state = TooltipState::Dismissed(id);
        }
    }

    fn resolution_complete(&self, id: TooltipId, translation: &Translation) {
        let mut inner = self.inner.lock().expect("tooltip mutex poisoned");
        if inner.state != TooltipState::Loading(id) {
            debug!("Dropping result for tooltip {:?} in state {:?}", id, inner.state);
            return;
        }
        inner.overlay.update(id, translation.as_str());
        inner.state = TooltipState::Showing(id);
    }

    fn hover_end(&self, id: TooltipId) {
        let mut inner = self.inner.lock().expect("tooltip mutex poisoned");
        if inner.state.attached() == Some(id) {
            inner.overlay.remove(id);
            inner.state = TooltipState::Dismissed(id);
        }
    }
}

/// An active hover over one word.
///
/// Ending the hover (explicitly or by dropping) removes the tooltip it
/// created, unless a newer hover already replaced it. Because the handle is
/// consumed, hover-end runs at most once per hover.
pub struct Hover<O: Overlay> {
    id: TooltipId,
    manager: TooltipManager<O>,
    resolution: Option<JoinHandle<()>>,
}

impl<O: Overlay> Hover<O> {
    pub fn id(&self) -> TooltipId {
        self.id
    }

    /// Waits until the word has been resolved and the tooltip updated (or
    /// the result dropped).
    pub async fn resolved(&mut self) {
        if let Some(task) = self.resolution.take() {
            if let Err(e) = task.await {
                warn!("Tooltip resolution task failed: {}", e);
            }
        }
    }

    /// Handles hover-end.
    ///
    /// The resolution keeps running; its handle is returned for callers that
    /// want to wait for it.
    pub fn end(mut self) -> Option<JoinHandle<()>> {
        self.resolution.take()
    }
}

impl<O: Overlay> Drop for Hover<O> {
    fn drop(&mut self) {
        self.manager.hover_end(self.id);
    }
}
