//! Hover/active highlighting over rendered text content
//!
//! A single delegated enter/leave pair sits on the content container; targets
//! are resolved to chunks through the lookup attribute, so listener count does
//! not grow with content size.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use super::host::{ContentHost, HighlightFlag, ListenerKey, NodeId};
use crate::error::SyncError;
use crate::types::ChunkId;

/// Pointer-driven notifications for the orchestrator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentEvent {
    Hovered(Option<ChunkId>),
    Activated(ChunkId),
}

type HoverCallback = Box<dyn FnMut(Option<&ChunkId>)>;

#[derive(Default)]
struct Subscribers {
    entries: Vec<(u64, HoverCallback)>,
    next_id: u64,
    notifying: bool,
    removed_while_notifying: HashSet<u64>,
}

/// Handle returned by [`ChunkHighlighter::subscribe_hover`]
#[derive(Debug)]
pub struct HoverSubscription {
    id: u64,
    list: Weak<RefCell<Subscribers>>,
}

impl HoverSubscription {
    /// Stop receiving hover changes. A no-op once the controller is gone.
    pub fn unsubscribe(self) {
        let Some(list) = self.list.upgrade() else {
            return;
        };
        let Ok(mut list) = list.try_borrow_mut() else {
            return;
        };
        if list.notifying {
            list.removed_while_notifying.insert(self.id);
        }
        list.entries.retain(|(id, _)| *id != self.id);
    }
}

pub struct ChunkHighlighter {
    host: Box<dyn ContentHost>,
    attribute: String,
    listeners: Option<ListenerKey>,
    hovered: Option<ChunkId>,
    active: Option<ChunkId>,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl ChunkHighlighter {
    /// Attach to a content container. Fails if the container is missing.
    pub fn new(mut host: Box<dyn ContentHost>, attribute: impl Into<String>) -> Result<Self, SyncError> {
        if !host.has_container() {
            return Err(SyncError::wiring("content container is missing"));
        }
        let attribute = attribute.into();
        if attribute.is_empty() {
            return Err(SyncError::wiring("chunk lookup attribute is empty"));
        }
        let key = host.add_delegated_listeners();
        debug!("Chunk highlighter attached, lookup attribute {attribute}");
        Ok(Self {
            host,
            attribute,
            listeners: Some(key),
            hovered: None,
            active: None,
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn hovered(&self) -> Option<&ChunkId> {
        self.hovered.as_ref()
    }

    pub fn active(&self) -> Option<&ChunkId> {
        self.active.as_ref()
    }

    pub fn has_chunk(&self, id: &ChunkId) -> bool {
        self.host.has_chunk(&self.attribute, id)
    }

    fn resolve(&self, node: NodeId) -> Option<ChunkId> {
        self.host
            .closest_attribute(node, &self.attribute)
            .filter(|v| !v.is_empty())
            .map(ChunkId::from)
    }

    /// Delegated enter on the container
    pub fn on_pointer_enter(&mut self, target: NodeId) -> Option<ContentEvent> {
        if !self.is_attached() {
            return None;
        }
        let id = self.resolve(target)?;
        if self.hovered.as_ref() == Some(&id) {
            return None;
        }
        self.apply_hover(Some(id.clone()));
        self.notify_hover();
        Some(ContentEvent::Hovered(Some(id)))
    }

    /// Delegated leave on the container; `related` is the node being entered
    pub fn on_pointer_leave(&mut self, target: NodeId, related: Option<NodeId>) -> Option<ContentEvent> {
        if !self.is_attached() {
            return None;
        }
        let id = self.resolve(target)?;
        if related.and_then(|n| self.resolve(n)).as_ref() == Some(&id) {
            // Moving between descendants of the same chunk
            return None;
        }
        if self.hovered.as_ref() != Some(&id) {
            return None;
        }
        self.apply_hover(None);
        self.notify_hover();
        Some(ContentEvent::Hovered(None))
    }

    pub fn on_click(&mut self, target: NodeId) -> Option<ContentEvent> {
        if !self.is_attached() {
            return None;
        }
        let id = self.resolve(target)?;
        self.set_active(Some(&id));
        Some(ContentEvent::Activated(id))
    }

    fn apply_hover(&mut self, id: Option<ChunkId>) {
        if let Some(old) = self.hovered.take() {
            self.host
                .set_flag(&self.attribute, &old, HighlightFlag::Hover, false);
        }
        if let Some(new) = &id {
            self.host
                .set_flag(&self.attribute, new, HighlightFlag::Hover, true);
        }
        self.hovered = id;
    }

    /// Mirror a hover that originated on another surface. Subscribers are
    /// not notified; they only see pointer-driven changes on this container.
    pub fn set_hovered(&mut self, id: Option<&ChunkId>) {
        if !self.is_attached() || self.hovered.as_ref() == id {
            return;
        }
        self.apply_hover(id.cloned());
    }

    /// Make `id` the single active chunk (or clear it)
    pub fn set_active(&mut self, id: Option<&ChunkId>) {
        if !self.is_attached() || self.active.as_ref() == id {
            return;
        }
        if let Some(old) = self.active.take() {
            self.host
                .set_flag(&self.attribute, &old, HighlightFlag::Active, false);
        }
        if let Some(new) = id {
            if self.host.has_chunk(&self.attribute, new) {
                self.host
                    .set_flag(&self.attribute, new, HighlightFlag::Active, true);
            } else {
                warn!("Active chunk {new} is not present in the content");
            }
            self.active = Some(new.clone());
        }
    }

    /// Centre the chunk in view. Unknown ids are logged and ignored.
    pub fn scroll_to_chunk(&mut self, id: &ChunkId) -> bool {
        if !self.is_attached() {
            return false;
        }
        if !self.host.has_chunk(&self.attribute, id) {
            warn!("scroll_to_chunk: chunk {id} not found");
            return false;
        }
        self.host.scroll_to_center(&self.attribute, id);
        true
    }

    pub fn subscribe_hover<F>(&mut self, callback: F) -> HoverSubscription
    where
        F: FnMut(Option<&ChunkId>) + 'static,
    {
        let mut list = self.subscribers.borrow_mut();
        list.next_id += 1;
        let id = list.next_id;
        list.entries.push((id, Box::new(callback)));
        HoverSubscription {
            id,
            list: Rc::downgrade(&self.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    fn notify_hover(&mut self) {
        let mut entries = {
            let mut list = self.subscribers.borrow_mut();
            list.notifying = true;
            std::mem::take(&mut list.entries)
        };
        let hovered = self.hovered.clone();
        for (_, callback) in entries.iter_mut() {
            callback(hovered.as_ref());
        }
        let mut list = self.subscribers.borrow_mut();
        let removed = std::mem::take(&mut list.removed_while_notifying);
        entries.retain(|(id, _)| !removed.contains(id));
        // Subscriptions added from inside a callback go after the existing ones
        entries.append(&mut list.entries);
        list.entries = entries;
        list.notifying = false;
    }

    /// Remove the listener pair, clear both flags and drop subscribers
    pub fn detach(&mut self) {
        let Some(key) = self.listeners.take() else {
            return;
        };
        if let Some(old) = self.hovered.take() {
            self.host
                .set_flag(&self.attribute, &old, HighlightFlag::Hover, false);
        }
        if let Some(old) = self.active.take() {
            self.host
                .set_flag(&self.attribute, &old, HighlightFlag::Active, false);
        }
        self.host.remove_delegated_listeners(key);
        self.subscribers.borrow_mut().entries.clear();
        debug!("Chunk highlighter detached");
    }
}

impl Drop for ChunkHighlighter {
    fn drop(&mut self) {
        self.detach();
    }
}
