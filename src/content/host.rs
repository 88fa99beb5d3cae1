//! Boundary between the highlight controller and whatever renders the text
//!
//! The renderer is expected to wrap every chunk in an element carrying a
//! lookup attribute (see [`DEFAULT_CHUNK_ATTRIBUTE`]). That attribute is the
//! only thing the controller knows about how content is drawn.

use crate::types::ChunkId;

/// Attribute on each chunk wrapper holding its chunk id
pub const DEFAULT_CHUNK_ATTRIBUTE: &str = "data-chunk-id";

/// Opaque handle to a node inside the content container
pub type NodeId = usize;

/// Registration handle for the delegated enter/leave listener pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighlightFlag {
    /// Transient pointer preview
    Hover,
    /// Persistent selection, one per container
    Active,
}

pub trait ContentHost {
    /// Whether the content container exists
    fn has_container(&self) -> bool;

    /// Attach one enter/leave listener pair to the container itself
    fn add_delegated_listeners(&mut self) -> ListenerKey;

    fn remove_delegated_listeners(&mut self, key: ListenerKey);

    /// Value of `attribute` on `node` or its nearest ancestor that has it
    fn closest_attribute(&self, node: NodeId, attribute: &str) -> Option<String>;

    /// Whether a wrapper with `attribute == id` exists
    fn has_chunk(&self, attribute: &str, id: &ChunkId) -> bool;

    fn set_flag(&mut self, attribute: &str, id: &ChunkId, flag: HighlightFlag, on: bool);

    /// Smooth-scroll the wrapper so it sits at the vertical centre
    fn scroll_to_center(&mut self, attribute: &str, id: &ChunkId);
}
