//! In-memory content tree implementing [`ContentHost`]
//!
//! Used by the replay CLI and by tests. Handles are cheap clones sharing one
//! tree so a caller can keep a handle for inspection after moving another into
//! the controller.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use super::host::{ContentHost, DEFAULT_CHUNK_ATTRIBUTE, HighlightFlag, ListenerKey, NodeId};
use crate::types::ChunkId;

/// Every mutation the host performed, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentWrite {
    ListenersAdded(ListenerKey),
    ListenersRemoved(ListenerKey),
    Flag {
        chunk_id: ChunkId,
        flag: HighlightFlag,
        on: bool,
    },
    Scroll(ChunkId),
}

#[derive(Debug, Default)]
struct Node {
    parent: Option<NodeId>,
    attributes: HashMap<String, String>,
    flags: BTreeSet<HighlightFlag>,
}

#[derive(Debug, Default)]
struct Tree {
    container: bool,
    nodes: Vec<Node>,
    listeners: HashSet<ListenerKey>,
    next_listener: u64,
    writes: Vec<ContentWrite>,
}

impl Tree {
    fn find(&self, attribute: &str, id: &ChunkId) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.attributes.get(attribute).map(String::as_str) == Some(id.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct MemoryContent {
    tree: Rc<RefCell<Tree>>,
}

impl Default for MemoryContent {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContent {
    /// An empty container
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree {
                container: true,
                ..Tree::default()
            })),
        }
    }

    /// A host whose container is missing, for wiring-failure paths
    pub fn without_container() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::default())),
        }
    }

    /// Container with one wrapper per chunk id, tagged with the default attribute
    pub fn with_chunks<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChunkId>,
    {
        let content = Self::new();
        for id in ids {
            content.add_chunk(&id.into());
        }
        content
    }

    /// Add a chunk wrapper at the top level of the container
    pub fn add_chunk(&self, id: &ChunkId) -> NodeId {
        self.add_node(
            None,
            [(DEFAULT_CHUNK_ATTRIBUTE.to_string(), id.to_string())],
        )
    }

    /// Add an attribute-less node under `parent` (e.g. a span inside a chunk)
    pub fn add_child(&self, parent: NodeId) -> NodeId {
        self.add_node(Some(parent), [])
    }

    pub fn add_node<I>(&self, parent: Option<NodeId>, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut tree = self.tree.borrow_mut();
        tree.nodes.push(Node {
            parent,
            attributes: attributes.into_iter().collect(),
            flags: BTreeSet::new(),
        });
        tree.nodes.len() - 1
    }

    /// Node of the wrapper for `id` under the default attribute
    pub fn node_of(&self, id: &ChunkId) -> Option<NodeId> {
        self.tree.borrow().find(DEFAULT_CHUNK_ATTRIBUTE, id)
    }

    pub fn listener_count(&self) -> usize {
        self.tree.borrow().listeners.len()
    }

    pub fn has_flag(&self, id: &ChunkId, flag: HighlightFlag) -> bool {
        let tree = self.tree.borrow();
        tree.find(DEFAULT_CHUNK_ATTRIBUTE, id)
            .is_some_and(|n| tree.nodes[n].flags.contains(&flag))
    }

    /// Chunks currently carrying `flag`
    pub fn flagged(&self, flag: HighlightFlag) -> Vec<ChunkId> {
        let tree = self.tree.borrow();
        tree.nodes
            .iter()
            .filter(|n| n.flags.contains(&flag))
            .filter_map(|n| n.attributes.get(DEFAULT_CHUNK_ATTRIBUTE))
            .map(|v| ChunkId::from(v.as_str()))
            .collect()
    }

    pub fn last_scrolled(&self) -> Option<ChunkId> {
        self.tree.borrow().writes.iter().rev().find_map(|w| match w {
            ContentWrite::Scroll(id) => Some(id.clone()),
            _ => None,
        })
    }

    pub fn writes(&self) -> Vec<ContentWrite> {
        self.tree.borrow().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.tree.borrow().writes.len()
    }
}

impl ContentHost for MemoryContent {
    fn has_container(&self) -> bool {
        self.tree.borrow().container
    }

    fn add_delegated_listeners(&mut self) -> ListenerKey {
        let mut tree = self.tree.borrow_mut();
        tree.next_listener += 1;
        let key = ListenerKey(tree.next_listener);
        tree.listeners.insert(key);
        tree.writes.push(ContentWrite::ListenersAdded(key));
        key
    }

    fn remove_delegated_listeners(&mut self, key: ListenerKey) {
        let mut tree = self.tree.borrow_mut();
        if tree.listeners.remove(&key) {
            tree.writes.push(ContentWrite::ListenersRemoved(key));
        }
    }

    fn closest_attribute(&self, node: NodeId, attribute: &str) -> Option<String> {
        let tree = self.tree.borrow();
        let mut current = Some(node);
        while let Some(idx) = current {
            let n = tree.nodes.get(idx)?;
            if let Some(value) = n.attributes.get(attribute) {
                return Some(value.clone());
            }
            current = n.parent;
        }
        None
    }

    fn has_chunk(&self, attribute: &str, id: &ChunkId) -> bool {
        self.tree.borrow().find(attribute, id).is_some()
    }

    fn set_flag(&mut self, attribute: &str, id: &ChunkId, flag: HighlightFlag, on: bool) {
        let mut tree = self.tree.borrow_mut();
        let Some(idx) = tree.find(attribute, id) else {
            return;
        };
        let changed = if on {
            tree.nodes[idx].flags.insert(flag)
        } else {
            tree.nodes[idx].flags.remove(&flag)
        };
        if changed {
            tree.writes.push(ContentWrite::Flag {
                chunk_id: id.clone(),
                flag,
                on,
            });
        }
    }

    fn scroll_to_center(&mut self, attribute: &str, id: &ChunkId) {
        let mut tree = self.tree.borrow_mut();
        if tree.find(attribute, id).is_some() {
            tree.writes.push(ContentWrite::Scroll(id.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_attribute_walks_ancestors() {
        let content = MemoryContent::new();
        let chunk = content.add_chunk(&"c1".into());
        let span = content.add_child(chunk);
        let inner = content.add_child(span);
        let stray = content.add_node(None, []);

        assert_eq!(
            content.closest_attribute(inner, DEFAULT_CHUNK_ATTRIBUTE),
            Some("c1".to_string())
        );
        assert_eq!(content.closest_attribute(stray, DEFAULT_CHUNK_ATTRIBUTE), None);
        assert_eq!(content.closest_attribute(999, DEFAULT_CHUNK_ATTRIBUTE), None);
    }

    #[test]
    fn clones_share_one_tree() {
        let content = MemoryContent::with_chunks(["a", "b"]);
        let mut handle: Box<dyn ContentHost> = Box::new(content.clone());

        handle.set_flag(DEFAULT_CHUNK_ATTRIBUTE, &"b".into(), HighlightFlag::Active, true);
        assert!(content.has_flag(&"b".into(), HighlightFlag::Active));
        assert_eq!(content.flagged(HighlightFlag::Active), vec![ChunkId::from("b")]);
    }

    #[test]
    fn redundant_flag_writes_are_not_recorded() {
        let mut content = MemoryContent::with_chunks(["a"]);
        content.set_flag(DEFAULT_CHUNK_ATTRIBUTE, &"a".into(), HighlightFlag::Hover, true);
        content.set_flag(DEFAULT_CHUNK_ATTRIBUTE, &"a".into(), HighlightFlag::Hover, true);
        assert_eq!(content.write_count(), 1);
    }
}
