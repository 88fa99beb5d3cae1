//! Text-content side: delegated chunk highlighting and its host boundary

pub mod highlight;
pub mod host;
pub mod memory;

pub use highlight::{ChunkHighlighter, ContentEvent, HoverSubscription};
pub use host::{ContentHost, DEFAULT_CHUNK_ATTRIBUTE, HighlightFlag, ListenerKey, NodeId};
pub use memory::{ContentWrite, MemoryContent};
