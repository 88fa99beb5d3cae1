//! Page navigation, URL state and cross-surface mediation

pub mod cache;
pub mod history;
pub mod orchestrator;
pub mod request;
pub mod state;
pub mod url_state;

pub use cache::{CachedStructure, DEFAULT_CACHE_PAGES, StructureCache};
pub use history::{HistoryHost, HistoryOp, MemoryHistory};
pub use orchestrator::{
    NavigationOrchestrator, OverlayStatus, RegionSnapshot, SyncConfig, SyncSnapshot,
};
pub use request::{FetchKind, FetchRequest, FetchResponse, RequestId};
pub use state::{HighlightCommand, HighlightEffect, HighlightState, Origin};
pub use url_state::{NavigationState, QueryState, parse_query, update_query};
