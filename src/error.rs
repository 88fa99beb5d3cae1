//! Error taxonomy
//!
//! Only wiring errors cross public constructors. Missing data and invalid input
//! are logged and degraded inside the components; stale fetch completions are
//! not errors at all and never appear here.

use crate::types::ChunkId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A required host, container or handle was not provided or is unusable
    #[error("wiring: {0}")]
    Wiring(String),

    #[error("no structure for page {page}")]
    MissingStructure { page: usize },

    #[error("chunk {0} not found")]
    ChunkNotFound(ChunkId),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SyncError {
    pub fn wiring(msg: impl Into<String>) -> Self {
        Self::Wiring(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Failure reported by a document backend for a single fetch
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}
