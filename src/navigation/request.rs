//! Fetch request and response types

use crate::error::FetchError;
use crate::types::{ChunkId, ChunkLocation, PageStructure};

/// Unique identifier for fetch requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchKind {
    /// Structure of one page
    Structure { page: usize },
    /// Owning page of a chunk
    ChunkLookup { chunk_id: ChunkId },
}

/// Request handed to a [`crate::backend::DocumentBackend`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub document_id: String,
    pub kind: FetchKind,
}

/// Reply sent back over the orchestrator's channel. `Ok(None)` means the data
/// does not exist, which is a normal outcome.
#[derive(Debug)]
pub enum FetchResponse {
    Structure {
        id: RequestId,
        page: usize,
        result: Result<Option<PageStructure>, FetchError>,
    },
    ChunkLookup {
        id: RequestId,
        chunk_id: ChunkId,
        result: Result<Option<ChunkLocation>, FetchError>,
    },
}

impl FetchResponse {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Structure { id, .. } | Self::ChunkLookup { id, .. } => *id,
        }
    }

    /// Answer `request` with no data
    #[must_use]
    pub fn empty(request: &FetchRequest) -> Self {
        match &request.kind {
            FetchKind::Structure { page } => Self::Structure {
                id: request.id,
                page: *page,
                result: Ok(None),
            },
            FetchKind::ChunkLookup { chunk_id } => Self::ChunkLookup {
                id: request.id,
                chunk_id: chunk_id.clone(),
                result: Ok(None),
            },
        }
    }

    /// Answer `request` with a failure
    #[must_use]
    pub fn failed(request: &FetchRequest, error: FetchError) -> Self {
        match &request.kind {
            FetchKind::Structure { page } => Self::Structure {
                id: request.id,
                page: *page,
                result: Err(error),
            },
            FetchKind::ChunkLookup { chunk_id } => Self::ChunkLookup {
                id: request.id,
                chunk_id: chunk_id.clone(),
                result: Err(error),
            },
        }
    }
}
