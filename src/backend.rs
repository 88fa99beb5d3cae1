//! Document backend boundary
//!
//! Structure fetches and chunk lookups are submitted as tagged
//! [`FetchRequest`]s; replies come back over a flume channel that the
//! orchestrator drains in its `pump`. A backend may answer immediately, from
//! another thread, or never.

use std::sync::Arc;

use flume::Sender;
use log::{debug, warn};

use crate::fixture::DocumentFixture;
use crate::navigation::request::{FetchKind, FetchRequest, FetchResponse};

pub trait DocumentBackend {
    fn submit(&mut self, request: FetchRequest, reply: Sender<FetchResponse>);
}

/// Answers synchronously from an in-memory [`DocumentFixture`]
#[derive(Clone, Debug)]
pub struct FixtureBackend {
    fixture: Arc<DocumentFixture>,
}

impl FixtureBackend {
    pub fn new(fixture: DocumentFixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    pub fn fixture(&self) -> &DocumentFixture {
        &self.fixture
    }

    fn answer(&self, request: &FetchRequest) -> FetchResponse {
        if request.document_id != self.fixture.document_id {
            debug!(
                "Fixture has no document {}, answering empty",
                request.document_id
            );
            return FetchResponse::empty(request);
        }
        match &request.kind {
            FetchKind::Structure { page } => FetchResponse::Structure {
                id: request.id,
                page: *page,
                result: Ok(self.fixture.page(*page).cloned()),
            },
            FetchKind::ChunkLookup { chunk_id } => FetchResponse::ChunkLookup {
                id: request.id,
                chunk_id: chunk_id.clone(),
                result: Ok(self.fixture.chunk(chunk_id.as_str()).cloned()),
            },
        }
    }
}

impl DocumentBackend for FixtureBackend {
    fn submit(&mut self, request: FetchRequest, reply: Sender<FetchResponse>) {
        let response = self.answer(&request);
        if reply.send(response).is_err() {
            warn!("Reply channel closed before request {:?} was answered", request.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::request::RequestId;
    use crate::types::{ChunkId, ChunkLocation, Dimensions, PageStructure};

    fn backend() -> FixtureBackend {
        FixtureBackend::new(DocumentFixture {
            document_id: "doc".into(),
            total_pages: 2,
            pages: vec![PageStructure {
                page_number: 1,
                source_dimensions: Dimensions::new(10.0, 10.0),
                elements: vec![],
            }],
            chunks: vec![ChunkLocation {
                chunk_id: "c".into(),
                page: 2,
                bbox: None,
                text: String::new(),
            }],
            ..DocumentFixture::default()
        })
    }

    fn request(id: u64, document_id: &str, kind: FetchKind) -> FetchRequest {
        FetchRequest {
            id: RequestId::new(id),
            document_id: document_id.into(),
            kind,
        }
    }

    #[test]
    fn answers_structure_and_lookups() {
        let (tx, rx) = flume::unbounded();
        let mut backend = backend();
        backend.submit(request(1, "doc", FetchKind::Structure { page: 1 }), tx.clone());
        backend.submit(request(2, "doc", FetchKind::Structure { page: 2 }), tx.clone());
        backend.submit(
            request(3, "doc", FetchKind::ChunkLookup { chunk_id: ChunkId::from("c") }),
            tx,
        );

        let replies: Vec<_> = rx.try_iter().collect();
        assert_eq!(replies.len(), 3);
        assert!(matches!(&replies[0], FetchResponse::Structure { result: Ok(Some(_)), .. }));
        assert!(matches!(&replies[1], FetchResponse::Structure { result: Ok(None), .. }));
        match &replies[2] {
            FetchResponse::ChunkLookup { result: Ok(Some(loc)), .. } => assert_eq!(loc.page, 2),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn other_documents_are_empty() {
        let (tx, rx) = flume::unbounded();
        backend().submit(request(7, "other", FetchKind::Structure { page: 1 }), tx);
        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.id(), RequestId::new(7));
        assert!(matches!(reply, FetchResponse::Structure { result: Ok(None), .. }));
    }
}
