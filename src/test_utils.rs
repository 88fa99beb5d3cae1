pub mod test_helpers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use flume::Sender;

    use crate::backend::DocumentBackend;
    use crate::content::MemoryContent;
    use crate::error::FetchError;
    use crate::navigation::history::MemoryHistory;
    use crate::navigation::orchestrator::{NavigationOrchestrator, SyncConfig};
    use crate::navigation::request::{FetchKind, FetchRequest, FetchResponse};
    use crate::overlay::FixedSurface;
    use crate::temporal::{CaptionSink, MediaTarget};
    use crate::types::{
        BBox, ChunkId, ChunkLocation, Dimensions, ElementType, PageStructure, StructureElement,
    };

    type Queued = (FetchRequest, Sender<FetchResponse>);

    /// Backend that holds every request until the test answers it, so fetch
    /// completion order is fully under test control.
    #[derive(Clone, Default)]
    pub struct ManualBackend {
        queue: Rc<RefCell<Vec<Queued>>>,
    }

    impl ManualBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn requests(&self) -> Vec<FetchRequest> {
            self.queue.borrow().iter().map(|(r, _)| r.clone()).collect()
        }

        pub fn pending_count(&self) -> usize {
            self.queue.borrow().len()
        }

        /// Pages with an unanswered structure request, oldest first
        pub fn structure_requests(&self) -> Vec<usize> {
            self.queue
                .borrow()
                .iter()
                .filter_map(|(r, _)| match r.kind {
                    FetchKind::Structure { page } => Some(page),
                    FetchKind::ChunkLookup { .. } => None,
                })
                .collect()
        }

        fn take<F>(&self, matches: F) -> Option<Queued>
        where
            F: Fn(&FetchRequest) -> bool,
        {
            let mut queue = self.queue.borrow_mut();
            let idx = queue.iter().position(|(r, _)| matches(r))?;
            Some(queue.remove(idx))
        }

        fn take_structure(&self, page: usize) -> Option<Queued> {
            self.take(|r| r.kind == FetchKind::Structure { page })
        }

        fn take_chunk(&self, chunk_id: &str) -> Option<Queued> {
            self.take(|r| {
                matches!(&r.kind, FetchKind::ChunkLookup { chunk_id: c } if c.as_str() == chunk_id)
            })
        }

        /// Answer the oldest structure request for `page`. False if none is queued.
        pub fn reply_structure(&self, page: usize, structure: Option<PageStructure>) -> bool {
            let Some((request, reply)) = self.take_structure(page) else {
                return false;
            };
            let _ = reply.send(FetchResponse::Structure {
                id: request.id,
                page,
                result: Ok(structure),
            });
            true
        }

        pub fn fail_structure(&self, page: usize, error: FetchError) -> bool {
            let Some((request, reply)) = self.take_structure(page) else {
                return false;
            };
            let _ = reply.send(FetchResponse::failed(&request, error));
            true
        }

        pub fn reply_chunk(&self, chunk_id: &str, location: Option<ChunkLocation>) -> bool {
            let Some((request, reply)) = self.take_chunk(chunk_id) else {
                return false;
            };
            let _ = reply.send(FetchResponse::ChunkLookup {
                id: request.id,
                chunk_id: ChunkId::from(chunk_id),
                result: Ok(location),
            });
            true
        }
    }

    impl DocumentBackend for ManualBackend {
        fn submit(&mut self, request: FetchRequest, reply: Sender<FetchResponse>) {
            self.queue.borrow_mut().push((request, reply));
        }
    }

    /// Text element with `bbox` given as `(left, bottom, right, top)`
    pub fn element(chunk_id: &str, bbox: (f64, f64, f64, f64)) -> StructureElement {
        StructureElement {
            chunk_id: ChunkId::from(chunk_id),
            element_type: ElementType::Text,
            bbox: BBox::new(bbox.0, bbox.1, bbox.2, bbox.3),
            confidence: None,
        }
    }

    /// Page with a 100x100 source space
    pub fn page_structure(page: usize, elements: Vec<StructureElement>) -> PageStructure {
        PageStructure {
            page_number: page,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements,
        }
    }

    pub fn location(chunk_id: &str, page: usize) -> ChunkLocation {
        ChunkLocation {
            chunk_id: ChunkId::from(chunk_id),
            page,
            bbox: None,
            text: String::new(),
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingMedia {
        pub seeks: Vec<f64>,
    }

    impl MediaTarget for RecordingMedia {
        fn set_current_time(&mut self, seconds: f64) {
            self.seeks.push(seconds);
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingCaptions {
        pub writes: Vec<String>,
    }

    impl CaptionSink for RecordingCaptions {
        fn write_caption(&mut self, text: &str) {
            self.writes.push(text.to_string());
        }
    }

    /// An orchestrator wired to in-memory hosts, with handles kept for
    /// inspection
    pub struct Harness {
        pub sync: NavigationOrchestrator,
        pub backend: ManualBackend,
        pub history: MemoryHistory,
        pub content: MemoryContent,
        pub surface: FixedSurface,
    }

    impl Harness {
        /// `chunks` become top-level wrappers in the content container. The
        /// surface is 200x200, twice the builders' source space.
        pub fn new(query: &str, total_pages: usize, chunks: &[&str]) -> Self {
            Self::with_config(query, total_pages, chunks, SyncConfig::default())
        }

        pub fn with_config(
            query: &str,
            total_pages: usize,
            chunks: &[&str],
            config: SyncConfig,
        ) -> Self {
            let backend = ManualBackend::new();
            let history = MemoryHistory::new(query);
            let content = MemoryContent::with_chunks(chunks.iter().copied());
            let surface = FixedSurface::new(Dimensions::new(200.0, 200.0), true);
            let mut sync = NavigationOrchestrator::new(
                "doc",
                total_pages,
                config,
                Box::new(backend.clone()),
                Box::new(history.clone()),
                Box::new(content.clone()),
            )
            .expect("harness wiring");
            sync.attach_surface(&surface);
            Self {
                sync,
                backend,
                history,
                content,
                surface,
            }
        }

        pub fn reply_structure(&mut self, page: usize, structure: Option<PageStructure>) {
            assert!(
                self.backend.reply_structure(page, structure),
                "no structure request queued for page {page}"
            );
            self.sync.pump();
        }

        pub fn reply_chunk(&mut self, chunk_id: &str, page: Option<usize>) {
            assert!(
                self.backend
                    .reply_chunk(chunk_id, page.map(|p| location(chunk_id, p))),
                "no lookup queued for chunk {chunk_id}"
            );
            self.sync.pump();
        }
    }
}
