use std::time::{Duration, Instant};

use docsync::content::{HighlightFlag, MemoryContent};
use docsync::navigation::{MemoryHistory, NavigationOrchestrator, OverlayStatus, SyncConfig};
use docsync::overlay::{FixedSurface, OverlayKey};
use docsync::temporal::Cue;
use docsync::test_utils::test_helpers::{
    Harness, ManualBackend, RecordingCaptions, RecordingMedia, element, page_structure,
};
use docsync::types::{ChunkId, Dimensions};
use docsync::SyncError;

fn id(s: &str) -> ChunkId {
    ChunkId::from(s)
}

fn cue(id: &str, start: f64, end: f64) -> Cue {
    Cue {
        id: Some(id.to_string()),
        start,
        end,
        text: format!("text of {id}"),
    }
}

#[test]
fn nothing_reaches_the_hosts_after_destroy() {
    let mut h = Harness::new("page=1", 3, &["a", "b"]);
    h.sync.init();
    h.reply_structure(1, Some(page_structure(1, vec![element("a", (10.0, 10.0, 90.0, 90.0))])));
    let cues = vec![cue("a", 0.0, 5.0), cue("b", 5.0, 10.0)];
    h.sync.load_transcript(Some(cues.as_slice()), None);

    let t0 = Instant::now();
    h.sync.overlay_pointer_enter(&id("a"), t0);
    h.sync.on_media_time(1.0, t0);
    h.sync.on_media_time(6.0, t0 + Duration::from_millis(10));
    assert!(h.sync.temporal().has_pending());
    h.sync.go_to_page(2);
    h.sync.open_chunk(&id("b"));

    h.sync.destroy();
    assert!(h.sync.is_destroyed());
    assert_eq!(h.content.listener_count(), 0);
    assert!(h.content.flagged(HighlightFlag::Active).is_empty());

    let content_writes = h.content.write_count();
    let history_ops = h.history.ops().len();
    let submitted = h.backend.requests().len();

    // Timers, late replies and every input are all inert now
    h.sync.tick(t0 + Duration::from_secs(5));
    assert!(h.backend.reply_structure(2, Some(page_structure(2, vec![element("b", (0.0, 0.0, 50.0, 50.0))]))));
    assert!(h.backend.reply_chunk("b", Some(docsync::test_utils::test_helpers::location("b", 2))));
    assert_eq!(h.sync.pump(), 0);

    h.sync.overlay_click(&id("a"));
    h.sync.overlay_key(OverlayKey::Enter);
    h.sync.content_click(0);
    h.sync.go_to_page(3);
    h.sync.open_chunk(&id("a"));
    h.sync.on_history_pop("page=3&chunk=a");
    h.sync.on_media_time(7.0, t0 + Duration::from_secs(6));
    h.sync.attach_surface(&h.surface);
    h.sync.on_surface_resized(Dimensions::new(50.0, 50.0));
    h.sync.on_animation_frame();
    h.sync.init();

    let mut media = RecordingMedia::default();
    let mut captions = RecordingCaptions::default();
    h.sync.seek(3.0, &mut media);
    h.sync.on_media_duration(10.0, &mut media);
    assert!(!h.sync.update_caption(1.0, &mut captions));
    assert!(h.sync.subscribe_content_hover(|_| {}).is_none());

    assert_eq!(h.content.write_count(), content_writes);
    assert_eq!(h.history.ops().len(), history_ops);
    assert_eq!(h.backend.requests().len(), submitted - 2);
    assert!(media.seeks.is_empty());
    assert!(captions.writes.is_empty());

    let snapshot = h.sync.snapshot();
    assert!(snapshot.destroyed);
    assert_eq!(snapshot.overlay_status, OverlayStatus::Idle);
    assert!(snapshot.regions.is_empty());
    assert_eq!(snapshot.pending_requests, 0);
}

#[test]
fn destroy_twice_is_harmless() {
    let mut h = Harness::new("", 1, &[]);
    h.sync.init();
    h.sync.destroy();
    let writes = h.content.write_count();
    h.sync.destroy();
    assert_eq!(h.content.write_count(), writes);
}

#[test]
fn page_change_tears_down_the_old_overlay_at_once() {
    let mut h = Harness::new("page=1", 2, &[]);
    h.sync.init();
    h.reply_structure(1, Some(page_structure(1, vec![element("a", (10.0, 10.0, 90.0, 90.0))])));
    let t0 = Instant::now();
    h.sync.overlay_pointer_enter(&id("a"), t0);

    h.sync.next_page();
    assert!(h.sync.overlay().is_none());
    assert_eq!(h.sync.next_deadline(), None);

    // The old page's pending hover never fires
    h.sync.tick(t0 + Duration::from_secs(1));
    assert_eq!(h.sync.highlight().hovered, None);
}

#[test]
fn overlay_waits_for_layout_and_follows_resizes() {
    let mut h = Harness::new("page=1", 1, &[]);
    h.surface.resize(Dimensions::new(0.0, 0.0));
    h.sync.attach_surface(&h.surface);
    h.sync.init();
    h.reply_structure(1, Some(page_structure(1, vec![element("a", (0.0, 50.0, 50.0, 100.0))])));

    assert_eq!(h.sync.overlay_status(), OverlayStatus::Ready);
    assert!(h.sync.snapshot().regions.is_empty());

    assert!(h.sync.on_surface_resized(Dimensions::new(400.0, 400.0)));
    assert!(!h.sync.on_surface_resized(Dimensions::new(300.0, 300.0)));
    h.sync.on_animation_frame();

    let regions = h.sync.snapshot().regions;
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].rect.width, 150.0);
    assert_eq!(regions[0].rect.y, 0.0);
}

#[test]
fn hidden_page_image_hides_regions() {
    let mut h = Harness::new("page=1", 1, &[]);
    h.sync.init();
    h.reply_structure(1, Some(page_structure(1, vec![element("a", (10.0, 10.0, 90.0, 90.0))])));
    assert_eq!(h.sync.snapshot().regions.len(), 1);

    h.sync.set_page_image_ready(false);
    assert!(h.sync.snapshot().regions.is_empty());
    h.sync.set_page_image_ready(true);
    assert_eq!(h.sync.snapshot().regions.len(), 1);
}

#[test]
fn wiring_failures_are_reported() {
    let missing = NavigationOrchestrator::new(
        "doc",
        3,
        SyncConfig::default(),
        Box::new(ManualBackend::new()),
        Box::new(MemoryHistory::new("")),
        Box::new(MemoryContent::without_container()),
    );
    assert!(matches!(missing, Err(SyncError::Wiring(_))));

    let empty = NavigationOrchestrator::new(
        "doc",
        0,
        SyncConfig::default(),
        Box::new(ManualBackend::new()),
        Box::new(MemoryHistory::new("")),
        Box::new(MemoryContent::new()),
    );
    assert!(matches!(empty, Err(SyncError::Wiring(_))));
}

#[test]
fn window_resize_fallback_without_observer() {
    let mut h = Harness::new("page=1", 1, &[]);
    let surface = FixedSurface::new(Dimensions::new(100.0, 100.0), false);
    h.sync.attach_surface(&surface);
    h.sync.init();
    h.reply_structure(1, Some(page_structure(1, vec![element("a", (0.0, 0.0, 100.0, 100.0))])));

    surface.resize(Dimensions::new(250.0, 250.0));
    assert!(h.sync.on_window_resize(&surface));
    h.sync.on_animation_frame();
    assert_eq!(h.sync.display_dimensions(), Some(Dimensions::new(250.0, 250.0)));
}
