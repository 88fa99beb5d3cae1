use std::path::Path;

use docsync::fixture::DocumentFixture;
use docsync::navigation::OverlayStatus;
use docsync::replay::{ReplayOptions, Step, replay};
use docsync::temporal::TranscriptOrigin;
use docsync::types::{ChunkId, Dimensions};

fn lecture() -> DocumentFixture {
    DocumentFixture::load(Path::new("tests/testdata/lecture.json")).expect("fixture loads")
}

#[test]
fn fixture_on_disk_loads() {
    let fixture = lecture();
    assert_eq!(fixture.total_pages, 3);
    assert!(fixture.page(3).is_none());
    assert_eq!(fixture.chunk("summary").map(|c| c.page), Some(3));
}

#[test]
fn scripted_session_ends_where_the_script_says() {
    let steps = Step::parse_script(
        r#"[
            {"op": "next_page"},
            {"op": "overlay_click", "chunk": "method-table"},
            {"op": "open_chunk", "chunk": "summary"},
            {"op": "back"},
            {"op": "resize", "width": 306, "height": 396}
        ]"#,
    )
    .expect("script parses");

    let report = replay(lecture(), ReplayOptions::default(), &steps).expect("replay runs");

    assert_eq!(report.snapshot.navigation.page, 2);
    assert_eq!(report.url, "page=2&chunk=method-table");
    assert_eq!(
        report.history,
        vec!["page=1", "page=2&chunk=method-table", "page=3&chunk=summary"]
    );
    assert_eq!(report.snapshot.display, Some(Dimensions::new(306.0, 396.0)));
    assert_eq!(report.snapshot.overlay_status, OverlayStatus::Ready);
    assert_eq!(report.snapshot.regions.len(), 2);
    assert_eq!(report.transcript, TranscriptOrigin::Cues);
}

#[test]
fn page_without_structure_reports_unavailable_overlay() {
    let options = ReplayOptions {
        query: "page=3".into(),
        surface: Dimensions::new(612.0, 792.0),
        ..ReplayOptions::default()
    };
    let report = replay(lecture(), options, &[]).expect("replay runs");

    assert_eq!(report.snapshot.overlay_status, OverlayStatus::Unavailable);
    assert!(report.snapshot.regions.is_empty());
    assert_eq!(report.snapshot.cached_pages, vec![3]);
}

#[test]
fn report_serializes_to_json() {
    let report = replay(
        lecture(),
        ReplayOptions::default(),
        &[Step::OverlayClick {
            chunk: ChunkId::from("intro-figure"),
        }],
    )
    .expect("replay runs");

    let json = serde_json::to_value(&report).expect("serializable");
    assert_eq!(json["snapshot"]["highlight"]["active"], "intro-figure");
    assert_eq!(json["snapshot"]["overlay_status"], "ready");
    assert_eq!(json["transcript"], "cues");
}
