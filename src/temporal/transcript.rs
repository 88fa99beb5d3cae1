//! Transcript sources normalized into [`TranscriptChunk`]s
//!
//! Two sources exist: structured cues (preferred) and inline text markers such
//! as `[00:04.0 - 00:09.5] {chunk-7} text`. Exactly one is chosen per
//! document; both end up in the same ordered, non-overlapping shape.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ChunkId, TranscriptChunk};

/// A structured cue as delivered by a media text track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Which source a transcript was built from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptOrigin {
    Cues,
    Markers,
    None,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("bad timestamp {0:?}")]
    BadTimestamp(String),
}

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[\s*(?P<start>\d+(?::\d{1,2}){0,2}(?:\.\d+)?)\s*(?:-->|-|–)\s*(?P<end>\d+(?::\d{1,2}){0,2}(?:\.\d+)?)\s*\](?:[ \t]*\{(?P<id>[^}\s]+)\})?",
    )
    .expect("marker regex is valid")
});

/// Build the canonical transcript for a document: cues when there are any,
/// otherwise the text markers.
pub fn select_transcript(
    cues: Option<&[Cue]>,
    marker_text: Option<&str>,
) -> (TranscriptOrigin, Vec<TranscriptChunk>) {
    if let Some(cues) = cues.filter(|c| !c.is_empty()) {
        if marker_text.is_some_and(|t| !t.trim().is_empty()) {
            debug!("Both cues and text markers present, using cues");
        }
        return (TranscriptOrigin::Cues, chunks_from_cues(cues));
    }
    match marker_text {
        Some(text) if !text.trim().is_empty() => (TranscriptOrigin::Markers, parse_markers(text)),
        _ => (TranscriptOrigin::None, Vec::new()),
    }
}

pub fn chunks_from_cues(cues: &[Cue]) -> Vec<TranscriptChunk> {
    let chunks = cues
        .iter()
        .enumerate()
        .map(|(i, cue)| TranscriptChunk {
            chunk_id: cue
                .id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(ChunkId::from)
                .unwrap_or_else(|| generated_id(i)),
            start_time: cue.start,
            end_time: cue.end,
            text: cue.text.trim().to_string(),
        })
        .collect();
    normalize(chunks)
}

/// Parse inline `[start - end] {id} text` markers. Text runs until the next
/// marker. Markers with unreadable timestamps are skipped with a warning.
pub fn parse_markers(text: &str) -> Vec<TranscriptChunk> {
    let matches: Vec<_> = MARKER_RE.captures_iter(text).collect();
    let mut chunks = Vec::with_capacity(matches.len());

    for (i, caps) in matches.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let body_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = text[whole.end()..body_end].trim();

        let times = (
            parse_timestamp(&caps["start"]),
            parse_timestamp(&caps["end"]),
        );
        let (start, end) = match times {
            (Ok(s), Ok(e)) => (s, e),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Skipping transcript marker {:?}: {e}", whole.as_str());
                continue;
            }
        };
        let chunk_id = caps
            .name("id")
            .map(|m| ChunkId::from(m.as_str()))
            .unwrap_or_else(|| generated_id(i));

        chunks.push(TranscriptChunk {
            chunk_id,
            start_time: start,
            end_time: end,
            text: body.split_whitespace().collect::<Vec<_>>().join(" "),
        });
    }
    normalize(chunks)
}

fn generated_id(index: usize) -> ChunkId {
    ChunkId::new(format!("t{index}"))
}

/// Accepts `SS(.fff)`, `MM:SS(.fff)` and `HH:MM:SS(.fff)`
pub fn parse_timestamp(raw: &str) -> Result<f64, TranscriptError> {
    let bad = || TranscriptError::BadTimestamp(raw.to_string());
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(bad());
    }
    let mut seconds = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let last = i == parts.len() - 1;
        let value: f64 = part.parse().map_err(|_| bad())?;
        if !value.is_finite() || value < 0.0 || (!last && part.contains('.')) {
            return Err(bad());
        }
        if i > 0 && value >= 60.0 {
            return Err(bad());
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

/// Sort by start, drop empty or non-finite ranges, and truncate overlaps so
/// ranges never intersect.
pub fn normalize(mut chunks: Vec<TranscriptChunk>) -> Vec<TranscriptChunk> {
    chunks.retain(|c| {
        let ok = c.start_time.is_finite() && c.end_time.is_finite() && c.end_time > c.start_time;
        if !ok {
            warn!(
                "Dropping transcript chunk {} with range [{}, {})",
                c.chunk_id, c.start_time, c.end_time
            );
        }
        ok
    });
    chunks.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut out: Vec<TranscriptChunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if let Some(prev) = out.last_mut() {
            if prev.end_time > chunk.start_time {
                warn!(
                    "Transcript chunk {} overlaps {}, truncating to {}",
                    prev.chunk_id, chunk.chunk_id, chunk.start_time
                );
                prev.end_time = chunk.start_time;
            }
        }
        out.push(chunk);
    }
    out.retain(|c| c.end_time > c.start_time);
    out
}
