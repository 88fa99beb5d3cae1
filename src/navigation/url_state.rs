//! Navigation state <-> URL query string
//!
//! Only `page` and `chunk` are owned here; every other parameter in the query
//! is carried through untouched and in its original order.

use std::borrow::Cow;

use log::warn;
use serde::Serialize;

use crate::types::ChunkId;

pub const PAGE_PARAM: &str = "page";
pub const CHUNK_PARAM: &str = "chunk";

/// Longest chunk id accepted from a URL
pub const MAX_CHUNK_ID_LEN: usize = 256;

/// The view's position as mirrored to the URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub page: usize,
    pub chunk_id: Option<ChunkId>,
}

impl NavigationState {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            chunk_id: None,
        }
    }
}

/// What a query string says, before range checks against the document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryState {
    pub page: Option<usize>,
    pub chunk_id: Option<ChunkId>,
}

fn split_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn decode(raw: &str) -> Option<String> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', "%20"))
    } else {
        Cow::Borrowed(raw)
    };
    urlencoding::decode(&spaced).ok().map(Cow::into_owned)
}

/// Read `page` and `chunk`. Malformed values are dropped with a warning; the
/// last occurrence of a repeated parameter wins.
pub fn parse_query(query: &str) -> QueryState {
    let mut state = QueryState::default();
    for (key, value) in split_pairs(query) {
        match key {
            PAGE_PARAM => state.page = parse_page(value),
            CHUNK_PARAM => state.chunk_id = parse_chunk(value),
            _ => {}
        }
    }
    state
}

fn parse_page(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(page) if page >= 1 => Some(page),
        _ => {
            warn!("Ignoring invalid page parameter {raw:?}");
            None
        }
    }
}

fn parse_chunk(raw: &str) -> Option<ChunkId> {
    let Some(decoded) = decode(raw) else {
        warn!("Ignoring undecodable chunk parameter {raw:?}");
        return None;
    };
    if decoded.is_empty()
        || decoded.chars().count() > MAX_CHUNK_ID_LEN
        || decoded.chars().any(char::is_control)
    {
        warn!("Ignoring malformed chunk parameter {raw:?}");
        return None;
    }
    Some(ChunkId::new(decoded))
}

/// Rewrite `existing` so it carries `state`. Other parameters are kept in
/// order; `page` and `chunk` follow them. No leading `?`.
pub fn update_query(existing: &str, state: &NavigationState) -> String {
    let mut parts: Vec<String> = split_pairs(existing)
        .filter(|(key, _)| *key != PAGE_PARAM && *key != CHUNK_PARAM)
        .map(|(key, value)| {
            if value.is_empty() {
                key.to_string()
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    parts.push(format!("{PAGE_PARAM}={}", state.page));
    if let Some(chunk) = &state.chunk_id {
        parts.push(format!("{CHUNK_PARAM}={}", urlencoding::encode(chunk.as_str())));
    }
    parts.join("&")
}
