//! Shared highlight state and the mediation table
//!
//! Every hover or activation, whichever surface it started on, becomes a
//! [`HighlightCommand`] tagged with its [`Origin`]. Applying it updates the one
//! [`HighlightState`] and yields the effects to push to the *other* surfaces.
//! The originating surface already shows the change, so nothing is echoed back.

use serde::Serialize;

use crate::types::ChunkId;

/// Where a highlight change started
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Overlay,
    Content,
    Temporal,
    /// Chunk named in the URL at start-up or on back/forward
    DeepLink,
    /// Explicit user navigation such as opening a chunk or changing page
    Navigation,
}

impl Origin {
    /// Passive sync from the reading surfaces rewrites the URL in place
    fn syncs_url(self) -> bool {
        matches!(self, Self::Overlay | Self::Content)
    }

    /// Activations from these origins bring the text chunk into view
    fn scrolls_content(self) -> bool {
        !matches!(self, Self::Content)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightCommand {
    Hover {
        origin: Origin,
        chunk_id: Option<ChunkId>,
    },
    Activate {
        origin: Origin,
        chunk_id: ChunkId,
    },
    Deactivate {
        origin: Origin,
    },
}

/// Work for the orchestrator to carry out on a surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HighlightEffect {
    OverlayHover(Option<ChunkId>),
    OverlayActive(Option<ChunkId>),
    ContentHover(Option<ChunkId>),
    ContentActive(Option<ChunkId>),
    ContentScroll(ChunkId),
    /// Rewrite the current history entry's `chunk` parameter
    ReplaceChunkInUrl(Option<ChunkId>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HighlightState {
    pub active: Option<ChunkId>,
    pub hovered: Option<ChunkId>,
}

impl HighlightState {
    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: HighlightCommand) -> Vec<HighlightEffect> {
        match cmd {
            HighlightCommand::Hover { origin, chunk_id } => {
                if self.hovered == chunk_id {
                    return vec![];
                }
                self.hovered = chunk_id.clone();
                let mut effects = Vec::with_capacity(2);
                if origin != Origin::Overlay {
                    effects.push(HighlightEffect::OverlayHover(chunk_id.clone()));
                }
                if origin != Origin::Content {
                    effects.push(HighlightEffect::ContentHover(chunk_id));
                }
                effects
            }

            HighlightCommand::Activate { origin, chunk_id } => {
                if self.active.as_ref() == Some(&chunk_id) {
                    // Re-opening the active chunk still brings it into view
                    return match origin {
                        Origin::Navigation | Origin::DeepLink => {
                            vec![HighlightEffect::ContentScroll(chunk_id)]
                        }
                        _ => vec![],
                    };
                }
                self.active = Some(chunk_id.clone());
                let mut effects = Vec::with_capacity(4);
                if origin != Origin::Overlay {
                    effects.push(HighlightEffect::OverlayActive(Some(chunk_id.clone())));
                }
                if origin != Origin::Content {
                    effects.push(HighlightEffect::ContentActive(Some(chunk_id.clone())));
                }
                if origin.scrolls_content() {
                    effects.push(HighlightEffect::ContentScroll(chunk_id.clone()));
                }
                if origin.syncs_url() {
                    effects.push(HighlightEffect::ReplaceChunkInUrl(Some(chunk_id)));
                }
                effects
            }

            HighlightCommand::Deactivate { origin } => {
                if self.active.take().is_none() {
                    return vec![];
                }
                let mut effects = Vec::with_capacity(3);
                if origin != Origin::Overlay {
                    effects.push(HighlightEffect::OverlayActive(None));
                }
                if origin != Origin::Content {
                    effects.push(HighlightEffect::ContentActive(None));
                }
                if origin.syncs_url() {
                    effects.push(HighlightEffect::ReplaceChunkInUrl(None));
                }
                effects
            }
        }
    }
}
