//! Synchronization engine for page images, their text content and
//! time-based transcripts.

pub mod backend;
pub mod content;
pub mod error;
pub mod fixture;
pub mod navigation;
pub mod overlay;
pub mod replay;
pub mod settings;
pub mod temporal;
pub mod timing;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use backend::{DocumentBackend, FixtureBackend};
pub use error::{FetchError, SyncError};
pub use navigation::{NavigationOrchestrator, SyncConfig, SyncSnapshot};
pub use replay::{ReplayOptions, ReplayReport, Step, replay};
