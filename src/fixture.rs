//! JSON document fixtures for the replay tool and tests

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::temporal::Cue;
use crate::types::{ChunkLocation, PageStructure};

/// Everything the backend knows about one document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentFixture {
    pub document_id: String,
    pub total_pages: usize,
    #[serde(default)]
    pub pages: Vec<PageStructure>,
    #[serde(default)]
    pub chunks: Vec<ChunkLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cues: Option<Vec<Cue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
}

impl DocumentFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Self = serde_json::from_str(json).context("Failed to parse fixture JSON")?;
        fixture.validate()?;
        Ok(fixture)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid fixture {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.total_pages == 0 {
            bail!("document {} has no pages", self.document_id);
        }
        if let Some(page) = self
            .pages
            .iter()
            .find(|p| p.page_number == 0 || p.page_number > self.total_pages)
        {
            bail!(
                "structure for page {} is outside 1..={}",
                page.page_number,
                self.total_pages
            );
        }
        Ok(())
    }

    pub fn page(&self, page: usize) -> Option<&PageStructure> {
        self.pages.iter().find(|p| p.page_number == page)
    }

    pub fn chunk(&self, chunk_id: &str) -> Option<&ChunkLocation> {
        self.chunks.iter().find(|c| c.chunk_id.as_str() == chunk_id)
    }
}
