//! Core data model shared by the overlay, content, temporal and navigation layers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an addressable content chunk, unique per document
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChunkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of structurally significant region on a page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Title,
    SectionHeader,
    #[default]
    Text,
    ListItem,
    Table,
    Picture,
    Caption,
    Formula,
    Footnote,
    PageHeader,
    PageFooter,
    Code,
    #[serde(other)]
    Other,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::SectionHeader => "section_header",
            Self::Text => "text",
            Self::ListItem => "list_item",
            Self::Table => "table",
            Self::Picture => "picture",
            Self::Caption => "caption",
            Self::Formula => "formula",
            Self::Footnote => "footnote",
            Self::PageHeader => "page_header",
            Self::PageFooter => "page_footer",
            Self::Code => "code",
            Self::Other => "other",
        }
    }
}

/// Bounding box in source (document) space, bottom-left origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct BBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BBox {
    #[must_use]
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.bottom.is_finite()
            && self.right.is_finite()
            && self.top.is_finite()
    }

    /// Centre point in source space
    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) / 2.0,
            (self.bottom + self.top) / 2.0,
        )
    }
}

/// Width/height pair, used both for source space and for the rendered surface
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both extents finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Size of the currently rendered page surface
pub type DisplayedDimensions = Dimensions;

/// A structurally significant page region
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureElement {
    pub chunk_id: ChunkId,
    pub element_type: ElementType,
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Structure of one page as delivered by the structure fetch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    pub page_number: usize,
    pub source_dimensions: Dimensions,
    #[serde(default)]
    pub elements: Vec<StructureElement>,
}

impl PageStructure {
    pub fn element(&self, chunk_id: &ChunkId) -> Option<&StructureElement> {
        self.elements.iter().find(|e| &e.chunk_id == chunk_id)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Rectangle in display pixels, top-left origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Default)]
pub struct ScaledBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScaledBox {
    pub const EMPTY: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A time-ranged unit of transcript text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub chunk_id: ChunkId,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl TranscriptChunk {
    /// Half-open containment: `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Result of a chunk lookup: where a chunk lives in the document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkLocation {
    pub chunk_id: ChunkId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    #[serde(default)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_unknown_values_map_to_other() {
        let parsed: ElementType = serde_json::from_str("\"checkbox\"").unwrap();
        assert_eq!(parsed, ElementType::Other);

        let parsed: ElementType = serde_json::from_str("\"section_header\"").unwrap();
        assert_eq!(parsed, ElementType::SectionHeader);
    }

    #[test]
    fn page_structure_parses_wire_shape() {
        let json = r#"{
            "page_number": 2,
            "source_dimensions": {"width": 612.0, "height": 792.0},
            "elements": [
                {"chunk_id": "c-1", "element_type": "table",
                 "bbox": {"left": 10.0, "bottom": 20.0, "right": 110.0, "top": 80.0}}
            ]
        }"#;
        let page: PageStructure = serde_json::from_str(json).unwrap();
        assert_eq!(page.page_number, 2);
        assert_eq!(page.elements.len(), 1);
        assert_eq!(page.elements[0].confidence, None);
        assert!(page.element(&ChunkId::from("c-1")).is_some());
    }

    #[test]
    fn transcript_chunk_is_half_open() {
        let chunk = TranscriptChunk {
            chunk_id: "a".into(),
            start_time: 1.0,
            end_time: 2.0,
            text: String::new(),
        };
        assert!(chunk.contains(1.0));
        assert!(chunk.contains(1.999));
        assert!(!chunk.contains(2.0));
    }

    #[test]
    fn dimensions_validity() {
        assert!(Dimensions::new(1.0, 1.0).is_valid());
        assert!(!Dimensions::new(0.0, 1.0).is_valid());
        assert!(!Dimensions::new(1.0, -3.0).is_valid());
        assert!(!Dimensions::new(f64::NAN, 1.0).is_valid());
    }
}
