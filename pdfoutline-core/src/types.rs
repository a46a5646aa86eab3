use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ===== EXTRACTOR INPUT =====
// Raw spans come from the external text-extraction collaborator and are
// grouped into TextElements by the normalizer.

/// One styled run of text as produced by the PDF text extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawSpan {
    pub text: String,
    /// Zero-based page index
    pub page_index: u32,
    /// [x0, y0, x1, y1], top-left origin
    pub bbox: [f32; 4],
    #[serde(default)]
    pub font: String,
    pub size: f32,
    /// Style flag bitmask (bold / italic bits are configurable)
    #[serde(default)]
    pub flags: u32,
    /// Line identifier when the extractor exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl RawSpan {
    pub fn width(&self) -> f32 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn height(&self) -> f32 {
        self.bbox[3] - self.bbox[1]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest box that encloses both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());

        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// One normalized visual line with its dominant typography.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextElement {
    pub text: String,
    /// 1-indexed page number
    pub page: u32,
    pub font_size: f32,
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    pub font_name: String,
    pub position: BoundingBox,
    /// Reading order within the page
    pub sequence_index: u32,
}

impl TextElement {
    pub fn new(text: &str, page: u32, font_size: f32, is_bold: bool) -> Self {
        Self {
            text: text.trim().to_string(),
            page,
            font_size,
            is_bold,
            is_italic: false,
            font_name: String::new(),
            position: BoundingBox::default(),
            sequence_index: 0,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.position = BoundingBox::new(x, y, width, height);
        self
    }

    pub fn with_sequence(mut self, sequence_index: u32) -> Self {
        self.sequence_index = sequence_index;
        self
    }

    pub fn with_font_name(mut self, font_name: &str) -> Self {
        self.font_name = font_name.to_string();
        self
    }
}

// ===== CLASSIFICATION =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Numeric depth, H1 = 1
    pub fn depth(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    /// Depths past 3 clamp to H3; 0 is not a level.
    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            0 => None,
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            _ => Some(HeadingLevel::H3),
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "h1" | "title" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            _ => None,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.depth())
    }
}

/// Signals that contributed to a classification decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalTag {
    LargeFont,
    MediumFont,
    AboveBodyFont,
    Bold,
    NumberedPattern,
    StructuralKeyword,
    LeftAligned,
    HeadlineLength,
    TitleCase,
    WordCount,
    OutOfRangeLength,
    LongSentence,
    SentenceStarter,
    SentencePunctuation,
    NarrativeVerb,
    Boilerplate,
    ShortText,
    Semantic,
    Merged,
    HierarchyDemoted,
}

/// A TextElement after scoring. Elements with a `level` are heading candidates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredElement {
    pub element: TextElement,
    pub level: Option<HeadingLevel>,
    /// Clamped heading likelihood in [0, 1]
    pub score: f32,
    /// Confidence of the assigned class: `score` for headings, `1 - score` for body
    pub confidence: f32,
    pub reasons: BTreeSet<SignalTag>,
}

/// Alias that reads better in stages that only ever see accepted headings.
pub type HeadingCandidate = ScoredElement;

impl ScoredElement {
    pub fn body(element: TextElement, score: f32) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            element,
            level: None,
            score,
            confidence: 1.0 - score,
            reasons: BTreeSet::new(),
        }
    }

    pub fn heading(element: TextElement, level: HeadingLevel, confidence: f32) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            element,
            level: Some(level),
            score: confidence,
            confidence,
            reasons: BTreeSet::new(),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.level.is_some()
    }

    pub fn text(&self) -> &str {
        &self.element.text
    }

    pub fn page(&self) -> u32 {
        self.element.page
    }
}

// ===== OUTPUT ARTIFACT =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

pub type Outline = Vec<OutlineEntry>;

/// The engine's externally visible result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Document {
    pub title: String,
    pub outline: Outline,
}

impl Document {
    /// `{title: "", outline: []}`, reported for unreadable or empty input
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.outline.is_empty()
    }
}
