use crate::error::{OutlineError, Result};
use crate::types::{BoundingBox, HeadingLevel};
use serde::{Deserialize, Serialize};

/// Typography of the element being classified, handed to the semantic model
/// alongside its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticContext {
    pub font_size: f32,
    pub avg_font_size: f32,
    pub is_bold: bool,
    pub position: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticPrediction {
    pub is_heading: bool,
    pub confidence: f32,
    /// "H1".."H3" (any case) or "body"
    pub level: String,
}

impl SemanticPrediction {
    pub fn body(confidence: f32) -> Self {
        Self {
            is_heading: false,
            confidence,
            level: "body".to_string(),
        }
    }

    /// Predicted level, only when the model says heading
    pub fn heading_level(&self) -> Option<HeadingLevel> {
        if self.is_heading {
            HeadingLevel::parse(&self.level)
        } else {
            None
        }
    }
}

/// Optional secondary signal for uncertain elements.
///
/// Implementations are loaded once and shared read-only between documents,
/// hence `Send + Sync`. The heading scorer checks `is_available` before every
/// call and treats any `Err` as "no opinion".
pub trait SemanticClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn classify(&self, text: &str, context: Option<&SemanticContext>) -> Result<SemanticPrediction>;

    fn batch_classify(
        &self,
        items: &[(String, Option<SemanticContext>)],
    ) -> Vec<Result<SemanticPrediction>> {
        items
            .iter()
            .map(|(text, context)| self.classify(text, context.as_ref()))
            .collect()
    }
}

/// Stand-in used when no model is configured. Never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSemanticClassifier;

impl SemanticClassifier for DisabledSemanticClassifier {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn classify(&self, _text: &str, _context: Option<&SemanticContext>) -> Result<SemanticPrediction> {
        Err(OutlineError::Semantic(
            "no semantic classifier is loaded".to_string(),
        ))
    }
}
