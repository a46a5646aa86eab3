use super::engine::ParseRule;
use crate::config::HierarchyConfig;
use crate::error::Result;
use crate::types::*;

// HierarchyCorrectionRule - keeps heading depth from skipping levels
pub struct HierarchyCorrectionRule<'a> {
    config: &'a HierarchyConfig,
}

impl<'a> HierarchyCorrectionRule<'a> {
    pub fn new(config: &'a HierarchyConfig) -> Self {
        Self { config }
    }

    /// Re-level every heading in document order. Body elements pass through.
    pub fn correct(&self, elements: Vec<ScoredElement>) -> Vec<ScoredElement> {
        let mut context = HierarchyContext::new();
        let mut corrections = 0;

        let corrected = elements
            .into_iter()
            .map(|mut element| {
                if let Some(level) = element.level {
                    let new_level = context.next_level(level);
                    if new_level != level {
                        log::debug!(
                            "   📐 \"{}\" (page {}): {} -> {}",
                            element.text(),
                            element.page(),
                            level,
                            new_level
                        );
                        element.level = Some(new_level);
                        element.confidence =
                            (element.confidence * self.config.demotion_penalty).clamp(0.0, 1.0);
                        element.reasons.insert(SignalTag::HierarchyDemoted);
                        corrections += 1;
                    }
                }
                element
            })
            .collect();

        if corrections > 0 {
            log::debug!("   ✅ Hierarchy correction re-leveled {} headings", corrections);
        }
        corrected
    }
}

impl<'a> ParseRule for HierarchyCorrectionRule<'a> {
    fn apply(&self, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        Ok(self.correct(elements))
    }

    fn name(&self) -> &str {
        "HierarchyCorrection"
    }
}

/// Tracks the most recent heading depth while walking a document.
#[derive(Debug, Clone, Default)]
pub struct HierarchyContext {
    /// 0 until the first heading is seen
    last_level: u8,
}

impl HierarchyContext {
    pub fn new() -> Self {
        Self { last_level: 0 }
    }

    /// Clamp `level` to at most one deeper than the previous heading and
    /// remember the result.
    pub fn next_level(&mut self, level: HeadingLevel) -> HeadingLevel {
        let allowed = self.last_level + 1;
        let depth = level.depth().min(allowed);
        let corrected = HeadingLevel::from_depth(depth).unwrap_or(HeadingLevel::H1);
        self.last_level = corrected.depth();
        corrected
    }

    pub fn last_level(&self) -> u8 {
        self.last_level
    }
}
