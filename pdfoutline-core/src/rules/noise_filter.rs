use super::engine::ParseRule;
use super::pattern_detection::{match_keyword, normalize_text, NoiseKind, PatternLibrary};
use crate::config::{KeywordConfig, NoiseFilterConfig};
use crate::error::Result;
use crate::types::*;
use std::collections::{BTreeMap, BTreeSet};

/// Per-document bookkeeping for the noise filter. Built fresh for every
/// document and passed explicitly, so concurrent documents never share it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeduplicationState {
    /// Occurrences of each normalized text across the document
    pub text_counts: BTreeMap<String, usize>,
    /// Headings already emitted, keyed by (normalized text, page)
    pub seen: BTreeSet<(String, u32)>,
}

impl DeduplicationState {
    pub fn from_elements(elements: &[ScoredElement]) -> Self {
        let mut text_counts = BTreeMap::new();
        for element in elements {
            *text_counts.entry(normalize_text(element.text())).or_insert(0) += 1;
        }
        Self {
            text_counts,
            seen: BTreeSet::new(),
        }
    }

    pub fn count(&self, normalized: &str) -> usize {
        self.text_counts.get(normalized).copied().unwrap_or(0)
    }

    /// Records the key; false when it was already seen
    pub fn first_sighting(&mut self, normalized: String, page: u32) -> bool {
        self.seen.insert((normalized, page))
    }
}

// NoiseFilterRule - drops running headers/footers and boilerplate, collapses same-page duplicates
pub struct NoiseFilterRule<'a> {
    config: &'a NoiseFilterConfig,
    keywords: &'a KeywordConfig,
    patterns: &'a PatternLibrary,
}

impl<'a> NoiseFilterRule<'a> {
    pub fn new(
        config: &'a NoiseFilterConfig,
        keywords: &'a KeywordConfig,
        patterns: &'a PatternLibrary,
    ) -> Self {
        Self {
            config,
            keywords,
            patterns,
        }
    }

    /// Frequency pass, structural-exclusion pass, then deduplication of
    /// headings on `(normalized_text, page)`; first occurrence wins.
    pub fn filter(
        &self,
        elements: Vec<ScoredElement>,
        state: &mut DeduplicationState,
    ) -> Vec<ScoredElement> {
        let mut dropped: BTreeMap<NoiseKind, usize> = BTreeMap::new();
        let mut duplicates = 0;

        let kept: Vec<ScoredElement> = elements
            .into_iter()
            .filter(|element| {
                let normalized = normalize_text(element.text());

                if let Some(kind) = self.classify_noise(element.text(), &normalized, state) {
                    *dropped.entry(kind).or_insert(0) += 1;
                    return false;
                }

                if element.is_heading() && !state.first_sighting(normalized, element.page()) {
                    duplicates += 1;
                    return false;
                }
                true
            })
            .collect();

        for (kind, count) in &dropped {
            log::debug!("   🧹 Dropped {} elements as {:?}", count, kind);
        }
        if duplicates > 0 {
            log::debug!("   🧹 Dropped {} duplicate headings", duplicates);
        }

        kept
    }

    pub fn classify_noise(
        &self,
        text: &str,
        normalized: &str,
        state: &DeduplicationState,
    ) -> Option<NoiseKind> {
        if state.count(normalized) > self.config.repetition_threshold
            && !self.is_legitimately_repeated(text)
        {
            return Some(NoiseKind::Repeated);
        }
        self.patterns.structural_noise(text, self.config.min_chars)
    }

    /// Numbered sections and structural keywords recur through the TOC
    fn is_legitimately_repeated(&self, text: &str) -> bool {
        self.patterns.is_numbered_section(text) || match_keyword(text, self.keywords).is_some()
    }
}

impl<'a> ParseRule for NoiseFilterRule<'a> {
    fn apply(&self, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        let mut state = DeduplicationState::from_elements(&elements);
        let before = elements.len();
        let kept = self.filter(elements, &mut state);
        log::debug!("   ✅ Noise filter kept {} of {} elements", kept.len(), before);
        Ok(kept)
    }

    fn name(&self) -> &str {
        "NoiseFilter"
    }
}
