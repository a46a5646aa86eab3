use crate::config::TitleConfig;
use crate::rules::pattern_detection::{normalize_text, PatternLibrary};
use crate::types::{HeadingLevel, ScoredElement};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which link of the strategy chain produced the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStrategy {
    CombinedHeadings,
    SingleHeading,
    LargestFont,
    BoldText,
    FirstReasonableText,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub text: String,
    pub strategy: TitleStrategy,
}

/// Derives the document title from page-1 typography. Works on the scored
/// elements before merging, independent of the outline rules.
pub struct TitleExtractor<'a> {
    config: &'a TitleConfig,
    patterns: &'a PatternLibrary,
}

impl<'a> TitleExtractor<'a> {
    pub fn new(config: &'a TitleConfig, patterns: &'a PatternLibrary) -> Self {
        Self { config, patterns }
    }

    pub fn extract(&self, elements: &[ScoredElement]) -> TitleCandidate {
        let mut first_page: Vec<&ScoredElement> =
            elements.iter().filter(|e| e.page() == 1).collect();
        first_page.sort_by(|a, b| visual_order(a, b));

        let strategies: [(TitleStrategy, fn(&Self, &[&ScoredElement]) -> Option<String>); 5] = [
            (TitleStrategy::CombinedHeadings, Self::combined_headings),
            (TitleStrategy::SingleHeading, Self::single_heading),
            (TitleStrategy::LargestFont, Self::largest_font),
            (TitleStrategy::BoldText, Self::bold_text),
            (TitleStrategy::FirstReasonableText, Self::first_reasonable),
        ];

        for (strategy, run) in strategies {
            if let Some(text) = run(self, &first_page) {
                log::debug!("   🏷️  Title via {:?}: \"{}\"", strategy, text);
                return TitleCandidate { text, strategy };
            }
        }

        TitleCandidate {
            text: self.config.placeholder.clone(),
            strategy: TitleStrategy::Placeholder,
        }
    }

    /// Page-1 H1 candidates grouped into visual lines. Fragments on one line
    /// are joined left to right with a single space.
    fn h1_lines(&self, page: &[&ScoredElement]) -> Vec<String> {
        let mut lines: Vec<(f32, Vec<&ScoredElement>)> = Vec::new();
        for element in page.iter().copied().filter(|e| e.level == Some(HeadingLevel::H1)) {
            let y = element.element.position.y;
            let same_line = lines
                .last()
                .map(|(anchor_y, _)| (y - anchor_y).abs() <= self.config.same_line_tolerance)
                .unwrap_or(false);
            if same_line {
                if let Some((_, fragments)) = lines.last_mut() {
                    fragments.push(element);
                }
            } else {
                lines.push((y, vec![element]));
            }
        }

        lines
            .into_iter()
            .map(|(_, mut fragments)| {
                fragments.sort_by(|a, b| a.element.position.x.total_cmp(&b.element.position.x));
                let joined: Vec<&str> = fragments.iter().map(|e| e.text()).collect();
                clean_title(&joined.join(" "))
            })
            .collect()
    }

    /// Multi-line title rendered as several H1 lines
    fn combined_headings(&self, page: &[&ScoredElement]) -> Option<String> {
        let parts: Vec<String> = self
            .h1_lines(page)
            .into_iter()
            .take(self.config.combine_parts)
            .collect();

        if self.config.combine_parts < 2 || parts.len() < self.config.combine_parts {
            return None;
        }

        let acceptable = parts.iter().all(|part| {
            !part.is_empty()
                && !self.has_stop_word(part)
                && !self.patterns.is_numbered_section(part)
                && !self.patterns.is_boilerplate(part)
        });
        if !acceptable {
            return None;
        }

        let combined = parts.join("  ");
        (combined.chars().count() <= self.config.max_combined_chars).then_some(combined)
    }

    fn single_heading(&self, page: &[&ScoredElement]) -> Option<String> {
        self.h1_lines(page)
            .into_iter()
            .find(|text| self.is_good_title(text))
    }

    fn largest_font(&self, page: &[&ScoredElement]) -> Option<String> {
        let max_size = page
            .iter()
            .map(|e| e.element.font_size)
            .filter(|s| s.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);
        if !max_size.is_finite() {
            return None;
        }

        let floor = max_size * (1.0 - self.config.largest_font_tolerance);
        page.iter()
            .filter(|e| e.element.font_size >= floor)
            .map(|e| clean_title(e.text()))
            .find(|text| self.is_good_title(text))
    }

    fn bold_text(&self, page: &[&ScoredElement]) -> Option<String> {
        page.iter()
            .take(self.config.bold_scan_window)
            .filter(|e| e.element.is_bold)
            .map(|e| clean_title(e.text()))
            .find(|text| self.is_good_title(text))
    }

    fn first_reasonable(&self, page: &[&ScoredElement]) -> Option<String> {
        page.iter()
            .map(|e| clean_title(e.text()))
            .find(|text| self.is_reasonable(text))
    }

    fn has_stop_word(&self, text: &str) -> bool {
        let normalized = normalize_text(text);
        self.config
            .stop_words
            .iter()
            .any(|w| normalized.contains(&w.to_lowercase()))
    }

    fn is_reasonable(&self, text: &str) -> bool {
        let chars = text.chars().count();
        chars >= self.config.min_chars
            && chars <= self.config.max_chars
            && !self.patterns.is_boilerplate(text)
    }

    /// Length within bounds, no boilerplate, not a generic word and mostly
    /// alphabetic.
    pub fn is_good_title(&self, text: &str) -> bool {
        if !self.is_reasonable(text) {
            return false;
        }

        let lower = text.to_lowercase();
        let boilerplate_prefix = ["page", "www", "http", "the ", "this ", "that ", "it "]
            .iter()
            .any(|p| lower.starts_with(p));
        if boilerplate_prefix || text.contains('@') || is_path_like(text) {
            return false;
        }

        let normalized = normalize_text(text);
        if self
            .config
            .generic_words
            .iter()
            .any(|w| w.to_lowercase() == normalized)
        {
            return false;
        }

        let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let non_alpha = visible.iter().filter(|c| !c.is_alphabetic()).count();
        non_alpha * 2 <= visible.len()
    }
}

/// Top-to-bottom, then left-to-right
fn visual_order(a: &ScoredElement, b: &ScoredElement) -> Ordering {
    a.element
        .position
        .y
        .total_cmp(&b.element.position.y)
        .then(a.element.position.x.total_cmp(&b.element.position.x))
        .then(a.element.sequence_index.cmp(&b.element.sequence_index))
}

fn is_path_like(text: &str) -> bool {
    let lower = text.to_lowercase();
    let single_token = !text.contains(char::is_whitespace);
    (single_token && (text.contains('/') || text.contains('\\')))
        || [".pdf", ".doc", ".docx", ".txt", ".html"]
            .iter()
            .any(|ext| lower.ends_with(ext))
}

/// Collapse whitespace and drop trailing `.;,`
pub fn clean_title(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == '.' || c == ';' || c == ',' || c.is_whitespace())
        .to_string()
}
