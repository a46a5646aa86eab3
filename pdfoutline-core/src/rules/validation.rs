use super::engine::ParseRule;
use super::pattern_detection::normalize_text;
use crate::error::Result;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;

// ValidationRule - structural checks over the heading sequence, never alters it
pub struct ValidationRule {
    min_chars: usize,
    max_chars: usize,
    report: RefCell<Option<ValidationReport>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub quality_score: f32,
    /// Number of headings validated
    pub total_headings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationIssue {
    HierarchyJump {
        from_level: HeadingLevel,
        to_level: HeadingLevel,
        from_pos: usize,
        to_pos: usize,
    },
    DuplicateOnPage {
        position: usize,
        page: u32,
        text: String,
    },
    SuspiciousHeading {
        position: usize,
        text: String,
        reason: String,
    },
    ReadingOrderInconsistency {
        position: usize,
        page: u32,
        sequence_index: u32,
    },
    PageInconsistency {
        position: usize,
        page: u32,
        issue: String,
    },
}

impl ValidationRule {
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
            report: RefCell::new(None),
        }
    }

    /// Report from the most recent `apply`
    pub fn take_report(&self) -> Option<ValidationReport> {
        self.report.borrow_mut().take()
    }

    pub fn validate(&self, elements: &[ScoredElement]) -> ValidationReport {
        let headings: Vec<&ScoredElement> = elements.iter().filter(|e| e.is_heading()).collect();
        let mut issues = Vec::new();

        self.validate_hierarchy(&headings, &mut issues);
        self.validate_duplicates(&headings, &mut issues);
        self.validate_reading_order(&headings, &mut issues);
        self.validate_pages(&headings, &mut issues);
        self.validate_heading_text(&headings, &mut issues);

        let total_headings = headings.len();
        let quality_score = if total_headings == 0 {
            1.0
        } else {
            (1.0 - (issues.len() as f32 / total_headings as f32)).max(0.0)
        };

        ValidationReport {
            issues,
            quality_score,
            total_headings,
        }
    }

    fn validate_hierarchy(&self, headings: &[&ScoredElement], issues: &mut Vec<ValidationIssue>) {
        for (i, pair) in headings.windows(2).enumerate() {
            if let (Some(prev), Some(curr)) = (pair[0].level, pair[1].level) {
                if curr.depth() > prev.depth() + 1 {
                    issues.push(ValidationIssue::HierarchyJump {
                        from_level: prev,
                        to_level: curr,
                        from_pos: i,
                        to_pos: i + 1,
                    });
                }
            }
        }
    }

    fn validate_duplicates(&self, headings: &[&ScoredElement], issues: &mut Vec<ValidationIssue>) {
        let mut seen = BTreeSet::new();
        for (i, heading) in headings.iter().enumerate() {
            if !seen.insert((normalize_text(heading.text()), heading.page())) {
                issues.push(ValidationIssue::DuplicateOnPage {
                    position: i,
                    page: heading.page(),
                    text: heading.text().to_string(),
                });
            }
        }
    }

    fn validate_reading_order(
        &self,
        headings: &[&ScoredElement],
        issues: &mut Vec<ValidationIssue>,
    ) {
        for (i, pair) in headings.windows(2).enumerate() {
            let prev = (pair[0].page(), pair[0].element.sequence_index);
            let curr = (pair[1].page(), pair[1].element.sequence_index);
            if curr < prev {
                issues.push(ValidationIssue::ReadingOrderInconsistency {
                    position: i + 1,
                    page: curr.0,
                    sequence_index: curr.1,
                });
            }
        }
    }

    fn validate_pages(&self, headings: &[&ScoredElement], issues: &mut Vec<ValidationIssue>) {
        for (i, heading) in headings.iter().enumerate() {
            if heading.page() == 0 {
                issues.push(ValidationIssue::PageInconsistency {
                    position: i,
                    page: 0,
                    issue: "Page number is 0 (should start from 1)".to_string(),
                });
            }
        }
    }

    fn validate_heading_text(&self, headings: &[&ScoredElement], issues: &mut Vec<ValidationIssue>) {
        for (i, heading) in headings.iter().enumerate() {
            let text = heading.text().trim();
            let chars = text.chars().count();

            if chars < self.min_chars {
                issues.push(ValidationIssue::SuspiciousHeading {
                    position: i,
                    text: text.to_string(),
                    reason: format!("Heading text too short (< {} characters)", self.min_chars),
                });
            }

            if chars > self.max_chars {
                issues.push(ValidationIssue::SuspiciousHeading {
                    position: i,
                    text: text.chars().take(50).collect::<String>() + "...",
                    reason: format!(
                        "Heading text unusually long (> {} characters)",
                        self.max_chars
                    ),
                });
            }
        }
    }

    fn log_validation_report(&self, report: &ValidationReport) {
        log::debug!("   📊 Validation Report:");
        log::debug!("      📈 Quality Score: {:.2}/1.00", report.quality_score);
        log::debug!("      🔍 Issues Found: {}", report.issues.len());

        if report.issues.is_empty() {
            log::debug!("      ✅ No structural issues detected!");
            return;
        }

        for issue in &report.issues {
            match issue {
                ValidationIssue::HierarchyJump {
                    from_level,
                    to_level,
                    from_pos,
                    to_pos,
                } => {
                    log::warn!(
                        "📊 Hierarchy jump: {} → {} (headings {}-{})",
                        from_level,
                        to_level,
                        from_pos,
                        to_pos
                    );
                }
                ValidationIssue::DuplicateOnPage {
                    position,
                    page,
                    text,
                } => {
                    log::warn!(
                        "♊ Duplicate heading at {} on page {}: \"{}\"",
                        position,
                        page,
                        text
                    );
                }
                ValidationIssue::SuspiciousHeading {
                    position,
                    text,
                    reason,
                } => {
                    log::debug!(
                        "         🤔 Suspicious heading at {}: \"{}\" ({})",
                        position,
                        text,
                        reason
                    );
                }
                ValidationIssue::ReadingOrderInconsistency {
                    position,
                    page,
                    sequence_index,
                } => {
                    log::warn!(
                        "📖 Reading order issue at {}: page {} index {} comes after a later element",
                        position,
                        page,
                        sequence_index
                    );
                }
                ValidationIssue::PageInconsistency {
                    position,
                    page,
                    issue,
                } => {
                    log::warn!("📄 Page issue at {} (page {}): {}", position, page, issue);
                }
            }
        }
    }
}

impl ParseRule for ValidationRule {
    fn apply(&self, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        let report = self.validate(&elements);
        self.log_validation_report(&report);
        *self.report.borrow_mut() = Some(report);
        Ok(elements)
    }

    fn name(&self) -> &str {
        "Validation"
    }
}
