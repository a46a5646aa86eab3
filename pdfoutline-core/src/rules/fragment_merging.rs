use super::engine::ParseRule;
use crate::config::FragmentMergeConfig;
use crate::error::Result;
use crate::types::*;

// FragmentMergingRule - rejoins headings the extractor split into several runs on one line
pub struct FragmentMergingRule<'a> {
    config: &'a FragmentMergeConfig,
}

impl<'a> FragmentMergingRule<'a> {
    pub fn new(config: &'a FragmentMergeConfig) -> Self {
        Self { config }
    }
}

impl<'a> ParseRule for FragmentMergingRule<'a> {
    fn apply(&self, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        let input_count = elements.len();
        let mut merged_elements = Vec::with_capacity(input_count);
        let mut merges = 0;
        let mut iter = elements.into_iter().peekable();

        while let Some(mut current) = iter.next() {
            if current.is_heading() {
                // Adjacency is measured against the first fragment, not the growing union
                let anchor_y = current.element.position.y;
                let mut fragments = 1;

                while fragments < self.config.max_fragments {
                    let Some(next) =
                        iter.next_if(|next| self.is_continuation(&current, anchor_y, next))
                    else {
                        break;
                    };
                    log::debug!(
                        "   🧩 Merging \"{}\" + \"{}\" on page {}",
                        current.text(),
                        next.text(),
                        current.page()
                    );
                    self.absorb(&mut current, next);
                    fragments += 1;
                    merges += 1;
                }
            }
            merged_elements.push(current);
        }

        log::debug!(
            "   ✅ Fragment merging: {} merges, {} -> {} elements",
            merges,
            input_count,
            merged_elements.len()
        );
        Ok(merged_elements)
    }

    fn name(&self) -> &str {
        "FragmentMerging"
    }
}

impl<'a> FragmentMergingRule<'a> {
    fn is_continuation(&self, current: &ScoredElement, anchor_y: f32, next: &ScoredElement) -> bool {
        next.page() == current.page()
            && (next.element.position.y - anchor_y).abs() < self.config.vertical_tolerance
            && (next.is_heading()
                || next.text().chars().count() < self.config.continuation_max_chars)
    }

    /// Space-join the text, union the boxes, keep the strongest confidence.
    /// Page, sequence index and level stay those of the first fragment.
    fn absorb(&self, current: &mut ScoredElement, next: ScoredElement) {
        let joined = format!("{} {}", current.element.text, next.element.text);
        current.element.text = joined.trim().to_string();
        current.element.position = current.element.position.union(&next.element.position);
        current.element.font_size = current.element.font_size.max(next.element.font_size);
        current.score = current.score.max(next.score);
        current.confidence = current.confidence.max(next.confidence);
        current.reasons.extend(next.reasons);
        current.reasons.insert(SignalTag::Merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str, x: f32, y: f32, seq: u32, confidence: f32) -> ScoredElement {
        let el = TextElement::new(text, 1, 18.0, true)
            .with_position(x, y, 40.0, 18.0)
            .with_sequence(seq);
        ScoredElement::heading(el, HeadingLevel::H1, confidence)
    }

    fn body(text: &str, x: f32, y: f32, seq: u32) -> ScoredElement {
        let el = TextElement::new(text, 1, 10.0, false)
            .with_position(x, y, 300.0, 10.0)
            .with_sequence(seq);
        ScoredElement::body(el, 0.1)
    }

    #[test]
    fn split_heading_is_joined_with_space() {
        let config = FragmentMergeConfig::default();
        let rule = FragmentMergingRule::new(&config);
        let elements = vec![
            heading("Intro", 50.0, 100.0, 0, 0.8),
            heading("duction", 130.0, 100.0, 1, 0.9),
            body("The body follows here.", 50.0, 140.0, 2),
        ];

        let merged = rule.apply(elements).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text(), "Intro duction");
        assert_eq!(merged[0].confidence, 0.9);
        assert_eq!(merged[0].element.sequence_index, 0);
        assert_eq!(merged[0].element.position.x, 50.0);
        assert_eq!(merged[0].element.position.right(), 170.0);
        assert!(merged[0].reasons.contains(&SignalTag::Merged));
    }

    #[test]
    fn short_body_continuation_is_absorbed() {
        let config = FragmentMergeConfig::default();
        let rule = FragmentMergingRule::new(&config);
        let elements = vec![
            heading("Annual Financial", 50.0, 100.0, 0, 0.7),
            body("Statements", 250.0, 102.0, 1),
        ];
        let merged = rule.apply(elements).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text(), "Annual Financial Statements");
        assert_eq!(merged[0].level, Some(HeadingLevel::H1));
    }

    #[test]
    fn merge_is_capped_at_three_fragments() {
        let config = FragmentMergeConfig::default();
        let rule = FragmentMergingRule::new(&config);
        let elements = vec![
            heading("A1", 50.0, 100.0, 0, 0.8),
            heading("B2", 100.0, 100.0, 1, 0.8),
            heading("C3", 150.0, 100.0, 2, 0.8),
            heading("D4", 200.0, 100.0, 3, 0.8),
        ];
        let merged = rule.apply(elements).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text(), "A1 B2 C3");
        assert_eq!(merged[1].text(), "D4");
    }

    #[test]
    fn distant_or_long_elements_break_the_merge() {
        let config = FragmentMergeConfig::default();
        let rule = FragmentMergingRule::new(&config);
        let elements = vec![
            heading("Scope", 50.0, 100.0, 0, 0.8),
            body("a long paragraph line that is not a continuation", 250.0, 100.0, 1),
            heading("Next Heading", 50.0, 200.0, 2, 0.8),
            body("tail", 200.0, 240.0, 3),
        ];
        let merged = rule.apply(elements).unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0].text(), "Scope");
        assert_eq!(merged[2].text(), "Next Heading");
    }

    #[test]
    fn fragments_on_other_pages_are_not_merged() {
        let config = FragmentMergeConfig::default();
        let rule = FragmentMergingRule::new(&config);
        let mut second = heading("Overview", 50.0, 100.0, 0, 0.8);
        second.element.page = 2;
        let merged = rule
            .apply(vec![heading("Summary", 50.0, 100.0, 0, 0.8), second])
            .unwrap();
        assert_eq!(merged.len(), 2);
    }
}
