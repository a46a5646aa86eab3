use super::font_statistics::FontProfile;
use super::pattern_detection::{
    ends_with_sentence_punctuation, is_all_caps, is_title_case, match_keyword,
    starts_with_sentence_starter, PatternLibrary,
};
use crate::classifier::{SemanticClassifier, SemanticContext};
use crate::config::{KeywordConfig, ScoringConfig};
use crate::types::{HeadingLevel, ScoredElement, SignalTag, TextElement};
use std::collections::BTreeSet;

/// Raw heuristic evaluation of one element before the acceptance decision.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBreakdown {
    pub score: f32,
    pub level: Option<HeadingLevel>,
    pub reasons: BTreeSet<SignalTag>,
}

/// Single parameterized scorer. All signals are additive, so raising the
/// font size never lowers the heuristic score.
pub struct HeadingScorer<'a> {
    scoring: &'a ScoringConfig,
    keywords: &'a KeywordConfig,
    patterns: &'a PatternLibrary,
    profile: &'a FontProfile,
    semantic: Option<&'a dyn SemanticClassifier>,
}

impl<'a> HeadingScorer<'a> {
    pub fn new(
        scoring: &'a ScoringConfig,
        keywords: &'a KeywordConfig,
        patterns: &'a PatternLibrary,
        profile: &'a FontProfile,
    ) -> Self {
        Self {
            scoring,
            keywords,
            patterns,
            profile,
            semantic: None,
        }
    }

    pub fn with_semantic(mut self, semantic: Option<&'a dyn SemanticClassifier>) -> Self {
        self.semantic = semantic.filter(|s| s.is_available());
        self
    }

    pub fn score_all(&self, elements: &[TextElement]) -> Vec<ScoredElement> {
        let scored: Vec<ScoredElement> = elements.iter().map(|e| self.score(e)).collect();
        log::debug!(
            "   📊 Scored {} elements, {} heading candidates",
            scored.len(),
            scored.iter().filter(|s| s.is_heading()).count()
        );
        scored
    }

    pub fn score(&self, element: &TextElement) -> ScoredElement {
        let mut signals = self.evaluate(element);

        if let Some(semantic) = self.semantic {
            if signals.score < self.scoring.semantic_ceiling {
                self.blend_semantic(semantic, element, &mut signals);
            }
        }

        self.decide(element.clone(), signals)
    }

    /// Sum of the weighted heuristic signals, clamped to [0, 1].
    pub fn evaluate(&self, element: &TextElement) -> SignalBreakdown {
        let w = &self.scoring.weights;
        let text = element.text.trim();
        let char_count = text.chars().count();
        let word_count = text.split_whitespace().count();

        let mut score = 0.0_f32;
        let mut level: Option<HeadingLevel> = None;
        let mut reasons = BTreeSet::new();

        // Size: only the highest crossed threshold contributes
        match self.profile.level_for_size(element.font_size) {
            Some(HeadingLevel::H1) => {
                score += w.size_h1;
                level = Some(HeadingLevel::H1);
                reasons.insert(SignalTag::LargeFont);
            }
            Some(HeadingLevel::H2) => {
                score += w.size_h2;
                level = Some(HeadingLevel::H2);
                reasons.insert(SignalTag::MediumFont);
            }
            Some(HeadingLevel::H3) => {
                score += w.size_h3;
                level = Some(HeadingLevel::H3);
                reasons.insert(SignalTag::AboveBodyFont);
            }
            None => {}
        }

        if element.is_bold {
            score += w.bold;
            reasons.insert(SignalTag::Bold);
            if level.is_none() && element.font_size >= self.profile.body_size {
                level = Some(HeadingLevel::H3);
            }
        }

        let family = self.patterns.match_section(text);
        if let Some(family) = family {
            score += family.weight(&self.scoring.patterns);
            level = Some(family.level());
            reasons.insert(SignalTag::NumberedPattern);
        }

        if let Some(keyword) = match_keyword(text, self.keywords) {
            score += if keyword.exact {
                w.keyword_exact
            } else {
                w.keyword_partial
            };
            if family.is_none() {
                level = Some(keyword.level);
            }
            reasons.insert(SignalTag::StructuralKeyword);
        }

        let x = element.position.x;
        if x < self.scoring.near_margin {
            score += w.near_margin;
            reasons.insert(SignalTag::LeftAligned);
        } else if x < self.scoring.mid_margin {
            score += w.mid_margin;
            reasons.insert(SignalTag::LeftAligned);
        }

        match char_count {
            5..=50 => {
                score += w.headline_length;
                reasons.insert(SignalTag::HeadlineLength);
            }
            51..=80 => {
                score += w.acceptable_length;
                reasons.insert(SignalTag::HeadlineLength);
            }
            0..=2 => {
                score -= w.very_short_penalty;
                reasons.insert(SignalTag::OutOfRangeLength);
            }
            n if n > 150 => {
                score -= w.very_long_penalty;
                reasons.insert(SignalTag::OutOfRangeLength);
            }
            _ => {}
        }

        if char_count <= 80 && (is_title_case(text) || is_all_caps(text)) {
            score += w.title_case;
            reasons.insert(SignalTag::TitleCase);
        }

        if word_count >= self.scoring.min_words && word_count <= self.scoring.bonus_max_words {
            score += w.word_count_bonus;
            reasons.insert(SignalTag::WordCount);
        } else if word_count > self.scoring.max_words {
            score -= w.word_count_penalty;
            reasons.insert(SignalTag::LongSentence);
        }

        // Negative cues
        if starts_with_sentence_starter(text) {
            score -= w.sentence_starter_penalty;
            reasons.insert(SignalTag::SentenceStarter);
        }
        if ends_with_sentence_punctuation(text) {
            score -= w.sentence_punctuation_penalty;
            reasons.insert(SignalTag::SentencePunctuation);
        }
        if self.patterns.has_narrative_verb(text) {
            score -= w.narrative_penalty;
            reasons.insert(SignalTag::NarrativeVerb);
        }
        if self.patterns.is_boilerplate(text) {
            score -= w.boilerplate_penalty;
            reasons.insert(SignalTag::Boilerplate);
        }

        SignalBreakdown {
            score: score.clamp(0.0, 1.0),
            level,
            reasons,
        }
    }

    fn blend_semantic(
        &self,
        semantic: &dyn SemanticClassifier,
        element: &TextElement,
        signals: &mut SignalBreakdown,
    ) {
        let context = SemanticContext {
            font_size: element.font_size,
            avg_font_size: self.profile.mean_size,
            is_bold: element.is_bold,
            position: element.position,
        };

        match semantic.classify(&element.text, Some(&context)) {
            Ok(prediction) => {
                let confidence = prediction.confidence.clamp(0.0, 1.0);
                if confidence > signals.score {
                    let weight = self.scoring.semantic_weight;
                    signals.score =
                        (weight * confidence + (1.0 - weight) * signals.score).clamp(0.0, 1.0);
                    signals.level = if prediction.is_heading {
                        prediction
                            .heading_level()
                            .or(signals.level)
                            .or(Some(HeadingLevel::H3))
                    } else {
                        None
                    };
                    signals.reasons.insert(SignalTag::Semantic);
                }
            }
            Err(e) => {
                log::warn!(
                    "⚠️  Semantic classifier '{}' failed on \"{}\": {}, keeping heuristic result",
                    semantic.name(),
                    element.text,
                    e
                );
            }
        }
    }

    /// Accept as heading when a level was assigned and the score clears the
    /// floor; very short texts need the higher short-text confidence.
    fn decide(&self, element: TextElement, signals: SignalBreakdown) -> ScoredElement {
        let SignalBreakdown {
            score,
            level,
            mut reasons,
        } = signals;

        let char_count = element.text.chars().count();
        let accepted = level.filter(|_| score >= self.scoring.acceptance_threshold);

        let mut scored = match accepted {
            Some(_)
                if char_count < self.scoring.short_text_chars
                    && score < self.scoring.short_text_min_confidence =>
            {
                reasons.insert(SignalTag::ShortText);
                ScoredElement::body(element, score)
            }
            Some(level) => ScoredElement::heading(element, level, score),
            None => ScoredElement::body(element, score),
        };
        scored.reasons = reasons;
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SemanticPrediction;
    use crate::config::OutlineConfig;
    use crate::error::{OutlineError, Result};

    fn profile() -> FontProfile {
        FontProfile {
            body_size: 10.0,
            mean_size: 10.5,
            min_size: 8.0,
            max_size: 18.0,
            percentile_75: 10.0,
            percentile_90: 12.0,
            percentile_95: 16.0,
            h1_threshold: 16.0,
            h2_threshold: 12.5,
            h3_threshold: 11.0,
            sample_count: 40,
        }
    }

    fn element(text: &str, size: f32, bold: bool, x: f32) -> TextElement {
        TextElement::new(text, 1, size, bold).with_position(x, 100.0, 200.0, size)
    }

    struct FixedSemantic(SemanticPrediction);

    impl SemanticClassifier for FixedSemantic {
        fn name(&self) -> &str {
            "fixed"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn classify(&self, _: &str, _: Option<&SemanticContext>) -> Result<SemanticPrediction> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSemantic;

    impl SemanticClassifier for BrokenSemantic {
        fn name(&self) -> &str {
            "broken"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn classify(&self, _: &str, _: Option<&SemanticContext>) -> Result<SemanticPrediction> {
            Err(OutlineError::Semantic("model file missing".to_string()))
        }
    }

    #[test]
    fn numbered_bold_large_line_is_h1() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        let scored = scorer.score(&element("1. Introduction", 16.0, true, 72.0));
        assert_eq!(scored.level, Some(HeadingLevel::H1));
        assert_eq!(scored.confidence, 1.0);
        assert!(scored.reasons.contains(&SignalTag::NumberedPattern));
        assert!(scored.reasons.contains(&SignalTag::LargeFont));
    }

    #[test]
    fn pattern_overrides_size_level() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        // H1-sized but numbered as a subsection
        let scored = scorer.score(&element("2.3 Sampling Method", 18.0, true, 72.0));
        assert_eq!(scored.level, Some(HeadingLevel::H2));
    }

    #[test]
    fn sentence_like_body_text_is_rejected() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        let scored = scorer.score(&element(
            "The committee reviewed the results of the survey.",
            10.0,
            false,
            72.0,
        ));
        assert!(!scored.is_heading());
        assert!(scored.reasons.contains(&SignalTag::SentenceStarter));
        assert!((scored.confidence - (1.0 - scored.score)).abs() < 1e-6);
    }

    #[test]
    fn short_low_confidence_heading_is_demoted() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        // 11pt bold "Q&A": H3 size + bold + margin, but only 3 chars
        let scored = scorer.score(&element("Q&A", 11.0, true, 200.0));
        assert!(!scored.is_heading());
        assert!(scored.reasons.contains(&SignalTag::ShortText));
    }

    #[test]
    fn bold_body_sized_text_defaults_to_h3() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        let scored = scorer.score(&element("Project Milestones", 10.0, true, 40.0));
        assert_eq!(scored.level, Some(HeadingLevel::H3));
    }

    #[test]
    fn score_is_monotone_in_font_size() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);

        let mut previous = 0.0;
        for tenth in 60..240 {
            let size = tenth as f32 / 10.0;
            let score = scorer.evaluate(&element("Market Overview", size, false, 120.0)).score;
            assert!(score >= previous, "score dropped at {size}pt");
            previous = score;
        }
    }

    #[test]
    fn semantic_blend_applies_only_when_more_confident() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let semantic = FixedSemantic(SemanticPrediction {
            is_heading: true,
            confidence: 0.9,
            level: "H2".to_string(),
        });
        let scorer = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile)
            .with_semantic(Some(&semantic as &dyn SemanticClassifier));

        let el = element("market overview", 10.0, false, 300.0);
        let heuristic = scorer.evaluate(&el).score;
        assert!(heuristic < 0.7);

        let scored = scorer.score(&el);
        let expected = 0.6 * 0.9 + 0.4 * heuristic;
        assert!((scored.score - expected).abs() < 1e-5);
        assert_eq!(scored.level, Some(HeadingLevel::H2));
        assert!(scored.reasons.contains(&SignalTag::Semantic));
    }

    #[test]
    fn semantic_failure_falls_back_to_heuristics() {
        let config = OutlineConfig::default();
        let patterns = PatternLibrary::new().unwrap();
        let profile = profile();
        let plain = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile);
        let broken = BrokenSemantic;
        let with_broken = HeadingScorer::new(&config.scoring, &config.keywords, &patterns, &profile)
            .with_semantic(Some(&broken as &dyn SemanticClassifier));

        let el = element("Budget Notes", 10.0, false, 300.0);
        assert_eq!(plain.score(&el), with_broken.score(&el));
    }
}
