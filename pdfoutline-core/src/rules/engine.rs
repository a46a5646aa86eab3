use crate::classifier::SemanticClassifier;
use crate::config::{OutlineConfig, Preset};
use crate::error::Result;
use crate::types::*;
use regex::Regex;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use super::font_statistics::{FontProfile, FontStatisticsAnalyzer};
use super::fragment_merging::FragmentMergingRule;
use super::heading_scoring::HeadingScorer;
use super::hierarchy::HierarchyCorrectionRule;
use super::noise_filter::NoiseFilterRule;
use super::pattern_detection::PatternLibrary;
use super::validation::{ValidationReport, ValidationRule};

/// How one `--debug-filter` entry selects elements
#[derive(Debug, Clone)]
enum TraceMatcher {
    Pattern(Regex),
    /// Entries that are not valid regexes match as plain substrings
    Substring(String),
}

impl TraceMatcher {
    fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => TraceMatcher::Pattern(regex),
            Err(_) => TraceMatcher::Substring(pattern.to_string()),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            TraceMatcher::Pattern(regex) => regex.is_match(text),
            TraceMatcher::Substring(needle) => text.contains(needle.as_str()),
        }
    }
}

/// Element tracing between pipeline stages. Patterns are compiled once.
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    matchers: Vec<TraceMatcher>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        if !enabled {
            return Self::disabled();
        }
        Self {
            matchers: filter_patterns
                .iter()
                .map(|p| TraceMatcher::compile(p))
                .collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.matchers.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(text))
    }

    /// Log every element the filters select, as it leaves `stage`
    pub fn trace(&self, stage: &str, elements: &[ScoredElement]) {
        if !self.is_enabled() {
            return;
        }

        let traced: Vec<(usize, &ScoredElement)> = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| self.matches(e.text()))
            .collect();
        if traced.is_empty() {
            return;
        }

        log::info!("🔍 [{}] {} traced", stage, traced.len());
        for (position, element) in traced {
            log::info!(
                "  #{} p{}:{} {} \"{}\" score {:.2} conf {:.2} {:?}",
                position,
                element.page(),
                element.element.sequence_index,
                element.level.map_or("body".to_string(), |l| l.to_string()),
                preview(element.text(), 50),
                element.score,
                element.confidence,
                element.reasons
            );
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

// Sequential rule pipeline infrastructure
pub trait ParseRule {
    fn apply(&self, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>>;
    fn name(&self) -> &str;
}

/// Runs the classification pipeline for one document at a time: font
/// statistics, scoring, then the configured rule sequence.
pub struct RuleEngine {
    config: OutlineConfig,
    patterns: PatternLibrary,
    debug_config: DebugConfig,
    pub rule_timings: RefCell<Vec<(String, Duration)>>,
    last_validation: RefCell<Option<ValidationReport>>,
}

impl RuleEngine {
    pub fn new(config: OutlineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            patterns: PatternLibrary::new()?,
            debug_config: DebugConfig::disabled(),
            rule_timings: RefCell::new(Vec::new()),
            last_validation: RefCell::new(None),
        })
    }

    pub fn with_preset(preset: Preset) -> Result<Self> {
        Self::new(OutlineConfig::for_preset(preset))
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn load_custom_config(&mut self, config_path: &str) -> Result<()> {
        log::info!("📁 Loading custom config from: {config_path}");
        self.config = OutlineConfig::load_from_file(config_path)?;
        log::info!("✅ Custom config loaded successfully");
        Ok(())
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn analyze_font_sizes(&self, elements: &[TextElement]) -> FontProfile {
        FontStatisticsAnalyzer::new(&self.config.font_statistics).analyze(elements)
    }

    /// Base conversion: every TextElement becomes a ScoredElement
    pub fn score_elements(
        &self,
        elements: &[TextElement],
        profile: &FontProfile,
        semantic: Option<&dyn SemanticClassifier>,
    ) -> Vec<ScoredElement> {
        let scorer = HeadingScorer::new(
            &self.config.scoring,
            &self.config.keywords,
            &self.patterns,
            profile,
        )
        .with_semantic(semantic);

        let scored = scorer.score_all(elements);
        self.debug_config.trace("HeadingScoring", &scored);
        scored
    }

    pub fn apply_rules(&self, mut elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        log::debug!(
            "⚙️  Applying rule pipeline ({:?} preset) to {} elements",
            self.config.preset,
            elements.len()
        );

        // Clear previous timings
        self.rule_timings.borrow_mut().clear();
        self.last_validation.borrow_mut().take();

        for rule_config in &self.config.pipeline.rules {
            if !rule_config.enabled {
                log::debug!("   ⏭️  Skipping disabled rule: {}", rule_config.name);
                continue;
            }

            elements = self.apply_rule_by_name(&rule_config.name, elements)?;
            log::debug!(
                "   ✅ {} elements after {}",
                elements.len(),
                rule_config.name
            );
        }

        Ok(elements)
    }

    /// Run a single named rule; unknown names pass elements through.
    pub fn apply_rule_by_name(
        &self,
        rule_name: &str,
        elements: Vec<ScoredElement>,
    ) -> Result<Vec<ScoredElement>> {
        let rule_start = Instant::now();
        let result = match rule_name {
            "FragmentMerging" => {
                let rule = FragmentMergingRule::new(&self.config.merging);
                self.run_rule(&rule, elements)
            }
            "HierarchyCorrection" => {
                let rule = HierarchyCorrectionRule::new(&self.config.hierarchy);
                self.run_rule(&rule, elements)
            }
            "NoiseFilter" => {
                let rule = NoiseFilterRule::new(
                    &self.config.noise_filter,
                    &self.config.keywords,
                    &self.patterns,
                );
                self.run_rule(&rule, elements)
            }
            "Validation" => {
                let rule =
                    ValidationRule::new(self.config.title.min_chars, self.config.title.max_chars);
                let result = self.run_rule(&rule, elements);
                *self.last_validation.borrow_mut() = rule.take_report();
                result
            }
            _ => {
                log::warn!("⚠️  Unknown rule: {rule_name}. Skipping...");
                Ok(elements)
            }
        };

        self.rule_timings
            .borrow_mut()
            .push((rule_name.to_string(), rule_start.elapsed()));
        result
    }

    fn run_rule(&self, rule: &dyn ParseRule, elements: Vec<ScoredElement>) -> Result<Vec<ScoredElement>> {
        log::debug!("🔧 Applying rule: {}", rule.name());
        let result = rule.apply(elements)?;
        self.debug_config.trace(rule.name(), &result);
        Ok(result)
    }

    /// Report produced by the last Validation rule run, if any
    pub fn take_validation_report(&self) -> Option<ValidationReport> {
        self.last_validation.borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn heading(text: &str, level: HeadingLevel, seq: u32, x: f32) -> ScoredElement {
        let el = TextElement::new(text, 1, 18.0, true)
            .with_position(x, 100.0, 40.0, 18.0)
            .with_sequence(seq);
        ScoredElement::heading(el, level, 0.8)
    }

    #[test]
    fn pipeline_runs_configured_rules_in_order() {
        let engine = RuleEngine::new(OutlineConfig::default()).unwrap();
        let elements = vec![
            heading("Intro", HeadingLevel::H3, 0, 50.0),
            heading("duction", HeadingLevel::H3, 1, 130.0),
        ];

        let out = engine.apply_rules(elements).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), "Intro duction");
        assert_eq!(out[0].level, Some(HeadingLevel::H1));

        let timings = engine.rule_timings.borrow();
        let names: Vec<&str> = timings.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["FragmentMerging", "HierarchyCorrection", "NoiseFilter", "Validation"]
        );
        drop(timings);
        assert!(engine.take_validation_report().is_some());
    }

    #[test]
    fn disabled_and_unknown_rules_are_skipped() {
        let mut config = OutlineConfig::default();
        config.pipeline.rules = vec![
            RuleConfig {
                name: "FragmentMerging".to_string(),
                enabled: false,
            },
            RuleConfig {
                name: "Bogus".to_string(),
                enabled: true,
            },
        ];
        let engine = RuleEngine::new(config).unwrap();
        let elements = vec![
            heading("Intro", HeadingLevel::H1, 0, 50.0),
            heading("duction", HeadingLevel::H1, 1, 130.0),
        ];
        let out = engine.apply_rules(elements.clone()).unwrap();
        assert_eq!(out, elements);
        assert!(engine.take_validation_report().is_none());
    }

    #[test]
    fn debug_filters_compile_once_with_substring_fallback() {
        let config = DebugConfig::new(
            true,
            vec![r"^\d+\. ".to_string(), "(unclosed".to_string()],
        );
        assert!(config.is_enabled());
        assert!(config.matches("1. Introduction"));
        assert!(config.matches("see (unclosed note"));
        assert!(!config.matches("Background"));

        assert!(!DebugConfig::new(false, vec!["x".to_string()]).is_enabled());
        assert!(!DebugConfig::disabled().matches("anything"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = OutlineConfig::default();
        config.font_statistics.h1_ratio = 1.0;
        assert!(RuleEngine::new(config).is_err());
    }
}
