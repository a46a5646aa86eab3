use crate::classifier::SemanticClassifier;
use crate::config::{OutlineConfig, Preset};
use crate::error::{OutlineError, Result};
use crate::outline::OutlineAssembler;
use crate::preprocessors::{Preprocessor, SpanJsonPreprocessor};
use crate::rules::font_statistics::FontProfile;
use crate::rules::validation::ValidationReport;
use crate::rules::{engine::DebugConfig, RuleEngine};
use crate::title::{TitleCandidate, TitleExtractor, TitleStrategy};
use crate::types::*;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics, one field per pipeline boundary
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStages {
    pub text_elements: Vec<TextElement>,
    pub font_profile: FontProfile,
    pub scored_elements: Vec<ScoredElement>,
    /// Headings that survived the rule pipeline, before assembly
    pub headings: Vec<HeadingCandidate>,
    pub title: TitleCandidate,
    pub validation: Option<ValidationReport>,
    pub document: Document,
}

/// One timed step as reported by [`StepProfiler::summary`]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepTiming {
    pub name: String,
    pub millis: f64,
    /// Share of the profiled total, 0 when the total is zero
    pub percent: f64,
}

/// Timings of one profiled run, in step order
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProfileSummary {
    pub steps: Vec<StepTiming>,
    pub total_ms: f64,
}

impl ProfileSummary {
    pub fn slowest(&self) -> Option<&StepTiming> {
        self.steps
            .iter()
            .max_by(|a, b| a.millis.total_cmp(&b.millis))
    }
}

/// Collects per-step wall time when enabled, otherwise just runs the steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        self.record(step_name, start.elapsed());
        result
    }

    pub fn record(&mut self, step_name: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        log::debug!("⏱️  {}: {:.3}ms", step_name, elapsed.as_secs_f64() * 1000.0);
        self.timings.push((step_name.to_string(), elapsed));
    }

    pub fn summary(&self) -> ProfileSummary {
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        let steps = self
            .timings
            .iter()
            .map(|(name, duration)| StepTiming {
                name: name.clone(),
                millis: duration.as_secs_f64() * 1000.0,
                percent: if total.is_zero() {
                    0.0
                } else {
                    duration.as_secs_f64() / total.as_secs_f64() * 100.0
                },
            })
            .collect();
        ProfileSummary {
            steps,
            total_ms: total.as_secs_f64() * 1000.0,
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        if summary.steps.is_empty() {
            return;
        }

        log::info!("📊 Performance Summary:");
        for step in &summary.steps {
            log::info!("   {:.<35} {:.3}ms ({:.1}%)", step.name, step.millis, step.percent);
        }
        log::info!("   {:.<35} {:.3}ms", "Total", summary.total_ms);
        if let Some(slowest) = summary.slowest() {
            log::info!("   🐢 Slowest step: {}", slowest.name);
        }
    }
}

/// One outline pipeline: preprocessor, rule engine and an optional shared
/// semantic classifier. Use one instance per document stream; the semantic
/// model may be shared between instances.
pub struct OutlineProcessor {
    preprocessor: Box<dyn Preprocessor>,
    rule_engine: RuleEngine,
    semantic: Option<Arc<dyn SemanticClassifier>>,
}

impl OutlineProcessor {
    /// Span-dump input, heuristic-only scoring
    pub fn new(config: OutlineConfig) -> Result<Self> {
        let preprocessor = Box::new(SpanJsonPreprocessor::new(config.normalization.clone()));
        Self::new_with_dependencies(preprocessor, config, None)
    }

    pub fn with_preset(preset: Preset) -> Result<Self> {
        Self::new(OutlineConfig::for_preset(preset))
    }

    /// Create OutlineProcessor with full dependency injection
    pub fn new_with_dependencies(
        preprocessor: Box<dyn Preprocessor>,
        config: OutlineConfig,
        semantic: Option<Arc<dyn SemanticClassifier>>,
    ) -> Result<Self> {
        Ok(Self {
            preprocessor,
            rule_engine: RuleEngine::new(config)?,
            semantic,
        })
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.rule_engine.set_debug_config(debug_config);
    }

    pub fn set_semantic_classifier(&mut self, semantic: Option<Arc<dyn SemanticClassifier>>) {
        if let Some(classifier) = &semantic {
            if !classifier.is_available() {
                log::warn!(
                    "⚠️  Semantic classifier '{}' is unavailable, running heuristic-only",
                    classifier.name()
                );
            }
        }
        self.semantic = semantic;
    }

    pub fn config(&self) -> &OutlineConfig {
        self.rule_engine.config()
    }

    pub fn preprocessor_name(&self) -> &str {
        self.preprocessor.name()
    }

    /// Per-rule timings of the most recent document
    pub fn rule_timings(&self) -> Vec<(String, Duration)> {
        self.rule_engine.rule_timings.borrow().clone()
    }

    /// Classify already-normalized elements
    pub fn process_elements(&self, elements: Vec<TextElement>) -> Result<Document> {
        let mut profiler = StepProfiler::new(false);
        Ok(self.run_pipeline(elements, &mut profiler)?.document)
    }

    /// Normalize raw extractor spans, then classify
    pub fn process_spans(&self, spans: &[RawSpan]) -> Result<Document> {
        self.process_elements(self.preprocessor.normalize_spans(spans))
    }

    /// Unreadable or malformed input yields the empty document
    pub fn process_file(&self, input: &Path) -> Document {
        match self.try_process_file(input) {
            Ok(document) => document,
            Err(e) => {
                log::warn!(
                    "⚠️  Failed to process {}: {}, reporting empty outline",
                    input.display(),
                    e
                );
                Document::empty()
            }
        }
    }

    pub fn try_process_file(&self, input: &Path) -> Result<Document> {
        let mut profiler = StepProfiler::new(false);
        Ok(self.capture_stages(input, &mut profiler)?.document)
    }

    /// Process a file and keep every intermediate stage output
    pub fn capture_stages(&self, input: &Path, profiler: &mut StepProfiler) -> Result<PipelineStages> {
        log::info!(
            "📄 Processing {} with {}",
            input.display(),
            self.preprocessor.name()
        );

        if !self.preprocessor.supports_file_type(input) {
            return Err(OutlineError::UnsupportedFormat(format!(
                "{} is not supported by {}",
                input.display(),
                self.preprocessor.name()
            )));
        }

        let bytes = std::fs::read(input)?;
        let spans = profiler.time_step("1. Span Extraction", || {
            self.preprocessor.extract_spans(&bytes)
        })?;
        let elements = profiler.time_step("2. Fragment Normalization", || {
            self.preprocessor.normalize_spans(&spans)
        });

        self.run_pipeline(elements, profiler)
    }

    fn run_pipeline(
        &self,
        mut elements: Vec<TextElement>,
        profiler: &mut StepProfiler,
    ) -> Result<PipelineStages> {
        elements.retain(|e| !e.text.trim().is_empty());
        elements.sort_by_key(|e| (e.page, e.sequence_index));

        let font_profile = profiler.time_step("3. Font Statistics", || {
            self.rule_engine.analyze_font_sizes(&elements)
        });

        if elements.is_empty() {
            log::info!("📭 No text elements, returning empty outline");
            return Ok(PipelineStages {
                text_elements: elements,
                font_profile,
                scored_elements: Vec::new(),
                headings: Vec::new(),
                title: TitleCandidate {
                    text: String::new(),
                    strategy: TitleStrategy::Placeholder,
                },
                validation: None,
                document: Document::empty(),
            });
        }

        let scored_elements = profiler.time_step("4. Heading Scoring", || {
            self.rule_engine
                .score_elements(&elements, &font_profile, self.semantic.as_deref())
        });

        let config = self.rule_engine.config();
        let title = profiler.time_step("5. Title Extraction", || {
            TitleExtractor::new(&config.title, self.rule_engine.patterns()).extract(&scored_elements)
        });

        let processed = profiler.time_step("6. Rule Pipeline", || {
            self.rule_engine.apply_rules(scored_elements.clone())
        })?;
        for (rule, elapsed) in self.rule_engine.rule_timings.borrow().iter() {
            profiler.record(&format!("   6.{rule}"), *elapsed);
        }
        let validation = self.rule_engine.take_validation_report();

        let headings: Vec<HeadingCandidate> =
            processed.iter().filter(|e| e.is_heading()).cloned().collect();

        let document = profiler.time_step("7. Outline Assembly", || {
            OutlineAssembler::new(&config.hierarchy).assemble(title.text.clone(), processed)
        });

        log::info!(
            "✅ \"{}\": {} outline entries from {} text elements",
            document.title,
            document.outline.len(),
            elements.len()
        );

        Ok(PipelineStages {
            text_elements: elements,
            font_profile,
            scored_elements,
            headings,
            title,
            validation,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_profiler_reports_nothing() {
        let mut profiler = StepProfiler::new(false);
        let value = profiler.time_step("Scoring", || 7);
        profiler.record("Rules", Duration::from_millis(5));

        assert_eq!(value, 7);
        assert_eq!(profiler.summary(), ProfileSummary::default());
        assert!(profiler.summary().slowest().is_none());
    }

    #[test]
    fn summary_keeps_step_order_and_shares() {
        let mut profiler = StepProfiler::new(true);
        profiler.record("Normalize", Duration::from_millis(10));
        profiler.record("Scoring", Duration::from_millis(30));

        let summary = profiler.summary();
        let names: Vec<&str> = summary.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Normalize", "Scoring"]);
        assert!((summary.total_ms - 40.0).abs() < 1e-6);
        assert!((summary.steps[0].percent - 25.0).abs() < 1e-6);
        let share: f64 = summary.steps.iter().map(|s| s.percent).sum();
        assert!((share - 100.0).abs() < 1e-6);
        assert_eq!(summary.slowest().map(|s| s.name.as_str()), Some("Scoring"));
    }
}
