// Rules module - the heading classification pipeline
// - engine.rs: RuleEngine, ParseRule and debug tracing
// - font_statistics.rs: document font profile and adaptive thresholds
// - pattern_detection.rs: numbering, keyword and noise patterns
// - heading_scoring.rs: weighted heading scorer
// - fragment_merging.rs: rejoin split headings
// - hierarchy.rs: no skipped heading levels
// - noise_filter.rs: boilerplate and duplicate removal
// - validation.rs: final structural checks

pub mod engine;
pub mod font_statistics;
pub mod fragment_merging;
pub mod heading_scoring;
pub mod hierarchy;
pub mod noise_filter;
pub mod pattern_detection;
pub mod validation;

pub use engine::*;
pub use font_statistics::{FontProfile, FontStatisticsAnalyzer};
pub use fragment_merging::FragmentMergingRule;
pub use heading_scoring::HeadingScorer;
pub use hierarchy::{HierarchyContext, HierarchyCorrectionRule};
pub use noise_filter::{DeduplicationState, NoiseFilterRule};
pub use pattern_detection::{NoiseKind, PatternFamily, PatternLibrary};
pub use validation::{ValidationIssue, ValidationReport, ValidationRule};
