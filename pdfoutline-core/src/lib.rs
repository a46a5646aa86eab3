// PDF Outline Core Library
//
// Classifies the text lines of a PDF into a title and an H1/H2/H3 outline.
// Main interface for turning extractor span dumps into outline documents.

pub mod types;
pub mod error;
pub mod config;
pub mod classifier;
pub mod preprocessors;
pub mod rules;
pub mod title;
pub mod outline;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{OutlineError, Result};
pub use config::{ConfigManager, OutlineConfig, Preset};
pub use classifier::{DisabledSemanticClassifier, SemanticClassifier, SemanticContext, SemanticPrediction};
pub use preprocessors::{FragmentNormalizer, Preprocessor, SpanJsonPreprocessor};
pub use rules::{DebugConfig, RuleEngine};
pub use title::{TitleCandidate, TitleExtractor, TitleStrategy};
pub use outline::OutlineAssembler;
pub use processor::{OutlineProcessor, PipelineStages, ProfileSummary, StepProfiler, StepTiming};
