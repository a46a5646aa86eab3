//! Document Preprocessors
//!
//! This module provides the preprocessing layer that turns the text extractor's
//! output into the `TextElement` stream the heading classifier consumes.
//!
//! ## Architecture
//!
//! ```text
//! Extractor output (span dump)
//!     ↓
//! [Format-specific Preprocessor]  -> Vec<RawSpan>
//!     ↓
//! [FragmentNormalizer]            -> Vec<TextElement>
//!     ↓
//! [RuleEngine]
//! ```
//!
//! ## Available Preprocessors
//!
//! - `SpanJsonPreprocessor` - JSON span dumps

pub mod normalizer;
pub mod span_json;
pub mod traits;

// Re-export main types
pub use normalizer::FragmentNormalizer;
pub use span_json::SpanJsonPreprocessor;
pub use traits::Preprocessor;
