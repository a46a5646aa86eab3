// Preprocessor abstraction for document processing
//
// This module defines the boundary between text extraction (document -> raw spans)
// and heading classification (TextElements -> Document). Everything after this
// point works with TextElements and is format-agnostic.

use super::normalizer::FragmentNormalizer;
use crate::config::NormalizationConfig;
use crate::error::Result;
use crate::types::*;
use std::path::Path;

/// Preprocessor trait - converts extractor output into TextElements
///
/// The preprocessing happens in two clear steps:
/// 1. Bytes -> raw styled spans (format specific)
/// 2. Raw spans -> one TextElement per visual line (shared normalizer)
pub trait Preprocessor {
    /// Step 1: decode the input into raw spans in extractor order
    fn extract_spans(&self, bytes: &[u8]) -> Result<Vec<RawSpan>>;

    /// Parameters for step 2
    fn normalization_config(&self) -> &NormalizationConfig;

    /// Step 2: group spans into lines with a dominant style
    fn normalize_spans(&self, spans: &[RawSpan]) -> Vec<TextElement> {
        FragmentNormalizer::new(self.normalization_config()).normalize(spans)
    }

    /// Full preprocessing (combines both steps)
    fn process(&self, bytes: &[u8]) -> Result<Vec<TextElement>> {
        let spans = self.extract_spans(bytes)?;
        Ok(self.normalize_spans(&spans))
    }

    /// Reads file and processes the bytes
    fn process_file(&self, input: &Path) -> Result<Vec<TextElement>> {
        let bytes = std::fs::read(input)?;
        self.process(&bytes)
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
