//! Span dump preprocessor
//!
//! Reads the JSON span dump written by an external PDF text extractor:
//! either a bare array of spans or an object with a `spans` array.

use super::traits::Preprocessor;
use crate::config::NormalizationConfig;
use crate::error::{OutlineError, Result};
use crate::types::RawSpan;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpanDump {
    Bare(Vec<RawSpan>),
    Wrapped { spans: Vec<RawSpan> },
}

pub struct SpanJsonPreprocessor {
    config: NormalizationConfig,
}

impl SpanJsonPreprocessor {
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    pub fn parse_spans(&self, json: &str) -> Result<Vec<RawSpan>> {
        let spans = match serde_json::from_str::<SpanDump>(json)? {
            SpanDump::Bare(spans) => spans,
            SpanDump::Wrapped { spans } => spans,
        };

        for (index, span) in spans.iter().enumerate() {
            if !span.size.is_finite() || span.size < 0.0 {
                return Err(OutlineError::InvalidInput(format!(
                    "span {} has invalid font size {}",
                    index, span.size
                )));
            }
            if span.page_index.checked_add(1).is_none() {
                return Err(OutlineError::InvalidInput(format!(
                    "span {} has out-of-range page index {}",
                    index, span.page_index
                )));
            }
            if span.bbox.iter().any(|v| !v.is_finite()) {
                return Err(OutlineError::InvalidInput(format!(
                    "span {} has a non-finite bounding box",
                    index
                )));
            }
        }

        log::debug!("📥 Parsed {} raw spans", spans.len());
        Ok(spans)
    }
}

impl Default for SpanJsonPreprocessor {
    fn default() -> Self {
        Self::new(NormalizationConfig::default())
    }
}

impl Preprocessor for SpanJsonPreprocessor {
    fn extract_spans(&self, bytes: &[u8]) -> Result<Vec<RawSpan>> {
        let json = std::str::from_utf8(bytes)
            .map_err(|e| OutlineError::InvalidInput(format!("span dump is not UTF-8: {e}")))?;
        self.parse_spans(json)
    }

    fn normalization_config(&self) -> &NormalizationConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "SpanJsonPreprocessor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_wrapped_dumps() {
        let pre = SpanJsonPreprocessor::default();
        let bare = r#"[{"text":"Hello","page_index":0,"bbox":[10,20,60,32],"font":"Arial","size":12,"flags":0}]"#;
        let wrapped = r#"{"spans":[{"text":"Hello","page_index":0,"bbox":[10,20,60,32],"size":12}]}"#;

        let a = pre.extract_spans(bare.as_bytes()).unwrap();
        let b = pre.extract_spans(wrapped.as_bytes()).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].font, "");
        assert_eq!(b[0].flags, 0);
        assert_eq!(b[0].line, None);
    }

    #[test]
    fn process_yields_text_elements() {
        let pre = SpanJsonPreprocessor::default();
        let dump = r#"[
            {"text":"Annual","page_index":0,"bbox":[50,40,120,64],"font":"Times-Bold","size":24,"flags":16},
            {"text":"Report","page_index":0,"bbox":[128,40,200,64],"font":"Times-Bold","size":24,"flags":16}
        ]"#;
        let elements = pre.process(dump.as_bytes()).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Annual Report");
        assert_eq!(elements[0].page, 1);
    }

    #[test]
    fn malformed_input_is_an_error() {
        let pre = SpanJsonPreprocessor::default();
        assert!(matches!(
            pre.extract_spans(b"not json"),
            Err(OutlineError::Json(_))
        ));
        assert!(matches!(
            pre.extract_spans(&[0xff, 0xfe]),
            Err(OutlineError::InvalidInput(_))
        ));
        let negative = r#"[{"text":"x","page_index":0,"bbox":[0,0,1,1],"size":-4}]"#;
        assert!(matches!(
            pre.extract_spans(negative.as_bytes()),
            Err(OutlineError::InvalidInput(_))
        ));
        let huge_page = r#"[{"text":"x","page_index":4294967295,"bbox":[0,0,1,1],"size":10}]"#;
        assert!(matches!(
            pre.extract_spans(huge_page.as_bytes()),
            Err(OutlineError::InvalidInput(_))
        ));
    }

    #[test]
    fn supports_json_extension_only() {
        let pre = SpanJsonPreprocessor::default();
        assert!(pre.supports_file_type(Path::new("report.JSON")));
        assert!(!pre.supports_file_type(Path::new("report.pdf")));
    }
}
