use crate::config::HierarchyConfig;
use crate::error::Result;
use crate::rules::hierarchy::HierarchyCorrectionRule;
use crate::types::*;
use std::fs;
use std::path::Path;

/// Packages the surviving headings and the title into the final `Document`.
pub struct OutlineAssembler<'a> {
    hierarchy: &'a HierarchyConfig,
}

impl<'a> OutlineAssembler<'a> {
    pub fn new(hierarchy: &'a HierarchyConfig) -> Self {
        Self { hierarchy }
    }

    /// Keep headings, order by (page, sequence_index), re-check the level
    /// sequence (filtering may have removed an intermediate heading) and emit
    /// trimmed outline entries.
    pub fn assemble(&self, title: String, elements: Vec<ScoredElement>) -> Document {
        let mut headings: Vec<ScoredElement> =
            elements.into_iter().filter(|e| e.is_heading()).collect();
        headings.sort_by_key(|h| (h.page(), h.element.sequence_index));

        let headings = HierarchyCorrectionRule::new(self.hierarchy).correct(headings);

        let outline: Outline = headings
            .into_iter()
            .filter_map(|h| {
                let text = h.element.text.trim().to_string();
                match (h.level, text.is_empty()) {
                    (Some(level), false) => Some(OutlineEntry {
                        level,
                        text,
                        page: h.element.page,
                    }),
                    _ => None,
                }
            })
            .collect();

        log::debug!("📑 Assembled outline with {} entries", outline.len());
        Document { title, outline }
    }
}

impl Document {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_to_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn load_from_json(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str, level: HeadingLevel, page: u32, seq: u32) -> ScoredElement {
        let el = TextElement::new(text, page, 14.0, true).with_sequence(seq);
        ScoredElement::heading(el, level, 0.8)
    }

    #[test]
    fn assembles_in_page_then_reading_order() {
        let config = HierarchyConfig::default();
        let assembler = OutlineAssembler::new(&config);
        let body = ScoredElement::body(TextElement::new("Body text.", 1, 10.0, false), 0.0);

        let doc = assembler.assemble(
            "Title".to_string(),
            vec![
                heading("Results", HeadingLevel::H1, 2, 0),
                heading("Scope", HeadingLevel::H2, 1, 3),
                body,
                heading("Introduction", HeadingLevel::H1, 1, 1),
            ],
        );

        let texts: Vec<&str> = doc.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Introduction", "Scope", "Results"]);
        assert_eq!(doc.title, "Title");
    }

    #[test]
    fn final_pass_repairs_gaps_left_by_filtering() {
        let config = HierarchyConfig::default();
        let assembler = OutlineAssembler::new(&config);
        let doc = assembler.assemble(
            String::new(),
            vec![
                heading("Overview", HeadingLevel::H1, 1, 0),
                heading("Fine Print", HeadingLevel::H3, 1, 5),
            ],
        );
        assert_eq!(doc.outline[1].level, HeadingLevel::H2);
    }

    #[test]
    fn document_json_roundtrip_on_disk() {
        let doc = Document {
            title: "Annual  Report".to_string(),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "1. Introduction".to_string(),
                page: 1,
            }],
        };
        let path = std::env::temp_dir()
            .join("pdfoutline_outline_test")
            .join("doc.json");
        doc.save_to_json(&path).unwrap();
        let loaded = Document::load_from_json(&path).unwrap();
        assert_eq!(loaded, doc);
        let _ = std::fs::remove_file(&path);
    }
}
