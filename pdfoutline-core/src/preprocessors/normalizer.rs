use crate::config::NormalizationConfig;
use crate::types::{BoundingBox, RawSpan, TextElement};

/// Groups raw extractor spans into one `TextElement` per visual line.
pub struct FragmentNormalizer<'a> {
    config: &'a NormalizationConfig,
}

/// Typography key used to pick the dominant style of a line
#[derive(Debug, Clone, PartialEq)]
struct StyleKey {
    font: String,
    size_bucket: i64,
    bold: bool,
    italic: bool,
}

impl<'a> FragmentNormalizer<'a> {
    pub fn new(config: &'a NormalizationConfig) -> Self {
        Self { config }
    }

    pub fn is_bold(&self, span: &RawSpan) -> bool {
        let font = span.font.to_lowercase();
        span.flags & self.config.bold_flag != 0
            || ["bold", "black", "heavy"].iter().any(|w| font.contains(w))
    }

    pub fn is_italic(&self, span: &RawSpan) -> bool {
        let font = span.font.to_lowercase();
        span.flags & self.config.italic_flag != 0
            || ["italic", "oblique"].iter().any(|w| font.contains(w))
    }

    /// Spans are consumed in extractor order. Consecutive spans on one page
    /// that share a line (by id, or by top within tolerance) and sit close
    /// horizontally become one element.
    pub fn normalize(&self, spans: &[RawSpan]) -> Vec<TextElement> {
        let mut elements = Vec::new();
        let mut line: Vec<&RawSpan> = Vec::new();

        for span in spans {
            if !is_well_formed(span) {
                log::warn!(
                    "⚠️  Skipping span with invalid geometry on page index {}: \"{}\"",
                    span.page_index,
                    span.text
                );
                continue;
            }
            if span.page_index.checked_add(1).is_none() {
                log::warn!(
                    "⚠️  Skipping span with out-of-range page index {}: \"{}\"",
                    span.page_index,
                    span.text
                );
                continue;
            }

            let joins = line
                .last()
                .map(|prev| self.same_line(prev, span))
                .unwrap_or(false);

            if !joins && !line.is_empty() {
                self.flush(&line, &mut elements);
                line.clear();
            }
            line.push(span);
        }
        self.flush(&line, &mut elements);

        assign_sequence_indices(&mut elements);
        log::debug!(
            "   🧾 Normalized {} spans into {} text elements",
            spans.len(),
            elements.len()
        );
        elements
    }

    fn same_line(&self, prev: &RawSpan, next: &RawSpan) -> bool {
        if prev.page_index != next.page_index {
            return false;
        }

        let shares_line = match (prev.line, next.line) {
            (Some(a), Some(b)) => a == b,
            _ => (prev.bbox[1] - next.bbox[1]).abs() <= self.config.line_y_tolerance,
        };
        if !shares_line {
            return false;
        }

        let gap = next.bbox[0] - prev.bbox[2];
        gap <= self.config.max_gap_ratio * prev.size.max(next.size)
    }

    fn flush(&self, line: &[&RawSpan], elements: &mut Vec<TextElement>) {
        let Some(first) = line.first() else {
            return;
        };

        let mut text = String::new();
        let mut bbox = span_box(first);
        let mut prev: Option<&RawSpan> = None;

        for &span in line {
            if let Some(prev) = prev {
                let gap = span.bbox[0] - prev.bbox[2];
                let needs_space = gap > self.config.space_gap_ratio * prev.size.max(span.size)
                    && !text.ends_with(char::is_whitespace)
                    && !span.text.starts_with(char::is_whitespace);
                if needs_space {
                    text.push(' ');
                }
                bbox = bbox.union(&span_box(span));
            }
            text.push_str(&span.text);
            prev = Some(span);
        }

        let text = text.trim();
        let Some(page) = first.page_index.checked_add(1) else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let style = self.dominant_style(line);
        let size = style.size_bucket as f32 / 10.0;
        let mut element = TextElement::new(text, page, size, style.bold)
            .with_position(bbox.x, bbox.y, bbox.width, bbox.height)
            .with_font_name(&style.font);
        element.is_italic = style.italic;
        elements.push(element);
    }

    /// Character-weighted mode of the line's styles; the first span wins ties.
    fn dominant_style(&self, line: &[&RawSpan]) -> StyleKey {
        let mut tallies: Vec<(StyleKey, usize)> = Vec::new();

        for span in line {
            let key = StyleKey {
                font: span.font.clone(),
                size_bucket: (span.size * 10.0).round() as i64,
                bold: self.is_bold(span),
                italic: self.is_italic(span),
            };
            let weight = span.text.trim().chars().count();
            match tallies.iter_mut().find(|(k, _)| *k == key) {
                Some((_, total)) => *total += weight,
                None => tallies.push((key, weight)),
            }
        }

        let mut best: Option<(StyleKey, usize)> = None;
        for (key, weight) in tallies {
            match &best {
                Some((_, best_weight)) if weight <= *best_weight => {}
                _ => best = Some((key, weight)),
            }
        }

        best.map(|(key, _)| key).unwrap_or(StyleKey {
            font: String::new(),
            size_bucket: 0,
            bold: false,
            italic: false,
        })
    }
}

fn is_well_formed(span: &RawSpan) -> bool {
    span.bbox.iter().all(|v| v.is_finite()) && span.size.is_finite()
}

fn span_box(span: &RawSpan) -> BoundingBox {
    BoundingBox::new(span.bbox[0], span.bbox[1], span.width(), span.height())
}

/// Reading order restarts at 0 on every page
fn assign_sequence_indices(elements: &mut [TextElement]) {
    let mut current_page = None;
    let mut next_index = 0;
    for element in elements.iter_mut() {
        if current_page != Some(element.page) {
            current_page = Some(element.page);
            next_index = 0;
        }
        element.sequence_index = next_index;
        next_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, page: u32, x0: f32, x1: f32, y: f32, size: f32, font: &str, flags: u32) -> RawSpan {
        RawSpan {
            text: text.to_string(),
            page_index: page,
            bbox: [x0, y, x1, y + size],
            font: font.to_string(),
            size,
            flags,
            line: None,
        }
    }

    #[test]
    fn spans_on_one_line_become_one_element() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let spans = vec![
            span("Project", 0, 50.0, 100.0, 80.0, 16.0, "Arial-Bold", 0),
            span("Plan", 0, 106.0, 140.0, 80.5, 16.0, "Arial-Bold", 0),
            span("Body text starts here", 0, 50.0, 200.0, 120.0, 10.0, "Arial", 0),
        ];

        let elements = normalizer.normalize(&spans);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text, "Project Plan");
        assert!(elements[0].is_bold);
        assert_eq!(elements[0].page, 1);
        assert_eq!(elements[0].position.x, 50.0);
        assert_eq!(elements[0].position.right(), 140.0);
        assert_eq!(elements[1].sequence_index, 1);
    }

    #[test]
    fn touching_spans_join_without_space() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let spans = vec![
            span("Intro", 0, 50.0, 90.0, 80.0, 18.0, "Times", 16),
            span("duction", 0, 90.5, 150.0, 80.0, 18.0, "Times", 16),
        ];
        let elements = normalizer.normalize(&spans);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Introduction");
        assert!(elements[0].is_bold);
    }

    #[test]
    fn dominant_style_is_character_weighted() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let spans = vec![
            span("1.", 0, 50.0, 60.0, 80.0, 12.0, "Helvetica-Bold", 0),
            span("A long regular run", 0, 62.0, 200.0, 80.0, 11.0, "Helvetica", 0),
        ];
        let elements = normalizer.normalize(&spans);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].font_size, 11.0);
        assert!(!elements[0].is_bold);
        assert_eq!(elements[0].font_name, "Helvetica");
    }

    #[test]
    fn line_ids_and_pages_split_elements() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let mut a = span("First", 0, 50.0, 90.0, 80.0, 10.0, "Arial", 0);
        let mut b = span("Second", 0, 92.0, 140.0, 80.0, 10.0, "Arial", 0);
        a.line = Some(1);
        b.line = Some(2);
        let c = span("Third", 1, 50.0, 90.0, 80.0, 10.0, "Arial", 2);

        let elements = normalizer.normalize(&[a, b, c]);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[2].page, 2);
        assert_eq!(elements[2].sequence_index, 0);
        assert!(elements[2].is_italic);
    }

    #[test]
    fn wide_gap_and_blank_spans() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let spans = vec![
            span("Left column", 0, 50.0, 120.0, 80.0, 10.0, "Arial", 0),
            span("Right column", 0, 300.0, 380.0, 80.0, 10.0, "Arial", 0),
            span("   ", 0, 50.0, 60.0, 200.0, 10.0, "Arial", 0),
        ];
        let elements = normalizer.normalize(&spans);
        let texts: Vec<&str> = elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Left column", "Right column"]);
    }

    #[test]
    fn out_of_range_page_index_is_skipped() {
        let config = NormalizationConfig::default();
        let normalizer = FragmentNormalizer::new(&config);
        let spans = vec![
            span("Broken page", u32::MAX, 50.0, 120.0, 80.0, 10.0, "Arial", 0),
            span("Real line", 0, 50.0, 120.0, 120.0, 10.0, "Arial", 0),
        ];
        let elements = normalizer.normalize(&spans);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text, "Real line");
        assert_eq!(elements[0].page, 1);
    }
}
