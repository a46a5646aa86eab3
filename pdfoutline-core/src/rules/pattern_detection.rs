use crate::config::{KeywordConfig, PatternWeights};
use crate::error::Result;
use crate::types::HeadingLevel;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Numbering and enumeration families recognised as section prefixes,
/// listed in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternFamily {
    /// "Chapter 3", "Part II"
    Chapter,
    /// "Appendix A"
    Appendix,
    /// "Section 4.2"
    Section,
    /// "2.1.3 Details"
    NumberedH3,
    /// "2.1 Overview"
    NumberedH2,
    /// "1. Introduction"
    NumberedH1,
    /// "IV. Results"
    Roman,
    /// "B. Methods", "B) Methods"
    Lettered,
}

impl PatternFamily {
    pub fn level(self) -> HeadingLevel {
        match self {
            PatternFamily::Chapter
            | PatternFamily::Appendix
            | PatternFamily::NumberedH1
            | PatternFamily::Roman => HeadingLevel::H1,
            PatternFamily::Section | PatternFamily::NumberedH2 | PatternFamily::Lettered => {
                HeadingLevel::H2
            }
            PatternFamily::NumberedH3 => HeadingLevel::H3,
        }
    }

    pub fn weight(self, weights: &PatternWeights) -> f32 {
        match self {
            PatternFamily::Chapter => weights.chapter,
            PatternFamily::Appendix => weights.appendix,
            PatternFamily::Section => weights.section,
            PatternFamily::NumberedH3 => weights.numbered_h3,
            PatternFamily::NumberedH2 => weights.numbered_h2,
            PatternFamily::NumberedH1 => weights.numbered_h1,
            PatternFamily::Roman => weights.roman,
            PatternFamily::Lettered => weights.lettered,
        }
    }

    /// Families that number real sections (and so legitimately repeat via a TOC)
    pub fn is_numbered_section(self) -> bool {
        !matches!(self, PatternFamily::Lettered)
    }
}

/// Why a string was classified as boilerplate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoiseKind {
    PageNumber,
    DateStamp,
    Copyright,
    UrlOrEmail,
    ShortToken,
    SymbolOnly,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch {
    pub level: HeadingLevel,
    /// The whole text is the keyword (modulo a trailing colon)
    pub exact: bool,
}

const SENTENCE_STARTERS: &[&str] = &[
    "the", "this", "that", "these", "those", "a", "an", "it", "there", "when", "where", "we",
    "our", "in", "on", "at", "to", "for", "with", "by", "from",
];

const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with",
];

/// Compiled pattern set shared by the scorer, the noise filter and the title extractor.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    families: Vec<(PatternFamily, Regex)>,
    page_numbers: Vec<Regex>,
    dates: Vec<Regex>,
    copyright: Regex,
    url: Regex,
    email: Regex,
    bare_number: Regex,
    narrative: Regex,
}

impl PatternLibrary {
    pub fn new() -> Result<Self> {
        let families = vec![
            (
                PatternFamily::Chapter,
                Regex::new(r"(?i)^(chapter|part)\s+(\d+|[ivxlc]+)\b")?,
            ),
            (
                PatternFamily::Appendix,
                Regex::new(r"(?i)^appendix\s+([a-z]|\d+)\b")?,
            ),
            (
                PatternFamily::Section,
                Regex::new(r"(?i)^section\s+\d+(\.\d+)*\b")?,
            ),
            (
                PatternFamily::NumberedH3,
                Regex::new(r"^\d+\.\d+\.\d+\.?\s+\S")?,
            ),
            (PatternFamily::NumberedH2, Regex::new(r"^\d+\.\d+\.?\s+\S")?),
            (PatternFamily::NumberedH1, Regex::new(r"^\d+\.\s+\S")?),
            (PatternFamily::Roman, Regex::new(r"^[IVX]+\.\s+\S")?),
            (PatternFamily::Lettered, Regex::new(r"^[A-Z][.)]\s+\S")?),
        ];

        let months = "january|february|march|april|may|june|july|august|september|october|november|december";

        Ok(Self {
            families,
            page_numbers: vec![
                Regex::new(r"^\d+$")?,
                Regex::new(r"(?i)^page\s+\d+(\s+of\s+\d+)?$")?,
                Regex::new(r"(?i)^\d+\s*(/|of)\s*\d+$")?,
                Regex::new(r"^[-–—]\s*\d+\s*[-–—]$")?,
            ],
            dates: vec![
                Regex::new(r"^\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}$")?,
                Regex::new(r"^\d{4}-\d{2}-\d{2}$")?,
                Regex::new(&format!(r"(?i)^({months})\s+\d{{1,2}},?\s+\d{{4}}$"))?,
                Regex::new(&format!(r"(?i)^\d{{1,2}}\s+({months}),?\s+\d{{4}}$"))?,
            ],
            copyright: Regex::new(r"(?i)(^(©|\(c\)|copyright\b)|all rights reserved)")?,
            url: Regex::new(r"(?i)(https?://|www\.|\.(com|org|edu|net|gov)(/|\b))")?,
            email: Regex::new(r"[\w.+-]+@[\w-]+\.[\w.]+")?,
            bare_number: Regex::new(r"^[\d\s.,:/%-]+$")?,
            narrative: Regex::new(
                r"(?i)\b(said|says|reported|according|mentioned|however|therefore|moreover|furthermore|thus)\b",
            )?,
        })
    }

    /// First numbering family matching the left-trimmed text.
    pub fn match_section(&self, text: &str) -> Option<PatternFamily> {
        let text = text.trim_start();
        self.families
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(family, _)| *family)
    }

    pub fn is_numbered_section(&self, text: &str) -> bool {
        self.match_section(text)
            .map(|family| family.is_numbered_section())
            .unwrap_or(false)
    }

    pub fn is_url_or_email(&self, text: &str) -> bool {
        self.url.is_match(text) || self.email.is_match(text)
    }

    /// Text made only of digits and number punctuation
    pub fn is_bare_number(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && self.bare_number.is_match(trimmed)
    }

    /// URL, e-mail address or bare number
    pub fn is_boilerplate(&self, text: &str) -> bool {
        self.is_url_or_email(text) || self.is_bare_number(text)
    }

    pub fn has_narrative_verb(&self, text: &str) -> bool {
        self.narrative.is_match(text)
    }

    /// Structural exclusion check: page numbers, dates, copyright lines,
    /// URLs, tiny tokens and symbol-only strings.
    pub fn structural_noise(&self, text: &str, min_chars: usize) -> Option<NoiseKind> {
        let trimmed = text.trim();

        if !trimmed.chars().any(|c| c.is_alphanumeric()) {
            return Some(NoiseKind::SymbolOnly);
        }
        if self.page_numbers.iter().any(|re| re.is_match(trimmed)) {
            return Some(NoiseKind::PageNumber);
        }
        if self.dates.iter().any(|re| re.is_match(trimmed)) {
            return Some(NoiseKind::DateStamp);
        }
        if self.copyright.is_match(trimmed) {
            return Some(NoiseKind::Copyright);
        }
        if self.is_url_or_email(trimmed) {
            return Some(NoiseKind::UrlOrEmail);
        }
        if trimmed.chars().count() < min_chars {
            return Some(NoiseKind::ShortToken);
        }
        None
    }
}

/// Lowercase, whitespace-collapsed form used for counting and deduplication.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keyword lookup against the H1 vocabulary first, then H2. Exact phrase
/// matches win over substring hits; a substring hit only counts when the
/// keyword covers most of the text.
pub fn match_keyword(text: &str, config: &KeywordConfig) -> Option<KeywordMatch> {
    let normalized = normalize_text(text);
    let candidate = normalized.trim_end_matches(':').trim();
    if candidate.is_empty() {
        return None;
    }

    let vocabularies = [(HeadingLevel::H1, &config.h1), (HeadingLevel::H2, &config.h2)];

    for (level, words) in vocabularies.iter() {
        if words.iter().any(|k| k.to_lowercase() == candidate) {
            return Some(KeywordMatch {
                level: *level,
                exact: true,
            });
        }
    }

    let text_len = candidate.chars().count();
    for (level, words) in vocabularies.iter() {
        for keyword in words.iter() {
            let keyword = keyword.to_lowercase();
            let keyword_len = keyword.chars().count();
            if keyword_len == 0 || text_len.saturating_sub(keyword_len) > config.max_extra_chars {
                continue;
            }
            if contains_phrase(candidate, &keyword) {
                return Some(KeywordMatch {
                    level: *level,
                    exact: false,
                });
            }
        }
    }

    None
}

/// Substring match that respects word boundaries on both ends.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        before_ok && after_ok
    })
}

/// "The results show ..." style openings
pub fn starts_with_sentence_starter(text: &str) -> bool {
    let mut words = text.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(_)) => SENTENCE_STARTERS.contains(&first.to_lowercase().as_str()),
        _ => false,
    }
}

pub fn ends_with_sentence_punctuation(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('.') | Some('!') | Some('?'))
}

/// Every word starts uppercase with lowercase remainder; minor words may
/// stay lowercase after the first word.
pub fn is_title_case(text: &str) -> bool {
    let mut saw_word = false;
    for (i, word) in text.split_whitespace().enumerate() {
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        let Some(first) = letters.first() else {
            continue;
        };
        if i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        if !first.is_uppercase() || letters[1..].iter().any(|c| c.is_uppercase()) {
            return false;
        }
        saw_word = true;
    }
    saw_word
}

pub fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> PatternLibrary {
        PatternLibrary::new().unwrap()
    }

    #[test]
    fn numbering_families_assign_levels() {
        let lib = library();
        let cases = [
            ("1. Introduction", PatternFamily::NumberedH1, HeadingLevel::H1),
            ("2.1 Overview", PatternFamily::NumberedH2, HeadingLevel::H2),
            ("2.1.3 Details", PatternFamily::NumberedH3, HeadingLevel::H3),
            ("Chapter 4 Results", PatternFamily::Chapter, HeadingLevel::H1),
            ("PART II", PatternFamily::Chapter, HeadingLevel::H1),
            ("Appendix B: Tables", PatternFamily::Appendix, HeadingLevel::H1),
            ("Section 3.2 Scope", PatternFamily::Section, HeadingLevel::H2),
            ("IV. Discussion", PatternFamily::Roman, HeadingLevel::H1),
            ("C) Budget", PatternFamily::Lettered, HeadingLevel::H2),
        ];
        for (text, family, level) in cases {
            assert_eq!(lib.match_section(text), Some(family), "{text}");
            assert_eq!(family.level(), level, "{text}");
        }
    }

    #[test]
    fn pattern_matching_trims_left_only() {
        let lib = library();
        assert_eq!(
            lib.match_section("   3. Methods"),
            Some(PatternFamily::NumberedH1)
        );
        assert_eq!(lib.match_section("Introduction"), None);
        assert_eq!(lib.match_section("1999 was a year"), None);
    }

    #[test]
    fn lettered_items_are_not_numbered_sections() {
        let lib = library();
        assert!(lib.is_numbered_section("3.1 Data"));
        assert!(!lib.is_numbered_section("A. Data"));
    }

    #[test]
    fn structural_noise_kinds() {
        let lib = library();
        assert_eq!(lib.structural_noise("12", 3), Some(NoiseKind::PageNumber));
        assert_eq!(lib.structural_noise("Page 4 of 20", 3), Some(NoiseKind::PageNumber));
        assert_eq!(lib.structural_noise("- 7 -", 3), Some(NoiseKind::PageNumber));
        assert_eq!(lib.structural_noise("03/14/2024", 3), Some(NoiseKind::DateStamp));
        assert_eq!(lib.structural_noise("March 14, 2024", 3), Some(NoiseKind::DateStamp));
        assert_eq!(
            lib.structural_noise("© 2024 Example Corp.", 3),
            Some(NoiseKind::Copyright)
        );
        assert_eq!(
            lib.structural_noise("Visit www.example.com", 3),
            Some(NoiseKind::UrlOrEmail)
        );
        assert_eq!(
            lib.structural_noise("contact@example.org", 3),
            Some(NoiseKind::UrlOrEmail)
        );
        assert_eq!(lib.structural_noise("Ab", 3), Some(NoiseKind::ShortToken));
        assert_eq!(lib.structural_noise("* * *", 3), Some(NoiseKind::SymbolOnly));
        assert_eq!(lib.structural_noise("2.1 Overview", 3), None);
    }

    #[test]
    fn keyword_exact_and_partial() {
        let config = KeywordConfig::default();
        assert_eq!(
            match_keyword("Introduction:", &config),
            Some(KeywordMatch {
                level: HeadingLevel::H1,
                exact: true
            })
        );
        assert_eq!(
            match_keyword("Background and Motivation", &config),
            Some(KeywordMatch {
                level: HeadingLevel::H2,
                exact: false
            })
        );
        // keyword buried inside a long sentence
        assert_eq!(
            match_keyword(
                "In this introduction we describe the whole measurement campaign in detail",
                &config
            ),
            None
        );
        // no partial-word hits
        assert_eq!(match_keyword("Scoped Storage", &config), None);
    }

    #[test]
    fn negative_cues() {
        let lib = library();
        assert!(starts_with_sentence_starter("The system was deployed"));
        assert!(!starts_with_sentence_starter("Theory"));
        assert!(!starts_with_sentence_starter("The"));
        assert!(ends_with_sentence_punctuation("It works."));
        assert!(!ends_with_sentence_punctuation("1. Introduction"));
        assert!(lib.has_narrative_verb("However the team disagreed"));
        assert!(lib.is_boilerplate("42"));
        assert!(lib.is_boilerplate("https://example.com/a"));
        assert!(!lib.is_boilerplate("Results"));
    }

    #[test]
    fn title_case_and_caps() {
        assert!(is_title_case("Annual Report of the Board"));
        assert!(!is_title_case("the annual report"));
        assert!(!is_title_case("McDonald Farms"));
        assert!(is_all_caps("EXECUTIVE SUMMARY"));
        assert!(!is_all_caps("A"));
    }

    #[test]
    fn normalization_collapses_whitespace() {
        assert_eq!(normalize_text("  Table   of\tContents "), "table of contents");
    }
}
