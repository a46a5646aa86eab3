use crate::error::{OutlineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

/// Named parameter sets. Heuristic variants are expressed as presets, not code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Balanced,
    /// Fewer, higher-confidence headings
    Strict,
    /// More headings, tolerates repeated text
    Lenient,
}

impl Preset {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "balanced" | "default" => Some(Preset::Balanced),
            "strict" | "conservative" => Some(Preset::Strict),
            "lenient" | "aggressive" => Some(Preset::Lenient),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineConfig {
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub font_statistics: FontStatisticsConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub merging: FragmentMergeConfig,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub noise_filter: NoiseFilterConfig,
    #[serde(default)]
    pub title: TitleConfig,
    /// Pipeline configuration - defines which rules to run and in what order
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Balanced,
            font_statistics: FontStatisticsConfig::default(),
            normalization: NormalizationConfig::default(),
            scoring: ScoringConfig::default(),
            keywords: KeywordConfig::default(),
            merging: FragmentMergeConfig::default(),
            hierarchy: HierarchyConfig::default(),
            noise_filter: NoiseFilterConfig::default(),
            title: TitleConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// List of rules to run in order
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    /// Name of the rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RuleConfig {
    fn enabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                RuleConfig::enabled("FragmentMerging"),
                RuleConfig::enabled("HierarchyCorrection"),
                RuleConfig::enabled("NoiseFilter"),
                RuleConfig::enabled("Validation"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontStatisticsConfig {
    /// Body size reported for documents without any usable font size
    pub default_body_size: f32,
    pub h1_percentile: f32,
    pub h2_percentile: f32,
    pub h3_percentile: f32,
    /// Multiples of the body size each threshold must at least reach
    pub h1_ratio: f32,
    pub h2_ratio: f32,
    pub h3_ratio: f32,
}

impl Default for FontStatisticsConfig {
    fn default() -> Self {
        Self {
            default_body_size: 12.0,
            h1_percentile: 0.95,
            h2_percentile: 0.90,
            h3_percentile: 0.75,
            h1_ratio: 1.5,
            h2_ratio: 1.25,
            h3_ratio: 1.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Max difference between span tops (points) for spans on one line
    pub line_y_tolerance: f32,
    /// Max horizontal gap between spans on one line, as a multiple of font size
    pub max_gap_ratio: f32,
    /// Gap (multiple of font size) above which a space is inserted when joining
    pub space_gap_ratio: f32,
    pub bold_flag: u32,
    pub italic_flag: u32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            line_y_tolerance: 2.0,
            max_gap_ratio: 1.0,
            space_gap_ratio: 0.15,
            bold_flag: 1 << 4,
            italic_flag: 1 << 1,
        }
    }
}

/// Contribution of each heuristic signal. Penalties are stored as positive
/// magnitudes and subtracted by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalWeights {
    pub size_h1: f32,
    pub size_h2: f32,
    pub size_h3: f32,
    pub bold: f32,
    pub keyword_exact: f32,
    pub keyword_partial: f32,
    pub near_margin: f32,
    pub mid_margin: f32,
    pub headline_length: f32,
    pub acceptable_length: f32,
    pub very_short_penalty: f32,
    pub very_long_penalty: f32,
    pub title_case: f32,
    pub word_count_bonus: f32,
    pub word_count_penalty: f32,
    pub sentence_starter_penalty: f32,
    pub sentence_punctuation_penalty: f32,
    pub narrative_penalty: f32,
    pub boilerplate_penalty: f32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            size_h1: 0.5,
            size_h2: 0.4,
            size_h3: 0.3,
            bold: 0.25,
            keyword_exact: 0.4,
            keyword_partial: 0.3,
            near_margin: 0.15,
            mid_margin: 0.10,
            headline_length: 0.15,
            acceptable_length: 0.10,
            very_short_penalty: 0.3,
            very_long_penalty: 0.2,
            title_case: 0.1,
            word_count_bonus: 0.1,
            word_count_penalty: 0.15,
            sentence_starter_penalty: 0.3,
            sentence_punctuation_penalty: 0.2,
            narrative_penalty: 0.2,
            boilerplate_penalty: 0.4,
        }
    }
}

/// Score awarded by each numbering/enumeration family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternWeights {
    pub chapter: f32,
    pub appendix: f32,
    pub section: f32,
    pub numbered_h1: f32,
    pub numbered_h2: f32,
    pub numbered_h3: f32,
    pub roman: f32,
    pub lettered: f32,
}

impl Default for PatternWeights {
    fn default() -> Self {
        Self {
            chapter: 0.5,
            appendix: 0.5,
            section: 0.4,
            numbered_h1: 0.5,
            numbered_h2: 0.45,
            numbered_h3: 0.4,
            roman: 0.4,
            lettered: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SignalWeights,
    pub patterns: PatternWeights,
    /// Left-margin bands (document units)
    pub near_margin: f32,
    pub mid_margin: f32,
    /// Minimum confidence for a candidate with a level to become a heading
    pub acceptance_threshold: f32,
    /// Accepted texts shorter than this need `short_text_min_confidence`
    pub short_text_chars: usize,
    pub short_text_min_confidence: f32,
    /// Word-count band that earns the bonus; above `max_words` is penalized
    pub min_words: usize,
    pub bonus_max_words: usize,
    pub max_words: usize,
    /// Semantic classifier is consulted only below this heuristic score
    pub semantic_ceiling: f32,
    /// Weight of the semantic confidence in the blend
    pub semantic_weight: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            patterns: PatternWeights::default(),
            near_margin: 50.0,
            mid_margin: 100.0,
            acceptance_threshold: 0.4,
            short_text_chars: 5,
            short_text_min_confidence: 0.7,
            min_words: 2,
            bonus_max_words: 8,
            max_words: 15,
            semantic_ceiling: 0.7,
            semantic_weight: 0.6,
        }
    }
}

fn default_h1_keywords() -> Vec<String> {
    [
        "introduction",
        "conclusion",
        "conclusions",
        "summary",
        "executive summary",
        "overview",
        "abstract",
        "references",
        "bibliography",
        "appendix",
        "table of contents",
        "contents",
        "revision history",
        "acknowledgements",
        "acknowledgments",
        "acknowledgment",
        "preface",
        "foreword",
        "glossary",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_h2_keywords() -> Vec<String> {
    [
        "background",
        "methodology",
        "methods",
        "results",
        "discussion",
        "related work",
        "future work",
        "limitations",
        "scope",
        "requirements",
        "objectives",
        "evaluation",
        "intended audience",
        "career paths",
        "learning objectives",
        "entry requirements",
        "structure and course duration",
        "keeping it current",
        "business outcomes",
        "trademarks",
        "documents and web sites",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeywordConfig {
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    /// A substring hit counts only if the text is at most this much longer than the keyword
    pub max_extra_chars: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            h1: default_h1_keywords(),
            h2: default_h2_keywords(),
            max_extra_chars: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FragmentMergeConfig {
    /// Max difference between element tops for fragments on one line
    pub vertical_tolerance: f32,
    /// Non-heading continuations shorter than this are absorbed
    pub continuation_max_chars: usize,
    /// Cap on fragments folded into one heading (including the first)
    pub max_fragments: usize,
}

impl Default for FragmentMergeConfig {
    fn default() -> Self {
        Self {
            vertical_tolerance: 5.0,
            continuation_max_chars: 20,
            max_fragments: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Confidence multiplier applied to re-leveled headings
    pub demotion_penalty: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            demotion_penalty: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseFilterConfig {
    /// Texts occurring more often than this across the document are noise
    pub repetition_threshold: usize,
    /// Shorter texts are dropped as stray tokens
    pub min_chars: usize,
}

impl Default for NoiseFilterConfig {
    fn default() -> Self {
        Self {
            repetition_threshold: 8,
            min_chars: 3,
        }
    }
}

fn default_title_stop_words() -> Vec<String> {
    [
        "revision",
        "table of contents",
        "acknowledgment",
        "acknowledgement",
        "references",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_generic_words() -> Vec<String> {
    ["page", "document", "file", "untitled", "draft"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TitleConfig {
    /// H1 candidates joined for a multi-line title
    pub combine_parts: usize,
    pub max_combined_chars: usize,
    pub stop_words: Vec<String>,
    pub generic_words: Vec<String>,
    pub min_chars: usize,
    pub max_chars: usize,
    /// Elements within this fraction of the page-1 maximum size count as "largest"
    pub largest_font_tolerance: f32,
    /// Number of top-of-page elements searched for bold text
    pub bold_scan_window: usize,
    /// H1 fragments whose tops differ by at most this much share a title line
    pub same_line_tolerance: f32,
    pub placeholder: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            combine_parts: 2,
            max_combined_chars: 100,
            stop_words: default_title_stop_words(),
            generic_words: default_generic_words(),
            min_chars: 3,
            max_chars: 150,
            largest_font_tolerance: 0.05,
            bold_scan_window: 10,
            same_line_tolerance: 5.0,
            placeholder: "Untitled Document".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    configs: BTreeMap<Preset, OutlineConfig>,
    default_config: OutlineConfig,
}

impl ConfigManager {
    pub fn new() -> Self {
        let mut manager = Self {
            configs: BTreeMap::new(),
            default_config: OutlineConfig::default(),
        };
        manager.load_builtin_configs();
        manager
    }

    pub fn get_config(&self, preset: Preset) -> &OutlineConfig {
        self.configs.get(&preset).unwrap_or(&self.default_config)
    }

    pub fn presets(&self) -> impl Iterator<Item = &Preset> {
        self.configs.keys()
    }

    /// Register a config file; it replaces the built-in config of its preset.
    pub fn load_config_from_file(&mut self, path: &str) -> Result<()> {
        let config = OutlineConfig::load_from_file(path)?;
        self.configs.insert(config.preset, config);
        Ok(())
    }

    fn load_builtin_configs(&mut self) {
        self.configs.insert(Preset::Balanced, OutlineConfig::default());

        // Strict: punish repetition early, demand tighter keyword coverage,
        // trust margin position less
        let mut strict = OutlineConfig {
            preset: Preset::Strict,
            ..OutlineConfig::default()
        };
        strict.keywords.max_extra_chars = 20;
        strict.noise_filter.repetition_threshold = 5;
        strict.scoring.weights.near_margin = 0.10;
        strict.scoring.weights.mid_margin = 0.05;
        strict.scoring.short_text_min_confidence = 0.8;
        self.configs.insert(Preset::Strict, strict);

        // Lenient: bold and keywords weigh more, repeated text tolerated longer
        let mut lenient = OutlineConfig {
            preset: Preset::Lenient,
            ..OutlineConfig::default()
        };
        lenient.keywords.max_extra_chars = 30;
        lenient.noise_filter.repetition_threshold = 10;
        lenient.scoring.weights.bold = 0.3;
        lenient.scoring.weights.keyword_partial = 0.35;
        self.configs.insert(Preset::Lenient, lenient);
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: OutlineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                log::warn!("⚠️  Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn for_preset(preset: Preset) -> Self {
        ConfigManager::new().get_config(preset).clone()
    }

    /// Reject configurations that would break the threshold ordering or the
    /// acceptance floor.
    pub fn validate(&self) -> Result<()> {
        let fs = &self.font_statistics;
        if !(fs.h1_ratio >= fs.h2_ratio && fs.h2_ratio >= fs.h3_ratio && fs.h3_ratio >= 1.0) {
            return Err(OutlineError::InvalidInput(format!(
                "font ratios must satisfy h1 >= h2 >= h3 >= 1.0 (got {}, {}, {})",
                fs.h1_ratio, fs.h2_ratio, fs.h3_ratio
            )));
        }
        if !(fs.h1_percentile >= fs.h2_percentile && fs.h2_percentile >= fs.h3_percentile) {
            return Err(OutlineError::InvalidInput(
                "font percentiles must satisfy h1 >= h2 >= h3".to_string(),
            ));
        }
        let w = &self.scoring.weights;
        if !(w.size_h1 >= w.size_h2 && w.size_h2 >= w.size_h3 && w.size_h3 >= 0.0) {
            return Err(OutlineError::InvalidInput(
                "size weights must satisfy size_h1 >= size_h2 >= size_h3 >= 0".to_string(),
            ));
        }
        if self.scoring.acceptance_threshold < 0.4 {
            return Err(OutlineError::InvalidInput(format!(
                "acceptance_threshold {} is below the 0.4 floor",
                self.scoring.acceptance_threshold
            )));
        }
        if self.merging.max_fragments == 0 {
            return Err(OutlineError::InvalidInput(
                "merging.max_fragments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = OutlineConfig::default();
        assert_eq!(config.scoring.acceptance_threshold, 0.4);
        assert_eq!(config.font_statistics.h1_ratio, 1.5);
        assert_eq!(config.merging.max_fragments, 3);
        assert_eq!(config.noise_filter.repetition_threshold, 8);
        assert_eq!(config.title.placeholder, "Untitled Document");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "preset: strict\nnoise_filter:\n  repetition_threshold: 4\n";
        let config = OutlineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.preset, Preset::Strict);
        assert_eq!(config.noise_filter.repetition_threshold, 4);
        assert_eq!(config.noise_filter.min_chars, 3);
        assert_eq!(config.scoring.weights.bold, 0.25);
        assert_eq!(config.pipeline.rules.len(), 4);
    }

    #[test]
    fn yaml_below_acceptance_floor_is_rejected() {
        let yaml = "scoring:\n  acceptance_threshold: 0.2\n";
        assert!(OutlineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn presets_differ_only_in_parameters() {
        let manager = ConfigManager::new();
        assert_eq!(manager.presets().count(), 3);
        let strict = manager.get_config(Preset::Strict);
        let lenient = manager.get_config(Preset::Lenient);
        assert!(strict.noise_filter.repetition_threshold < lenient.noise_filter.repetition_threshold);
        assert_eq!(strict.pipeline, lenient.pipeline);
        assert!(strict.validate().is_ok() && lenient.validate().is_ok());
    }

    #[test]
    fn missing_config_file_falls_back() {
        let config = OutlineConfig::load_with_fallback(Some("/nonexistent/outline.yaml"));
        assert_eq!(config, OutlineConfig::default());
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!(Preset::parse("Conservative"), Some(Preset::Strict));
        assert_eq!(Preset::parse("balanced"), Some(Preset::Balanced));
        assert_eq!(Preset::parse("wild"), None);
    }
}
