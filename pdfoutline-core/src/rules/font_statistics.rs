use crate::config::FontStatisticsConfig;
use crate::types::{HeadingLevel, TextElement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document-wide font size statistics and the adaptive heading thresholds
/// derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontProfile {
    /// Modal size, proxy for running text
    pub body_size: f32,
    pub mean_size: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub percentile_75: f32,
    pub percentile_90: f32,
    pub percentile_95: f32,
    pub h1_threshold: f32,
    pub h2_threshold: f32,
    pub h3_threshold: f32,
    /// Number of sizes the profile was computed from
    pub sample_count: usize,
}

impl FontProfile {
    /// Profile of a document without usable sizes: every statistic equals `body_size`.
    pub fn degenerate(body_size: f32) -> Self {
        Self {
            body_size,
            mean_size: body_size,
            min_size: body_size,
            max_size: body_size,
            percentile_75: body_size,
            percentile_90: body_size,
            percentile_95: body_size,
            h1_threshold: body_size,
            h2_threshold: body_size,
            h3_threshold: body_size,
            sample_count: 0,
        }
    }

    /// Highest level whose threshold `font_size` reaches
    pub fn level_for_size(&self, font_size: f32) -> Option<HeadingLevel> {
        if font_size >= self.h1_threshold {
            Some(HeadingLevel::H1)
        } else if font_size >= self.h2_threshold {
            Some(HeadingLevel::H2)
        } else if font_size >= self.h3_threshold {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

pub struct FontStatisticsAnalyzer<'a> {
    config: &'a FontStatisticsConfig,
}

impl<'a> FontStatisticsAnalyzer<'a> {
    pub fn new(config: &'a FontStatisticsConfig) -> Self {
        Self { config }
    }

    /// Pure pass over one document's elements. Non-finite and non-positive
    /// sizes are ignored.
    pub fn analyze(&self, elements: &[TextElement]) -> FontProfile {
        let mut sizes: Vec<f32> = elements
            .iter()
            .map(|e| e.font_size)
            .filter(|s| s.is_finite() && *s > 0.0)
            .collect();

        if sizes.is_empty() {
            log::debug!(
                "🎯 No usable font sizes, using degenerate profile at {:.1}pt",
                self.config.default_body_size
            );
            return FontProfile::degenerate(self.config.default_body_size);
        }

        sizes.sort_by(|a, b| a.total_cmp(b));

        let body_size = modal_size(&sizes);
        let mean_size = sizes.iter().sum::<f32>() / sizes.len() as f32;
        let percentile_75 = percentile(&sizes, self.config.h3_percentile);
        let percentile_90 = percentile(&sizes, self.config.h2_percentile);
        let percentile_95 = percentile(&sizes, self.config.h1_percentile);

        let h1_threshold = percentile_95.max(body_size * self.config.h1_ratio);
        let h2_threshold = percentile_90.max(body_size * self.config.h2_ratio);
        let h3_threshold = percentile_75.max(body_size * self.config.h3_ratio);

        let profile = FontProfile {
            body_size,
            mean_size,
            min_size: sizes[0],
            max_size: sizes[sizes.len() - 1],
            percentile_75,
            percentile_90,
            percentile_95,
            h1_threshold,
            h2_threshold,
            h3_threshold,
            sample_count: sizes.len(),
        };

        log::debug!(
            "🎯 Font profile: body {:.1}pt, range {:.1}-{:.1}pt, thresholds H1 {:.1} / H2 {:.1} / H3 {:.1}",
            profile.body_size,
            profile.min_size,
            profile.max_size,
            profile.h1_threshold,
            profile.h2_threshold,
            profile.h3_threshold
        );

        profile
    }
}

/// Most frequent size, bucketed to 0.1pt. Ties go to the smaller size.
fn modal_size(sorted_sizes: &[f32]) -> f32 {
    let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
    for size in sorted_sizes {
        *buckets.entry((size * 10.0).round() as i64).or_insert(0) += 1;
    }

    let mut best: Option<(i64, usize)> = None;
    for (bucket, count) in buckets {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((bucket, count)),
        }
    }

    best.map(|(bucket, _)| bucket as f32 / 10.0)
        .unwrap_or(sorted_sizes[0])
}

/// Nearest-rank percentile at index `floor(n * p)`
fn percentile(sorted_sizes: &[f32], p: f32) -> f32 {
    let n = sorted_sizes.len();
    let index = ((n as f32 * p) as usize).min(n - 1);
    sorted_sizes[index]
}
