//! Style aggregation.
//!
//! Merges many extracted designs into one canonical style: categorical
//! attributes (colors, fonts, weights, layouts, style keywords) are ranked
//! by frequency, numeric arrays (sizes, margins, padding) are averaged
//! position by position.

use std::collections::HashMap;

use crate::defaults::{self, owned};
use crate::normalize::{fold_keyword, normalize_color};
use crate::types::{
    AggregatedDesignSpec, CustomColors, DesignSpec, ExtractedDesign, Spacing, Typography,
};

/// Number of colors kept in the aggregated palette.
pub const TOP_COLORS: usize = 8;
/// Number of layout patterns kept.
pub const TOP_LAYOUTS: usize = 4;
/// Number of font families kept.
pub const TOP_FONTS: usize = 4;
/// Number of font weights kept.
pub const TOP_WEIGHTS: usize = 4;
/// Number of style keywords kept.
pub const TOP_STYLE_KEYWORDS: usize = 10;

/// Merge designs into one [`AggregatedDesignSpec`].
///
/// Pure: the same input list always produces the same output. An empty
/// list yields [`default_aggregate`].
pub fn aggregate(designs: &[ExtractedDesign]) -> AggregatedDesignSpec {
    if designs.is_empty() {
        return default_aggregate();
    }

    let color_palette = rank_by_frequency(
        designs
            .iter()
            .flat_map(|d| d.color_palette.iter().map(|c| normalize_color(c))),
        TOP_COLORS,
    );
    let layout_patterns = rank_by_frequency(
        designs.iter().map(|d| d.layout_pattern.trim().to_string()),
        TOP_LAYOUTS,
    );
    let fonts = rank_by_frequency(
        designs
            .iter()
            .flat_map(|d| d.typography.fonts.iter().map(|f| f.trim().to_string())),
        TOP_FONTS,
    );
    let weights = rank_by_frequency(
        designs
            .iter()
            .flat_map(|d| d.typography.weights.iter().map(|w| w.trim().to_string())),
        TOP_WEIGHTS,
    );
    let style_keywords = rank_by_frequency(
        designs
            .iter()
            .flat_map(|d| d.style_keywords.iter().map(|k| fold_keyword(k))),
        TOP_STYLE_KEYWORDS,
    );

    let sizes: Vec<&[u32]> = designs.iter().map(|d| d.typography.sizes.as_slice()).collect();
    let margins: Vec<&[u32]> = designs.iter().map(|d| d.spacing.margins.as_slice()).collect();
    let padding: Vec<&[u32]> = designs.iter().map(|d| d.spacing.padding.as_slice()).collect();

    let typography = Typography {
        fonts,
        sizes: average_positionwise(&sizes, defaults::DEFAULT_SIZES),
        weights,
    };
    let spacing = Spacing {
        margins: average_positionwise(&margins, defaults::DEFAULT_MARGINS),
        padding: average_positionwise(&padding, defaults::DEFAULT_PADDING),
    };

    let quality_score = mean_quality(designs.iter().map(|d| d.quality_score));
    let design_spec = synthesize_design_spec(&color_palette, &layout_patterns, &typography);

    log::debug!(
        "Aggregated {} designs: {} colors, {} layouts, {} fonts",
        designs.len(),
        color_palette.len(),
        layout_patterns.len(),
        typography.fonts.len()
    );

    AggregatedDesignSpec {
        color_palette,
        typography,
        layout_patterns,
        spacing,
        style_keywords,
        quality_score,
        design_spec,
        source_count: designs.len(),
    }
}

/// The hard-coded spec returned for an empty design list.
pub fn default_aggregate() -> AggregatedDesignSpec {
    let color_palette = owned(defaults::DEFAULT_PALETTE);
    let layout_patterns = vec![defaults::DEFAULT_LAYOUT.to_string()];
    let typography = Typography::default();
    let design_spec = synthesize_design_spec(&color_palette, &layout_patterns, &typography);

    AggregatedDesignSpec {
        color_palette,
        typography,
        layout_patterns,
        spacing: Spacing::default(),
        style_keywords: Vec::new(),
        quality_score: defaults::DEFAULT_AGGREGATE_QUALITY,
        design_spec,
        source_count: 0,
    }
}

/// Count occurrences, sort by count descending (first-seen order on ties)
/// and keep the top `k`. Empty values are ignored.
pub fn rank_by_frequency<I>(values: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        if value.is_empty() {
            continue;
        }
        match index.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(k).map(|(value, _)| value).collect()
}

/// Average numeric arrays index by index.
///
/// Each position averages the designs that have a value there. The
/// output is as long as the longest input or the default vector,
/// whichever is longer; a position nobody fills takes the default value
/// at that index (or the default's last element when out of range).
pub fn average_positionwise(arrays: &[&[u32]], defaults: &[u32]) -> Vec<u32> {
    let longest = arrays.iter().map(|a| a.len()).max().unwrap_or(0);
    let len = longest.max(defaults.len());

    (0..len)
        .map(|i| {
            let values: Vec<f64> = arrays
                .iter()
                .filter_map(|a| a.get(i))
                .map(|&v| f64::from(v))
                .collect();

            if values.is_empty() {
                defaults.get(i).or(defaults.last()).copied().unwrap_or(0)
            } else {
                (values.iter().sum::<f64>() / values.len() as f64).round() as u32
            }
        })
        .collect()
}

fn mean_quality<I>(scores: I) -> u8
where
    I: IntoIterator<Item = u8>,
{
    let scores: Vec<f64> = scores.into_iter().map(f64::from).collect();
    if scores.is_empty() {
        return defaults::DEFAULT_AGGREGATE_QUALITY;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

/// Build the single canonical style from the ranked attributes.
///
/// The text color is always white, whatever the background.
fn synthesize_design_spec(
    palette: &[String],
    layouts: &[String],
    typography: &Typography,
) -> DesignSpec {
    let color = |i: usize, fallback: &str| {
        palette
            .get(i)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };

    DesignSpec {
        background_color: color(0, defaults::DEFAULT_BACKGROUND),
        text_color: defaults::DEFAULT_TEXT_COLOR.to_string(),
        layout: layouts
            .first()
            .cloned()
            .unwrap_or_else(|| defaults::DEFAULT_LAYOUT.to_string()),
        icon: defaults::DEFAULT_ICON.to_string(),
        font_family: typography.fonts.first().cloned(),
        font_size: typography.sizes.first().copied(),
        custom_colors: Some(CustomColors {
            primary: color(0, defaults::DEFAULT_BACKGROUND),
            secondary: color(1, defaults::DEFAULT_SECONDARY),
            accent: color(2, defaults::DEFAULT_ACCENT),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(palette: &[&str], margins: &[u32]) -> ExtractedDesign {
        let mut d = ExtractedDesign::fallback(vec![], 70);
        d.color_palette = owned(palette);
        d.spacing.margins = margins.to_vec();
        d
    }

    #[test]
    fn test_empty_input_returns_default() {
        let spec = aggregate(&[]);
        assert_eq!(spec.quality_score, 80);
        assert_eq!(spec.layout_patterns, vec!["title-and-bullets"]);
        assert_eq!(spec.color_palette[0], "#FF6B35");
        assert_eq!(spec.source_count, 0);
    }

    #[test]
    fn test_frequency_ranking_colors() {
        let designs = vec![
            design(&["#AAA111", "#BBB222"], &[40, 40, 40, 40]),
            design(&["#AAA111", "#CCC333"], &[40, 40, 40, 40]),
        ];
        let spec = aggregate(&designs);
        assert_eq!(spec.color_palette[0], "#AAA111");
        assert_eq!(spec.color_palette, vec!["#AAA111", "#BBB222", "#CCC333"]);
    }

    #[test]
    fn test_colors_are_normalized_before_counting() {
        let designs = vec![
            design(&["aaa111"], &[]),
            design(&["#aaa111", "#BBB222"], &[]),
            design(&["#BBB222"], &[]),
            design(&["#bbb222"], &[]),
        ];
        let spec = aggregate(&designs);
        assert_eq!(spec.color_palette, vec!["#BBB222", "#AAA111"]);
    }

    #[test]
    fn test_positionwise_margins() {
        let designs = vec![
            design(&["#000000"], &[10, 20, 30, 40]),
            design(&["#000000"], &[30, 40, 50, 60]),
        ];
        let spec = aggregate(&designs);
        assert_eq!(spec.spacing.margins, vec![20, 30, 40, 50]);
    }

    #[test]
    fn test_positionwise_ragged_arrays() {
        let a: &[u32] = &[10, 21];
        let b: &[u32] = &[20];
        assert_eq!(average_positionwise(&[a, b], &[44, 32, 18, 16]), vec![15, 21, 18, 16]);
    }

    #[test]
    fn test_positionwise_longer_than_defaults() {
        let a: &[u32] = &[1, 2, 3];
        assert_eq!(average_positionwise(&[a], &[9]), vec![1, 2, 3]);
        let empty: &[u32] = &[];
        assert_eq!(average_positionwise(&[empty], &[5, 6]), vec![5, 6]);
    }

    #[test]
    fn test_positionwise_rounds() {
        let a: &[u32] = &[1];
        let b: &[u32] = &[2];
        // 1.5 rounds away from zero
        assert_eq!(average_positionwise(&[a, b], &[]), vec![2]);
    }

    #[test]
    fn test_top_k_limits() {
        let palette: Vec<String> = (0..12).map(|i| format!("#0000{:02X}", i)).collect();
        let mut d = ExtractedDesign::fallback(vec![], 70);
        d.color_palette = palette;
        let spec = aggregate(&[d]);
        assert_eq!(spec.color_palette.len(), TOP_COLORS);
    }

    #[test]
    fn test_text_color_always_white() {
        let designs = vec![design(&["#FFFFFF", "#EEEEEE"], &[])];
        let spec = aggregate(&designs);
        assert_eq!(spec.design_spec.background_color, "#FFFFFF");
        assert_eq!(spec.design_spec.text_color, "#FFFFFF");
    }

    #[test]
    fn test_custom_colors_fallback_when_few_colors() {
        let designs = vec![design(&["#123456"], &[])];
        let spec = aggregate(&designs);
        let colors = spec.design_spec.custom_colors.unwrap();
        assert_eq!(colors.primary, "#123456");
        assert_eq!(colors.secondary, defaults::DEFAULT_SECONDARY);
        assert_eq!(colors.accent, defaults::DEFAULT_ACCENT);
    }

    #[test]
    fn test_quality_is_mean() {
        let mut a = design(&["#000000"], &[]);
        a.quality_score = 90;
        let mut b = design(&["#000000"], &[]);
        b.quality_score = 61;
        assert_eq!(aggregate(&[a, b]).quality_score, 76);
    }

    #[test]
    fn test_aggregate_is_pure() {
        let designs = vec![
            design(&["#AAA111", "#BBB222"], &[10, 20, 30, 40]),
            design(&["#CCC333"], &[30, 40, 50, 60]),
        ];
        assert_eq!(aggregate(&designs), aggregate(&designs));
    }

    #[test]
    fn test_rank_by_frequency_ties_keep_first_seen() {
        let ranked = rank_by_frequency(
            ["b", "a", "c", "a", "b"].iter().map(|s| s.to_string()),
            10,
        );
        assert_eq!(ranked, vec!["b", "a", "c"]);
    }
}
