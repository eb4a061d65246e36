//! Domain types for design exemplars, extracted and aggregated styles,
//! match results and slide outlines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{self, owned};

/// Category tag prefix marking an exemplar as part of a curated set.
pub const USER_SET_PREFIX: &str = "user-set:";

/// Build the category tag for a curated set id.
pub fn set_category(set_id: &str) -> String {
    format!("{}{}", USER_SET_PREFIX, set_id)
}

/// Parse the set id out of a `user-set:<id>` category tag.
///
/// Returns `None` for other tags and for an empty id.
pub fn parse_set_id(category_tag: &str) -> Option<&str> {
    category_tag
        .strip_prefix(USER_SET_PREFIX)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Font families, sizes and weights, ordered by role (title first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub fonts: Vec<String>,
    pub sizes: Vec<u32>,
    pub weights: Vec<String>,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            fonts: owned(defaults::DEFAULT_FONTS),
            sizes: defaults::DEFAULT_SIZES.to_vec(),
            weights: owned(defaults::DEFAULT_WEIGHTS),
        }
    }
}

/// Margins and padding, each as top/right/bottom/left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub margins: Vec<u32>,
    pub padding: Vec<u32>,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            margins: defaults::DEFAULT_MARGINS.to_vec(),
            padding: defaults::DEFAULT_PADDING.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// A single canonical slide style, as consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSpec {
    pub background_color: String,
    pub text_color: String,
    pub layout: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<CustomColors>,
}

impl Default for DesignSpec {
    fn default() -> Self {
        Self {
            background_color: defaults::DEFAULT_BACKGROUND.to_string(),
            text_color: defaults::DEFAULT_TEXT_COLOR.to_string(),
            layout: defaults::DEFAULT_LAYOUT.to_string(),
            icon: defaults::DEFAULT_ICON.to_string(),
            font_family: None,
            font_size: None,
            custom_colors: None,
        }
    }
}

/// The structured style read from one reference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDesign {
    /// Hex colors, most prominent first.
    pub color_palette: Vec<String>,
    pub typography: Typography,
    pub layout_pattern: String,
    pub spacing: Spacing,
    pub style_keywords: Vec<String>,
    /// 0..=100.
    pub quality_score: u8,
    pub design_spec: DesignSpec,
}

impl ExtractedDesign {
    /// Default design attached to an exemplar that has keywords but no
    /// stored analysis.
    pub fn fallback(style_keywords: Vec<String>, quality_score: u8) -> Self {
        let palette = owned(defaults::DEFAULT_PALETTE);
        let typography = Typography::default();
        let design_spec = DesignSpec {
            font_family: typography.fonts.first().cloned(),
            font_size: typography.sizes.first().copied(),
            custom_colors: Some(CustomColors {
                primary: palette[0].clone(),
                secondary: palette[1].clone(),
                accent: palette[3].clone(),
            }),
            ..DesignSpec::default()
        };

        Self {
            color_palette: palette,
            typography,
            layout_pattern: defaults::DEFAULT_LAYOUT.to_string(),
            spacing: Spacing::default(),
            style_keywords,
            quality_score: quality_score.min(100),
            design_spec,
        }
    }
}

/// One composite style merged from many extracted designs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDesignSpec {
    pub color_palette: Vec<String>,
    pub typography: Typography,
    pub layout_patterns: Vec<String>,
    pub spacing: Spacing,
    pub style_keywords: Vec<String>,
    pub quality_score: u8,
    pub design_spec: DesignSpec,
    /// Number of designs that went into this spec.
    pub source_count: usize,
}

/// A stored, previously analyzed reference design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignExemplar {
    pub id: String,
    /// Free-form category; `user-set:<id>` groups curated sets.
    pub category_tag: String,
    /// Case-folded, unique.
    pub keywords: Vec<String>,
    pub extracted_spec: Option<ExtractedDesign>,
    pub quality_score: Option<u8>,
    pub usage_count: u32,
    pub uploaded_by: Option<String>,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DesignExemplar {
    /// The curated set id encoded in the category tag, if any.
    pub fn set_id(&self) -> Option<&str> {
        parse_set_id(&self.category_tag)
    }
}

/// Input for inserting a new exemplar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExemplar {
    pub category_tag: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub extracted_spec: Option<ExtractedDesign>,
    #[serde(default)]
    pub quality_score: Option<u8>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Restricts or biases candidate retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemplarScope {
    /// Only exemplars tagged `user-set:<set_id>`.
    pub set_id: Option<String>,
    /// Exemplars from this uploader are retrieved first. Never filters.
    pub uploader_id: Option<String>,
}

impl ExemplarScope {
    pub fn set(set_id: impl Into<String>) -> Self {
        Self {
            set_id: Some(set_id.into()),
            uploader_id: None,
        }
    }

    pub fn uploader(uploader_id: impl Into<String>) -> Self {
        Self {
            set_id: None,
            uploader_id: Some(uploader_id.into()),
        }
    }
}

/// A ranked exemplar returned by matching. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedDesign {
    pub design_id: String,
    /// 0..=100, rounded to two decimals.
    pub match_score: f64,
    pub keywords: Vec<String>,
    pub extracted_design: ExtractedDesign,
    pub category: String,
}

/// The most recently curated set and its aggregated style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDesignSet {
    pub set_id: String,
    pub spec: AggregatedDesignSpec,
}

/// One slide of a synthesized outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    pub design: DesignSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A styled, slide-by-slide plan for a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideOutline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub slides: Vec<SlideSpec>,
}
