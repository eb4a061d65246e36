//! Design extraction from reference images.
//!
//! A vision model is asked for a strict JSON description of the slide's
//! palette, typography, layout and spacing. The reply is cleaned (code
//! fences, comments), the first JSON object is parsed, and every missing
//! field gets its default.

use deckstyle_backend::{ChatMessage, ChatRequest, InferenceBackend, ModelChain, ResponseFormat};
use deckstyle_core::json::parse_lenient_object;
use deckstyle_core::normalize::{normalize_keywords, normalize_palette};
use deckstyle_core::types::{ExtractedDesign, Spacing, Typography};
use deckstyle_core::{defaults, Error, Result};

use crate::config::ExtractionSettings;
use crate::failover::{chain_error, Stage};
use crate::values::{
    design_spec_from_value, field, number_list, quality, string_list, string_value,
};

const SYSTEM_PROMPT: &str = "You are a presentation design analyst. You read slide images with \
pixel precision and report exactly what you see. You answer with a single JSON object and \
nothing else.";

const EXTRACTION_INSTRUCTIONS: &str = r##"Analyze this slide design and describe it precisely.

Rules:
- Report exact hex colors (#RRGGBB) sampled from the image, most prominent first.
- Name the actual font families you see; if unsure, name the closest common web font.
- Font sizes are in points, title first.
- Margins and padding are in pixels, in top/right/bottom/left order.
- qualityScore rates the design from 0 to 100.

Return JSON with exactly this shape:
{
  "colorPalette": ["#RRGGBB", "..."],
  "typography": {"fonts": ["..."], "sizes": [44, 32, 18], "weights": ["bold", "normal"]},
  "layoutPattern": "title-and-bullets",
  "spacing": {"margins": [40, 40, 40, 40], "padding": [20, 20, 20, 20]},
  "styleKeywords": ["modern", "minimal"],
  "qualityScore": 85,
  "designSpec": {
    "backgroundColor": "#RRGGBB",
    "textColor": "#RRGGBB",
    "layout": "title-and-bullets",
    "icon": "none",
    "fontFamily": "...",
    "fontSize": 44,
    "customColors": {"primary": "#RRGGBB", "secondary": "#RRGGBB", "accent": "#RRGGBB"}
  }
}"##;

/// Vision-model design extractor.
#[derive(Debug, Clone)]
pub struct DesignExtractor {
    chain: ModelChain,
    settings: ExtractionSettings,
}

impl DesignExtractor {
    pub fn new(chain: ModelChain, settings: ExtractionSettings) -> Self {
        Self { chain, settings }
    }

    /// Extract the design shown at `image_ref` (URL or `data:` URI).
    ///
    /// Topic keywords, when given, are passed to the model as context.
    pub fn extract(
        &self,
        backend: &dyn InferenceBackend,
        image_ref: &str,
        keywords: &[String],
    ) -> Result<ExtractedDesign> {
        if image_ref.trim().is_empty() {
            return Err(Error::InvalidInput("image reference is empty".to_string()));
        }

        let prompt = build_prompt(keywords);
        let success = self
            .chain
            .run(backend, |model| ChatRequest {
                model: model.to_string(),
                messages: vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user_with_image(prompt.as_str(), image_ref),
                ],
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                response_format: Some(ResponseFormat::JsonObject),
            })
            .map_err(|e| chain_error(Stage::Extraction, e))?;

        log::debug!("Design extracted by {}", success.model);
        parse_extracted_design(&success.content)
    }
}

fn build_prompt(keywords: &[String]) -> String {
    if keywords.is_empty() {
        EXTRACTION_INSTRUCTIONS.to_string()
    } else {
        format!(
            "{}\n\nThe deck is about: {}. Include fitting style keywords.",
            EXTRACTION_INSTRUCTIONS,
            keywords.join(", ")
        )
    }
}

/// Parse a vision model reply into an [`ExtractedDesign`], filling defaults.
pub fn parse_extracted_design(raw: &str) -> Result<ExtractedDesign> {
    let value = parse_lenient_object(raw).map_err(|reason| Error::ExtractionParse {
        reason,
        raw: raw.to_string(),
    })?;

    let palette = string_list(field(&value, &["colorPalette", "color_palette", "colors"]))
        .map(normalize_palette)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| defaults::DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect());

    let empty = serde_json::Value::Null;
    let typography_value = field(&value, &["typography"]).unwrap_or(&empty);
    let typography = Typography {
        fonts: string_list(field(typography_value, &["fonts", "fontFamilies"]))
            .unwrap_or_else(|| Typography::default().fonts),
        sizes: number_list(field(typography_value, &["sizes", "fontSizes"]), 1)
            .unwrap_or_else(|| defaults::DEFAULT_SIZES.to_vec()),
        weights: string_list(field(typography_value, &["weights", "fontWeights"]))
            .unwrap_or_else(|| Typography::default().weights),
    };

    let layout_pattern = string_value(field(&value, &["layoutPattern", "layout_pattern", "layout"]))
        .unwrap_or_else(|| defaults::DEFAULT_LAYOUT.to_string());

    let spacing_value = field(&value, &["spacing"]).unwrap_or(&empty);
    let spacing = Spacing {
        margins: number_list(field(spacing_value, &["margins", "margin"]), 4)
            .unwrap_or_else(|| defaults::DEFAULT_MARGINS.to_vec()),
        padding: number_list(field(spacing_value, &["padding"]), 4)
            .unwrap_or_else(|| defaults::DEFAULT_PADDING.to_vec()),
    };

    let style_keywords = string_list(field(&value, &["styleKeywords", "style_keywords"]))
        .map(normalize_keywords)
        .unwrap_or_default();

    let quality_score = quality(field(&value, &["qualityScore", "quality_score"]))
        .unwrap_or(defaults::DEFAULT_EXTRACTION_QUALITY);

    let design_spec = design_spec_from_value(
        field(&value, &["designSpec", "design_spec"]),
        &palette,
        &layout_pattern,
        &typography,
    );

    Ok(ExtractedDesign {
        color_palette: palette,
        typography,
        layout_pattern,
        spacing,
        style_keywords,
        quality_score,
        design_spec,
    })
}
