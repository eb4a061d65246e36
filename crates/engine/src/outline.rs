//! Styled outline synthesis.
//!
//! The instruction sent to the model is layered, later layers winning:
//!
//! 1. base design guidance, plus a preset's role styles (named, or picked
//!    from the request's topics when nothing else styles the deck)
//! 2. the active aggregated style, which overrides the base guidance
//! 3. matched exemplars, transcribed verbatim
//! 4. output format constraints
//!
//! The reply must be strict JSON; it is then validated slide by slide.

use deckstyle_backend::{ChatMessage, ChatRequest, InferenceBackend, ModelChain, ResponseFormat};
use deckstyle_core::normalize::{tokenize_keywords, truncate_chars};
use deckstyle_core::presets::{find_preset, preset_for_topics};
use deckstyle_core::types::Typography;
use deckstyle_core::{
    defaults, AggregatedDesignSpec, Error, ManualDesignSet, MatchedDesign, Result, SlideOutline,
    SlideSpec,
};
use serde_json::Value;

use crate::config::OutlineSettings;
use crate::failover::{chain_error, Stage};
use crate::values::{design_spec_from_value, field, string_value};

const BASE_GUIDANCE: &str = "You are an expert presentation designer. Turn the source material \
into a clear, well structured slide deck. Pick one cohesive color scheme with strong contrast, \
readable typography and, for every slide, a layout that fits its content.";

/// Slide roles described by a preset, in deck order.
const PRESET_ROLES: [&str; 4] = ["title", "content", "section", "closing"];

/// Source characters scanned for topics when picking a preset.
const TOPIC_SAMPLE_CHARS: usize = 2000;

const FORMAT_CONSTRAINTS: &str = r##"OUTPUT FORMAT:
Respond with a single JSON object and nothing else. No markdown, no code fences, no comments.
Produce between 5 and 12 slides. Keep bullets concise: at most 5 per slide, under 15 words each.
Shape:
{
  "title": "Deck title",
  "slides": [
    {
      "title": "Slide title",
      "bullets": ["..."],
      "role": "title | content | section | closing",
      "notes": "optional speaker notes",
      "design": {
        "backgroundColor": "#RRGGBB",
        "textColor": "#RRGGBB",
        "layout": "title-and-bullets",
        "icon": "none",
        "fontFamily": "...",
        "fontSize": 32,
        "customColors": {"primary": "#RRGGBB", "secondary": "#RRGGBB", "accent": "#RRGGBB"}
      }
    }
  ]
}"##;

/// Re-run an outline with a change request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Refinement {
    pub instruction: String,
    pub prior_slides: Vec<SlideSpec>,
}

/// Style inputs for one synthesis.
#[derive(Debug, Clone, Default)]
pub struct OutlineOptions {
    /// Built-in preset id.
    pub preset: Option<String>,
    pub matched: Vec<MatchedDesign>,
    pub aggregated: Option<AggregatedDesignSpec>,
    pub refinement: Option<Refinement>,
}

#[derive(Debug, Clone)]
pub struct OutlineSynthesizer {
    chain: ModelChain,
    settings: OutlineSettings,
}

impl OutlineSynthesizer {
    pub fn new(chain: ModelChain, settings: OutlineSettings) -> Self {
        Self { chain, settings }
    }

    /// Generate a styled outline for `cleaned_text`.
    pub fn synthesize(
        &self,
        backend: &dyn InferenceBackend,
        cleaned_text: &str,
        prompt: Option<&str>,
        options: &OutlineOptions,
    ) -> Result<SlideOutline> {
        if cleaned_text.trim().is_empty() && options.refinement.is_none() {
            return Err(Error::InvalidInput("source text is empty".to_string()));
        }

        let preset = match options.preset.as_deref() {
            Some(id) => Some(
                find_preset(id)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown preset {:?}", id)))?,
            ),
            None => self.topic_preset(cleaned_text, prompt, options),
        };

        let system = build_instructions(options, preset.as_ref());
        let user = self.build_user_message(cleaned_text, prompt, options)?;

        let success = self
            .chain
            .run(backend, |model| ChatRequest {
                model: model.to_string(),
                messages: vec![
                    ChatMessage::system(system.as_str()),
                    ChatMessage::user(user.as_str()),
                ],
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                response_format: Some(ResponseFormat::JsonObject),
            })
            .map_err(|e| chain_error(Stage::Outline, e))?;

        let outline = parse_outline(&success.content)?;
        log::info!("Outline with {} slides from {}", outline.slides.len(), success.model);
        Ok(outline)
    }

    /// Preset whose topics best fit the request, when nothing else styles
    /// the deck.
    fn topic_preset(
        &self,
        cleaned_text: &str,
        prompt: Option<&str>,
        options: &OutlineOptions,
    ) -> Option<ManualDesignSet> {
        if !self.settings.auto_preset
            || options.aggregated.is_some()
            || !options.matched.is_empty()
            || options.refinement.is_some()
        {
            return None;
        }

        let mut topics = tokenize_keywords(prompt.unwrap_or(""));
        topics.extend(tokenize_keywords(truncate_chars(cleaned_text, TOPIC_SAMPLE_CHARS)));
        let preset = preset_for_topics(&topics)?;
        log::debug!("Picked preset {} from topics {:?}", preset.id, topics);
        Some(preset)
    }

    fn build_user_message(
        &self,
        cleaned_text: &str,
        prompt: Option<&str>,
        options: &OutlineOptions,
    ) -> Result<String> {
        let source = truncate_chars(cleaned_text.trim(), self.settings.max_source_chars);
        if source.len() < cleaned_text.trim().len() {
            log::debug!("Source text truncated to {} chars", self.settings.max_source_chars);
        }

        let mut message = String::new();
        if let Some(refinement) = &options.refinement {
            let prior = serde_json::to_string_pretty(&refinement.prior_slides)
                .map_err(|e| Error::InvalidInput(format!("prior slides: {}", e)))?;
            message.push_str(
                "Refine the existing outline below. Keep what the instruction does not change.\n",
            );
            message.push_str(&format!(
                "Instruction: {}\n\nCurrent slides:\n{}\n",
                refinement.instruction.trim(),
                prior
            ));
        } else if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
            message.push_str(&format!("Request: {}\n", prompt));
        }

        if !source.is_empty() {
            message.push_str(&format!("\nSource material:\n{}", source));
        }
        Ok(message)
    }
}

/// Layered system instruction; see the module docs for the order.
pub fn build_instructions(options: &OutlineOptions, preset: Option<&ManualDesignSet>) -> String {
    let mut sections = vec![BASE_GUIDANCE.to_string()];

    if let Some(preset) = preset {
        let mut section = format!("Use the \"{}\" style. Per slide role:", preset.name);
        for role in PRESET_ROLES {
            if let Some(design) = preset.style_for(role) {
                section.push_str(&format!("\n- {}: {}", role, describe_spec(design)));
            }
        }
        sections.push(section);
    }

    if let Some(aggregated) = &options.aggregated {
        sections.push(aggregated_section(aggregated));
    }

    if !options.matched.is_empty() {
        sections.push(exemplar_section(&options.matched, options.aggregated.is_some()));
    }

    sections.push(FORMAT_CONSTRAINTS.to_string());
    sections.join("\n\n")
}

fn describe_spec(spec: &deckstyle_core::DesignSpec) -> String {
    let mut parts = vec![
        format!("background {}", spec.background_color),
        format!("text {}", spec.text_color),
        format!("layout {}", spec.layout),
    ];
    if let Some(font) = &spec.font_family {
        parts.push(format!("font {}", font));
    }
    if let Some(size) = spec.font_size {
        parts.push(format!("size {}pt", size));
    }
    if spec.icon != defaults::DEFAULT_ICON {
        parts.push(format!("icon {}", spec.icon));
    }
    parts.join(", ")
}

fn aggregated_section(spec: &AggregatedDesignSpec) -> String {
    format!(
        "MANDATORY HOUSE STYLE. This overrides the guidance above; apply it to every slide.\n\
         - Color palette (use these exact hex values): {}\n\
         - Background: {}, text: {}\n\
         - Fonts: {}; sizes (title first): {}; weights: {}\n\
         - Layouts, preferred first: {}\n\
         - Style: {}",
        spec.color_palette.join(", "),
        spec.design_spec.background_color,
        spec.design_spec.text_color,
        spec.typography.fonts.join(", "),
        join_numbers(&spec.typography.sizes),
        spec.typography.weights.join(", "),
        spec.layout_patterns.join(", "),
        if spec.style_keywords.is_empty() {
            "clean".to_string()
        } else {
            spec.style_keywords.join(", ")
        },
    )
}

fn exemplar_section(matched: &[MatchedDesign], has_aggregated: bool) -> String {
    let mut section = String::from(
        "REFERENCE DESIGNS. Transcribe these verbatim: \
         copy hex codes, font names and sizes exactly.",
    );
    for (i, m) in matched.iter().enumerate() {
        let design = &m.extracted_design;
        section.push_str(&format!(
            "\n{}. palette {}; fonts {}; sizes {}; layout {}; margins {}",
            i + 1,
            design.color_palette.join(", "),
            design.typography.fonts.join(", "),
            join_numbers(&design.typography.sizes),
            design.layout_pattern,
            join_numbers(&design.spacing.margins),
        ));
    }
    if has_aggregated {
        section.push_str(
            "\nWhere a reference design conflicts with the house style, \
             the house style colors and fonts take priority.",
        );
    }
    section
}

fn join_numbers(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_error(reason: impl Into<String>, raw: &str) -> Error {
    Error::OutlineParse {
        reason: reason.into(),
        raw: raw.to_string(),
    }
}

/// Parse and validate an outline reply.
///
/// The reply must be strict JSON (surrounding whitespace aside) with a
/// non-empty `slides` array; every slide needs a non-blank title and a
/// design object. Missing bullets become an empty list.
pub fn parse_outline(raw: &str) -> Result<SlideOutline> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| parse_error(e.to_string(), raw))?;

    let slides = value
        .get("slides")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("missing slides array", raw))?;
    if slides.is_empty() {
        return Err(parse_error("slides array is empty", raw));
    }

    let slides = slides
        .iter()
        .enumerate()
        .map(|(i, slide)| {
            parse_slide(slide)
                .map_err(|reason| parse_error(format!("slide {}: {}", i + 1, reason), raw))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SlideOutline {
        title: string_value(value.get("title")),
        slides,
    })
}

fn parse_slide(slide: &Value) -> std::result::Result<SlideSpec, String> {
    if !slide.is_object() {
        return Err("not an object".to_string());
    }
    let title = string_value(slide.get("title")).ok_or("missing title")?;
    let design = slide
        .get("design")
        .filter(|d| d.is_object())
        .ok_or("missing design object")?;

    let bullets = match slide.get("bullets") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.trim().to_string()],
        Some(_) => return Err("bullets is not a list".to_string()),
    };

    let no_typography = Typography {
        fonts: Vec::new(),
        sizes: Vec::new(),
        weights: Vec::new(),
    };
    let mut spec =
        design_spec_from_value(Some(design), &[], defaults::DEFAULT_LAYOUT, &no_typography);
    if field(design, &["customColors", "custom_colors"]).is_none() {
        spec.custom_colors = None;
    }

    Ok(SlideSpec {
        title,
        bullets,
        design: spec,
        role: string_value(slide.get("role")),
        notes: string_value(field(slide, &["notes", "speakerNotes"])),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckstyle_core::aggregate::default_aggregate;
    use deckstyle_core::ExtractedDesign;

    const VALID: &str = r##"{
        "title": "Q3 Review",
        "slides": [
            {"title": "Q3 Review", "role": "title",
             "design": {"backgroundColor": "#0B3C5D", "textColor": "#FFFFFF",
                        "layout": "title-center", "icon": "none"}},
            {"title": "Revenue", "bullets": ["Up 12%", " "],
             "design": {"backgroundColor": "ffffff", "textColor": "#0B3C5D",
                        "customColors": {"primary": "#0B3C5D"}}}
        ]
    }"##;

    #[test]
    fn test_parse_valid_outline() {
        let outline = parse_outline(VALID).unwrap();
        assert_eq!(outline.title.as_deref(), Some("Q3 Review"));
        assert_eq!(outline.slides.len(), 2);

        let first = &outline.slides[0];
        assert!(first.bullets.is_empty());
        assert_eq!(first.role.as_deref(), Some("title"));
        assert_eq!(first.design.custom_colors, None);
        assert_eq!(first.design.font_family, None);

        let second = &outline.slides[1];
        assert_eq!(second.bullets, vec!["Up 12%"]);
        assert_eq!(second.design.background_color, "#FFFFFF");
        assert_eq!(second.design.layout, "title-and-bullets");
        assert_eq!(second.design.custom_colors.as_ref().unwrap().primary, "#0B3C5D");
    }

    #[test]
    fn test_outline_is_strict_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        let err = parse_outline(&fenced).unwrap_err();
        assert!(matches!(err, Error::OutlineParse { .. }));
        assert_eq!(err.raw_content(), Some(fenced.as_str()));
    }

    #[test]
    fn test_outline_validation() {
        let cases = [
            r#"{"title": "x"}"#,
            r#"{"slides": []}"#,
            r#"{"slides": [{"design": {}}]}"#,
            r#"{"slides": [{"title": "  ", "design": {}}]}"#,
            r#"{"slides": [{"title": "A"}]}"#,
            r#"{"slides": [{"title": "A", "design": "blue"}]}"#,
            r#"{"slides": [{"title": "A", "design": {}, "bullets": 3}]}"#,
        ];
        for raw in cases {
            assert!(
                matches!(parse_outline(raw), Err(Error::OutlineParse { .. })),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_instruction_layers_in_order() {
        let matched = MatchedDesign {
            design_id: "e1".into(),
            match_score: 79.0,
            keywords: vec!["tech".into()],
            extracted_design: ExtractedDesign::fallback(vec![], 80),
            category: "general".into(),
        };
        let options = OutlineOptions {
            matched: vec![matched],
            aggregated: Some(default_aggregate()),
            ..Default::default()
        };
        let preset = find_preset("ocean-corporate");

        let text = build_instructions(&options, preset.as_ref());
        let base = text.find("expert presentation designer").unwrap();
        let preset_at = text.find("Ocean Corporate").unwrap();
        let house = text.find("MANDATORY HOUSE STYLE").unwrap();
        let reference = text.find("REFERENCE DESIGNS").unwrap();
        let format = text.find("OUTPUT FORMAT").unwrap();

        assert!(base < preset_at && preset_at < house && house < reference && reference < format);
        assert!(text.contains("house style colors and fonts take priority"));
    }

    #[test]
    fn test_preset_section_lists_every_role() {
        let preset = find_preset("ocean-corporate");
        let text = build_instructions(&OutlineOptions::default(), preset.as_ref());

        let title = text.find("- title: background #0B3C5D").unwrap();
        let content = text.find("- content: background #FFFFFF").unwrap();
        let section = text.find("- section: background #328CC1").unwrap();
        let closing = text.find("- closing: background #0B3C5D, text #D9B310").unwrap();
        assert!(title < content && content < section && section < closing);
        assert!(text.contains("layout two-column, font Lato, size 18pt, icon chart"));
    }

    #[test]
    fn test_plain_instructions_have_no_style_layers() {
        let text = build_instructions(&OutlineOptions::default(), None);
        assert!(!text.contains("MANDATORY HOUSE STYLE"));
        assert!(!text.contains("REFERENCE DESIGNS"));
        assert!(text.contains("between 5 and 12 slides"));
    }
}
