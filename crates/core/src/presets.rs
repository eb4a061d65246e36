//! Built-in manual design sets.
//!
//! A small lookup table of hand-made deck styles, selectable by id when
//! synthesizing an outline. Presets do not take part in ranking.

use serde::{Deserialize, Serialize};

use crate::normalize::keywords_match;
use crate::types::{CustomColors, DesignSpec};

/// Style for one slide role (title, content, section, closing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleStyle {
    pub role: String,
    pub design: DesignSpec,
}

/// A hand-curated deck style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualDesignSet {
    pub id: String,
    pub name: String,
    pub topic_keywords: Vec<String>,
    /// Ordered by role: title first, closing last.
    pub slide_styles: Vec<RoleStyle>,
}

impl ManualDesignSet {
    /// Style for a role, falling back to the first style.
    pub fn style_for(&self, role: &str) -> Option<&DesignSpec> {
        self.slide_styles
            .iter()
            .find(|s| s.role.eq_ignore_ascii_case(role))
            .or_else(|| self.slide_styles.first())
            .map(|s| &s.design)
    }
}

fn style(
    role: &str,
    background: &str,
    text: &str,
    layout: &str,
    icon: &str,
    font: &str,
    size: u32,
    colors: [&str; 3],
) -> RoleStyle {
    RoleStyle {
        role: role.to_string(),
        design: DesignSpec {
            background_color: background.to_string(),
            text_color: text.to_string(),
            layout: layout.to_string(),
            icon: icon.to_string(),
            font_family: Some(font.to_string()),
            font_size: Some(size),
            custom_colors: Some(CustomColors {
                primary: colors[0].to_string(),
                secondary: colors[1].to_string(),
                accent: colors[2].to_string(),
            }),
        },
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// All built-in presets.
pub fn builtin_presets() -> Vec<ManualDesignSet> {
    const SUNSET: [&str; 3] = ["#FF6B35", "#F7931E", "#2D3436"];
    const OCEAN: [&str; 3] = ["#0B3C5D", "#328CC1", "#D9B310"];
    const SLATE: [&str; 3] = ["#1E1E24", "#92140C", "#FFF8F0"];
    const MEADOW: [&str; 3] = ["#2E7D32", "#A5D6A7", "#FFFFFF"];

    vec![
        ManualDesignSet {
            id: "sunset-bold".to_string(),
            name: "Sunset Bold".to_string(),
            topic_keywords: keywords(&["marketing", "startup", "pitch", "bold", "orange"]),
            slide_styles: vec![
                style(
                    "title",
                    "#FF6B35",
                    "#FFFFFF",
                    "title-center",
                    "rocket",
                    "Montserrat",
                    44,
                    SUNSET,
                ),
                style(
                    "content",
                    "#FFFFFF",
                    "#2D3436",
                    "title-and-bullets",
                    "check",
                    "Open Sans",
                    20,
                    SUNSET,
                ),
                style(
                    "section",
                    "#F7931E",
                    "#FFFFFF",
                    "section-header",
                    "flag",
                    "Montserrat",
                    36,
                    SUNSET,
                ),
                style(
                    "closing",
                    "#2D3436",
                    "#FFFFFF",
                    "title-center",
                    "star",
                    "Montserrat",
                    40,
                    SUNSET,
                ),
            ],
        },
        ManualDesignSet {
            id: "ocean-corporate".to_string(),
            name: "Ocean Corporate".to_string(),
            topic_keywords: keywords(&["business", "finance", "corporate", "report", "blue"]),
            slide_styles: vec![
                style("title", "#0B3C5D", "#FFFFFF", "title-left", "briefcase", "Lato", 42, OCEAN),
                style("content", "#FFFFFF", "#0B3C5D", "two-column", "chart", "Lato", 18, OCEAN),
                style(
                    "section",
                    "#328CC1",
                    "#FFFFFF",
                    "section-header",
                    "bookmark",
                    "Lato",
                    34,
                    OCEAN,
                ),
                style(
                    "closing",
                    "#0B3C5D",
                    "#D9B310",
                    "title-center",
                    "handshake",
                    "Lato",
                    38,
                    OCEAN,
                ),
            ],
        },
        ManualDesignSet {
            id: "slate-academic".to_string(),
            name: "Slate Academic".to_string(),
            topic_keywords: keywords(&[
                "science",
                "research",
                "mathematics",
                "lecture",
                "education",
            ]),
            slide_styles: vec![
                style(
                    "title",
                    "#1E1E24",
                    "#FFF8F0",
                    "title-center",
                    "book",
                    "Merriweather",
                    40,
                    SLATE,
                ),
                style(
                    "content",
                    "#FFF8F0",
                    "#1E1E24",
                    "title-and-bullets",
                    "lightbulb",
                    "Source Sans Pro",
                    18,
                    SLATE,
                ),
                style(
                    "section",
                    "#92140C",
                    "#FFF8F0",
                    "section-header",
                    "bookmark",
                    "Merriweather",
                    32,
                    SLATE,
                ),
                style(
                    "closing",
                    "#1E1E24",
                    "#FFF8F0",
                    "title-center",
                    "question",
                    "Merriweather",
                    36,
                    SLATE,
                ),
            ],
        },
        ManualDesignSet {
            id: "meadow-fresh".to_string(),
            name: "Meadow Fresh".to_string(),
            topic_keywords: keywords(&["nature", "health", "sustainability", "green", "wellness"]),
            slide_styles: vec![
                style("title", "#2E7D32", "#FFFFFF", "title-center", "leaf", "Nunito", 44, MEADOW),
                style("content", "#FFFFFF", "#2E7D32", "image-left", "check", "Nunito", 18, MEADOW),
                style(
                    "section",
                    "#A5D6A7",
                    "#1B5E20",
                    "section-header",
                    "sprout",
                    "Nunito",
                    34,
                    MEADOW,
                ),
                style(
                    "closing",
                    "#2E7D32",
                    "#FFFFFF",
                    "title-center",
                    "heart",
                    "Nunito",
                    40,
                    MEADOW,
                ),
            ],
        },
    ]
}

/// Look up a preset by id (case-insensitive).
pub fn find_preset(id: &str) -> Option<ManualDesignSet> {
    builtin_presets()
        .into_iter()
        .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

/// The preset whose topic keywords overlap the given keywords most.
pub fn preset_for_topics(topics: &[String]) -> Option<ManualDesignSet> {
    builtin_presets()
        .into_iter()
        .map(|preset| {
            let hits = preset
                .topic_keywords
                .iter()
                .filter(|t| topics.iter().any(|k| keywords_match(k, t)))
                .count();
            (preset, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .fold(None, |best: Option<(ManualDesignSet, usize)>, (preset, hits)| match best {
            Some((_, best_hits)) if best_hits >= hits => best,
            _ => Some((preset, hits)),
        })
        .map(|(preset, _)| preset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset() {
        let preset = find_preset("Ocean-Corporate").unwrap();
        assert_eq!(preset.name, "Ocean Corporate");
        assert!(find_preset("missing").is_none());
    }

    #[test]
    fn test_presets_have_title_role_first() {
        for preset in builtin_presets() {
            assert_eq!(preset.slide_styles[0].role, "title", "{}", preset.id);
        }
    }

    #[test]
    fn test_style_for_role() {
        let preset = find_preset("sunset-bold").unwrap();
        assert_eq!(preset.style_for("section").unwrap().layout, "section-header");
        // Unknown roles fall back to the title style
        assert_eq!(preset.style_for("appendix").unwrap().layout, "title-center");
    }

    #[test]
    fn test_preset_for_topics() {
        let topics = vec!["math".to_string(), "lecture".to_string()];
        assert_eq!(preset_for_topics(&topics).unwrap().id, "slate-academic");
        assert!(preset_for_topics(&["zzz".to_string()]).is_none());
    }
}
