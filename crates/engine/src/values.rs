//! Tolerant readers for loosely shaped model JSON.
//!
//! Models return strings where numbers are expected ("44px"), a single
//! string where a list is expected, and snake_case where camelCase was
//! asked for. These helpers accept all of that and return `None` when a
//! field is missing or carries nothing usable, so callers can apply
//! defaults.

use deckstyle_core::defaults;
use deckstyle_core::types::{CustomColors, DesignSpec, Typography};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Leading number of a value such as `44`, `44px`, `18.5 pt`, `-5`.
static LEADING_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").unwrap());

/// First present field among `keys`.
pub fn field<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k)).filter(|v| !v.is_null())
}

/// A non-blank string.
pub fn string_value(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A list of non-blank strings; a single string is split on commas.
pub fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<String> = match value? {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
        _ => return None,
    };

    let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// A finite number from a JSON number or a numeric prefix.
fn signed_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => LEADING_NUMBER_REGEX
            .captures(s)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A non-negative number, rounded, from a JSON number or a numeric prefix.
pub fn number(value: &Value) -> Option<u32> {
    signed_number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32)
}

/// A list of numbers. A single number stands for every side of a box.
pub fn number_list(value: Option<&Value>, single_repeat: usize) -> Option<Vec<u32>> {
    let items: Vec<u32> = match value? {
        Value::Array(items) => items.iter().filter_map(number).collect(),
        single @ (Value::Number(_) | Value::String(_)) => {
            vec![number(single)?; single_repeat.max(1)]
        }
        _ => return None,
    };
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// A quality score clamped to 0..=100. `None` only when the value is
/// missing or not numeric.
pub fn quality(value: Option<&Value>) -> Option<u8> {
    value
        .and_then(signed_number)
        .map(|q| q.round().clamp(0.0, 100.0) as u8)
}

/// Complete a partial `designSpec` object from the palette, layout and
/// typography it was extracted alongside.
pub fn design_spec_from_value(
    value: Option<&Value>,
    palette: &[String],
    layout: &str,
    typography: &Typography,
) -> DesignSpec {
    let empty = Value::Null;
    let spec = value.filter(|v| v.is_object()).unwrap_or(&empty);
    let color = |i: usize, fallback: &str| {
        palette
            .get(i)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };
    let spec_color = |keys: &[&str]| {
        string_value(field(spec, keys)).map(|c| deckstyle_core::normalize::normalize_color(&c))
    };

    let custom = field(spec, &["customColors", "custom_colors"]).unwrap_or(&empty);
    let custom_color = |keys: &[&str], i: usize, fallback: &str| {
        string_value(field(custom, keys))
            .map(|c| deckstyle_core::normalize::normalize_color(&c))
            .unwrap_or_else(|| color(i, fallback))
    };

    DesignSpec {
        background_color: spec_color(&["backgroundColor", "background_color"])
            .unwrap_or_else(|| color(0, defaults::DEFAULT_BACKGROUND)),
        text_color: spec_color(&["textColor", "text_color"])
            .unwrap_or_else(|| defaults::DEFAULT_TEXT_COLOR.to_string()),
        layout: string_value(field(spec, &["layout"])).unwrap_or_else(|| layout.to_string()),
        icon: string_value(field(spec, &["icon"]))
            .unwrap_or_else(|| defaults::DEFAULT_ICON.to_string()),
        font_family: string_value(field(spec, &["fontFamily", "font_family"]))
            .or_else(|| typography.fonts.first().cloned()),
        font_size: field(spec, &["fontSize", "font_size"])
            .and_then(number)
            .or_else(|| typography.sizes.first().copied()),
        custom_colors: Some(CustomColors {
            primary: custom_color(&["primary"], 0, defaults::DEFAULT_BACKGROUND),
            secondary: custom_color(&["secondary"], 1, defaults::DEFAULT_SECONDARY),
            accent: custom_color(&["accent"], 2, defaults::DEFAULT_ACCENT),
        }),
    }
}
