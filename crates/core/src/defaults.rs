//! Default style values used when a design omits a field or when no
//! designs are available at all.

/// Fallback palette, most prominent first.
pub const DEFAULT_PALETTE: &[&str] = &["#FF6B35", "#F7931E", "#FFFFFF", "#2D3436"];

/// Background used when no palette is available.
pub const DEFAULT_BACKGROUND: &str = "#FF6B35";

/// Text color of every synthesized design spec.
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// Title font, then body font.
pub const DEFAULT_FONTS: &[&str] = &["Montserrat", "Open Sans"];

/// Title, subtitle, body and caption sizes in points.
pub const DEFAULT_SIZES: &[u32] = &[44, 32, 18, 16];

pub const DEFAULT_WEIGHTS: &[&str] = &["normal", "bold"];

pub const DEFAULT_LAYOUT: &str = "title-and-bullets";

pub const DEFAULT_ICON: &str = "none";

/// Top, right, bottom, left.
pub const DEFAULT_MARGINS: &[u32] = &[40, 40, 40, 40];

/// Top, right, bottom, left.
pub const DEFAULT_PADDING: &[u32] = &[20, 20, 20, 20];

/// Quality assumed for an extraction that does not report one.
pub const DEFAULT_EXTRACTION_QUALITY: u8 = 70;

/// Quality of the aggregated spec when no input reports one.
pub const DEFAULT_AGGREGATE_QUALITY: u8 = 80;

/// Secondary and accent colors used when fewer than three colors are known.
pub const DEFAULT_SECONDARY: &str = "#F7931E";
pub const DEFAULT_ACCENT: &str = "#2D3436";

pub(crate) fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
