//! Lenient JSON recovery for generative backend output.
//!
//! Models wrap JSON in markdown fences and sprinkle `//` or `/* */`
//! comments through it. [`parse_lenient_object`] strips both (outside of
//! string literals) and parses the first balanced object it finds.

use serde_json::Value;

const FENCE: &str = "```";

/// Remove markdown code fence markers (```` ``` ```` and ```` ```json ````).
///
/// Only the markers go; text sharing a line with a fence is kept, so a
/// single-line ```` ```json {...} ``` ```` reply still yields its object.
pub fn strip_code_fences(text: &str) -> String {
    text.lines().map(strip_fence_markers).collect::<Vec<_>>().join("\n")
}

fn strip_fence_markers(line: &str) -> &str {
    let mut rest = line;
    if let Some(after) = rest.trim_start().strip_prefix(FENCE) {
        // Language tag, e.g. `json`
        let tag_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(after.len());
        rest = &after[tag_len..];
    }
    match rest.trim_end().strip_suffix(FENCE) {
        Some(before) => before,
        None => rest,
    }
}

/// Remove `//` line comments and `/* */` block comments that sit outside
/// of JSON string literals.
pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escape_next = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if in_string {
            out.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (ch, chars.get(i + 1)) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
                i += 1;
            }
            ('/', Some('/')) => {
                // Skip to end of line, keep the newline
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

/// Find the first balanced `{ ... }` object, string-aware.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match ch {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Clean fenced, commented model output and parse its first JSON object.
///
/// Returns a human-readable reason on failure.
pub fn parse_lenient_object(raw: &str) -> Result<Value, String> {
    let cleaned = strip_comments(&strip_code_fences(raw));
    let object = first_json_object(&cleaned)
        .ok_or_else(|| "no balanced JSON object in response".to_string())?;

    serde_json::from_str::<Value>(object).map_err(|e| format!("invalid JSON object: {}", e))
}
