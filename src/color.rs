//! Spine color handling.
//!
//! Notes can name their spine color three ways: a hex value, a friendly
//! color name, or not at all. Unnamed spines cycle through a pastel
//! palette so adjacent books stay distinguishable. Everything else here
//! derives from the resolved color: darkened and lightened edges for the
//! 3D book effect, and a readable text color picked by luminance.

/// Fallback palette for books without an explicit color, cycled by
/// position in the stack.
pub const PASTEL_COLORS: &[&str] = &[
    "#e8b4b8", "#ead1dc", "#f5deb3", "#d4e6d7", "#c5d8e8", "#d8c5e8",
];

/// Pick the fallback pastel for a book at `index` in its stack.
pub fn pastel_color(index: usize) -> &'static str {
    PASTEL_COLORS[index % PASTEL_COLORS.len()]
}

/// Resolve a user-supplied color to something CSS understands.
///
/// Hex values pass through untouched. A small set of friendly names maps
/// to material-ish hex values. Anything else passes through as-is and is
/// left to the browser.
pub fn parse_color(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('#') {
        return trimmed.to_string();
    }
    let named = match trimmed.to_lowercase().as_str() {
        "red" => "#f44336",
        "blue" => "#2196f3",
        "green" => "#4caf50",
        "yellow" => "#ffeb3b",
        "orange" => "#ff9800",
        "purple" => "#9c27b0",
        "pink" => "#e91e63",
        "brown" => "#795548",
        "gray" | "grey" => "#9e9e9e",
        "black" => "#212121",
        "white" => "#fafafa",
        "gold" => "#ffd700",
        "navy" => "#001f3f",
        "teal" => "#009688",
        "maroon" => "#800000",
        _ => return trimmed.to_string(),
    };
    named.to_string()
}

/// Lighten (positive percent) or darken (negative percent) a hex color.
///
/// Non-hex input passes through unchanged, so named CSS colors that
/// slipped past [`parse_color`] degrade to flat spines instead of
/// breaking the page.
pub fn adjust_brightness(color: &str, percent: f64) -> String {
    let Some((r, g, b)) = parse_hex(color) else {
        return color.to_string();
    };
    let adjust = |c: u8| -> u8 {
        let c = f64::from(c);
        (c + c * percent / 100.0).clamp(0.0, 255.0).round() as u8
    };
    format!("#{:02x}{:02x}{:02x}", adjust(r), adjust(g), adjust(b))
}

/// Pick dark or light text for a spine background.
///
/// Uses the perceived-luminance weighting (0.299 R, 0.587 G, 0.114 B);
/// backgrounds above the midpoint get dark text. Unparseable colors get
/// dark text, which reads fine on the pastel fallbacks.
pub fn contrast_text_color(color: &str) -> &'static str {
    let Some((r, g, b)) = parse_hex(color) else {
        return "#333333";
    };
    let luminance =
        (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
    if luminance > 0.5 { "#333333" } else { "#f5f5f5" }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let digits = color.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}
