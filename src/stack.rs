//! Spine geometry and presentation math.
//!
//! Everything here is a pure function from book data and stack settings
//! to a number or a string, so the whole visual layer can be tested
//! without touching HTML. The renderer in [`crate::generate`] is a thin
//! shell around these.

use crate::color::{parse_color, pastel_color};

/// Horizontal padding inside a spine, left plus right, in pixels. Space
/// left over after padding is what the title has to fit into.
const SPINE_PADDING: f64 = 24.0;

/// Average glyph width as a fraction of the font size. Good enough for
/// the serif faces the default theme uses.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// Spines taller than this can fit the page-count label under the
/// title.
const PAGE_COUNT_MIN_HEIGHT: u32 = 50;

/// Compute a spine's height in pixels from its page count.
///
/// Page count divided by `pages_per_pixel`, clamped to the configured
/// range, rounded to whole pixels. Thick books get tall spines.
///
/// # Examples
///
/// ```
/// use spinerack::stack::spine_height;
///
/// assert_eq!(spine_height(412, 5.0, 30, 150), 82);
/// assert_eq!(spine_height(90, 5.0, 30, 150), 30);
/// assert_eq!(spine_height(2000, 5.0, 30, 150), 150);
/// ```
pub fn spine_height(pages: u32, pages_per_pixel: f64, min_height: u32, max_height: u32) -> u32 {
    let raw = f64::from(pages) / pages_per_pixel;
    raw.clamp(f64::from(min_height), f64::from(max_height))
        .round() as u32
}

/// Shorten a title to fit the spine's inner width.
///
/// The character budget comes from the spine width minus padding,
/// divided by the estimated glyph width. Over-budget titles are cut one
/// character short of the budget and get an ellipsis; when a space falls
/// in the later half of the cut, the break moves back to it so the label
/// ends on a whole word.
pub fn truncate_title(title: &str, stack_width: u32, font_size: u32) -> String {
    let budget = (f64::from(stack_width) - SPINE_PADDING) / (f64::from(font_size) * GLYPH_WIDTH_RATIO);
    let max_chars = if budget > 0.0 { budget.floor() as usize } else { 0 };

    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_chars {
        return title.to_string();
    }
    if max_chars == 0 {
        return "...".to_string();
    }

    let cut = &chars[..max_chars - 1];
    match cut.iter().rposition(|c| *c == ' ') {
        Some(pos) if pos > max_chars / 2 => {
            let mut label: String = cut[..pos].iter().collect();
            label.push_str("...");
            label
        }
        _ => {
            let mut label: String = cut.iter().collect();
            label.push_str("...");
            label
        }
    }
}

/// Resolve a spine's background color.
///
/// Books that name a color get it (via [`parse_color`]); the rest cycle
/// through the pastel palette by stack position.
pub fn spine_color(explicit: Option<&str>, index: usize) -> String {
    match explicit {
        Some(value) => parse_color(value),
        None => pastel_color(index).to_string(),
    }
}

/// Whether a spine shows its page-count label. Needs the setting on and
/// enough height for a second line.
pub fn shows_page_count(enabled: bool, height: u32) -> bool {
    enabled && height > PAGE_COUNT_MIN_HEIGHT
}
