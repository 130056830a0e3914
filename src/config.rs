//! Site configuration module.
//!
//! Handles loading, validating, and merging `spinerack.toml`. Stock
//! defaults are overridden by an optional config file in the vault root;
//! the file is sparse, so it only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [stack]
//! width = 200               # Spine width in pixels (books lie on their sides)
//! min_spine_height = 30     # Thinnest allowed spine
//! max_spine_height = 150    # Thickest allowed spine
//! pages_per_pixel = 5.0     # Pages represented by one pixel of height
//! border_radius = 8         # Corner rounding on spines, in pixels
//! show_page_count = false   # Show "412p" under the title on tall spines
//!
//! [covers]
//! trim = true               # Crop flat margins off cover scans
//! tolerance = 10            # Trim sensitivity, 0-100 (values above 100 clamp)
//! fit = "upright"           # "upright" or "rotated" cover orientation
//!
//! [theme]
//! font_family = "Georgia, serif"
//! font_size = 12            # Spine label size in pixels
//!
//! [theme.light]
//! background = "#faf8f5"
//! text = "#333333"
//! text_muted = "#777777"    # Breadcrumbs, page counts, hints
//! border = "#e0d8cc"
//! link = "#8b5e3c"
//! link_hover = "#5c3a21"
//!
//! [theme.dark]
//! background = "#1a1716"
//! text = "#e8e2d9"
//! text_muted = "#9a948a"
//! border = "#3a342e"
//! link = "#d4a96a"
//! link_hover = "#e8c288"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Out-of-range values
//! fail validation with the offending key named, except `covers.tolerance`,
//! which clamps to 100 instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::imaging::{CoverFit, CoverParams, Tolerance};

/// Config filename looked up in the vault root. The scanner also skips
/// this file when walking notes.
pub const CONFIG_FILENAME: &str = "spinerack.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `spinerack.toml`.
///
/// All fields have sensible defaults. A user config file need only
/// specify the values it wants to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Stack and spine geometry.
    pub stack: StackConfig,
    /// Cover trimming and orientation.
    pub covers: CoversConfig,
    /// Fonts and color schemes.
    pub theme: ThemeConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack.width == 0 {
            return Err(ConfigError::Validation(
                "stack.width must be non-zero".into(),
            ));
        }
        if self.stack.min_spine_height > self.stack.max_spine_height {
            return Err(ConfigError::Validation(
                "stack.min_spine_height must not exceed stack.max_spine_height".into(),
            ));
        }
        if !self.stack.pages_per_pixel.is_finite() || self.stack.pages_per_pixel <= 0.0 {
            return Err(ConfigError::Validation(
                "stack.pages_per_pixel must be positive".into(),
            ));
        }
        if self.theme.font_size == 0 {
            return Err(ConfigError::Validation(
                "theme.font_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Build the cover-processing parameters for one book.
    ///
    /// Upright covers are constrained by the spine width and the tallest
    /// allowed spine; rotated covers use the spine width as their exact
    /// visual width. A disabled `covers.trim` turns content detection
    /// off entirely.
    pub fn cover_params(&self, source: PathBuf, output: PathBuf) -> CoverParams {
        CoverParams {
            source,
            output,
            trim: self
                .covers
                .trim
                .then(|| Tolerance::new(self.covers.tolerance)),
            fit: self.covers.fit,
            stack_width: self.stack.width,
            max_spine_height: self.stack.max_spine_height,
        }
    }
}

/// Stack and spine geometry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Spine width in pixels. Books lie on their sides, so this is the
    /// horizontal extent of every spine and cover.
    pub width: u32,
    /// Thinnest allowed spine in pixels.
    pub min_spine_height: u32,
    /// Thickest allowed spine in pixels.
    pub max_spine_height: u32,
    /// Pages represented by one pixel of spine height.
    pub pages_per_pixel: f64,
    /// Corner rounding on spines, in pixels.
    pub border_radius: u32,
    /// Show the page count under the title on spines tall enough to fit it.
    pub show_page_count: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            width: 200,
            min_spine_height: 30,
            max_spine_height: 150,
            pages_per_pixel: 5.0,
            border_radius: 8,
            show_page_count: false,
        }
    }
}

/// Cover trimming and orientation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoversConfig {
    /// Crop flat margins off cover scans before resizing.
    pub trim: bool,
    /// Trim sensitivity on the 0-100 user scale. Values above 100 clamp.
    pub tolerance: u32,
    /// Cover orientation on the spine.
    pub fit: CoverFit,
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            trim: true,
            tolerance: 10,
            fit: CoverFit::Upright,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel cover-processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Fonts and color schemes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Font stack for spine labels and body text (CSS value).
    pub font_family: String,
    /// Spine label size in pixels. Also drives title truncation.
    pub font_size: u32,
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            font_family: "Georgia, serif".to_string(),
            font_size: 12,
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background color.
    pub background: String,
    /// Primary text color.
    pub text: String,
    /// Muted/secondary text color (breadcrumbs, page counts, hints).
    pub text_muted: String,
    /// Border color.
    pub border: String,
    /// Link color.
    pub link: String,
    /// Link hover color.
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#faf8f5".to_string(),
            text: "#333333".to_string(),
            text_muted: "#777777".to_string(),
            border: "#e0d8cc".to_string(),
            link: "#8b5e3c".to_string(),
            link_hover: "#5c3a21".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#1a1716".to_string(),
            text: "#e8e2d9".to_string(),
            text_muted: "#9a948a".to_string(),
            border: "#3a342e".to_string(),
            link: "#d4a96a".to_string(),
            link_hover: "#e8c288".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `spinerack.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `spinerack.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `spinerack.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Spinerack Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as spinerack.toml in your vault root, next to your
# book notes. Each run merges it on top of the stock defaults, so it
# only needs the keys you want to override.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Stack and spine geometry
# ---------------------------------------------------------------------------
[stack]
# Spine width in pixels. Books lie on their sides, so this is the
# horizontal extent of every spine and cover.
width = 200

# Spine height range in pixels. Page counts are mapped into this range.
min_spine_height = 30
max_spine_height = 150

# Pages represented by one pixel of spine height. Lower values make
# thick books tower over thin ones.
pages_per_pixel = 5.0

# Corner rounding on spines, in pixels.
border_radius = 8

# Show the page count under the title on spines tall enough to fit it.
show_page_count = false

# ---------------------------------------------------------------------------
# Cover processing
# ---------------------------------------------------------------------------
[covers]
# Crop flat margins off cover scans before resizing.
trim = true

# Trim sensitivity, 0 (exact background match) to 100 (very loose).
# Values above 100 clamp to 100.
tolerance = 10

# Cover orientation on the spine:
#   "upright" - cover stays as scanned, fits within the spine box
#   "rotated" - cover turns 90 degrees to lie along the spine
fit = "upright"

# ---------------------------------------------------------------------------
# Theme
# ---------------------------------------------------------------------------
[theme]
# Font stack for spine labels and body text (CSS value).
font_family = "Georgia, serif"

# Spine label size in pixels. Also drives title truncation.
font_size = 12

# Light mode (prefers-color-scheme: light)
[theme.light]
background = "#faf8f5"
text = "#333333"
text_muted = "#777777"    # Breadcrumbs, page counts, hints
border = "#e0d8cc"
link = "#8b5e3c"
link_hover = "#5c3a21"

# Dark mode (prefers-color-scheme: dark)
[theme.dark]
background = "#1a1716"
text = "#e8e2d9"
text_muted = "#9a948a"
border = "#3a342e"
link = "#d4a96a"
link_hover = "#e8c288"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel cover-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from stack and theme config.
pub fn generate_theme_css(config: &SiteConfig) -> String {
    format!(
        r#":root {{
    --stack-width: {width}px;
    --spine-radius: {radius}px;
    --spine-font-family: {font_family};
    --spine-font-size: {font_size}px;
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
    }}
}}"#,
        width = config.stack.width,
        radius = config.stack.border_radius,
        font_family = config.theme.font_family,
        font_size = config.theme.font_size,
        light_bg = config.theme.light.background,
        light_text = config.theme.light.text,
        light_text_muted = config.theme.light.text_muted,
        light_border = config.theme.light.border,
        light_link = config.theme.light.link,
        light_link_hover = config.theme.light.link_hover,
        dark_bg = config.theme.dark.background,
        dark_text = config.theme.dark.text,
        dark_text_muted = config.theme.dark.text_muted,
        dark_border = config.theme.dark.border,
        dark_link = config.theme.dark.link,
        dark_link_hover = config.theme.dark.link_hover,
    )
}
