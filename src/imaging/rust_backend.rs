//! Pure Rust cover backend — zero external dependencies.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → PNG | `image` crate PNG encoder |
//!
//! Output is always PNG: cover variants are small, lossless keeps the
//! trimmed edges crisp, and every browser renders it.

use super::backend::{BackendError, CoverBackend};
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in and known to work.
const COVER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    COVER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of cover file extensions that have working decoders
/// compiled in.
pub fn supported_cover_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when `path` has an extension we can decode.
pub fn is_supported_cover(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverBackend for RustBackend {
    fn load_pixels(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let decoded = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::DecodeFailed(format!("{}: {}", path.display(), e))
            })?;
        Ok(decoded.to_rgba8())
    }

    fn resize(&self, image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
        image::imageops::resize(image, width, height, FilterType::Lanczos3)
    }

    fn save_png(&self, image: &RgbaImage, path: &Path) -> Result<(), BackendError> {
        image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BackendError::EncodeFailed(format!("{}: {}", path.display(), e)))
    }
}
