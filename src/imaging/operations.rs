//! High-level cover operations.
//!
//! [`plan_cover`] is the pure half: given a decoded buffer and the job
//! parameters it decides the content bounds and the final display size.
//! [`create_cover_variant`] is the effectful half: it loads, crops,
//! rotates, resizes through a [`CoverBackend`], and writes the PNG
//! variant. Keeping the plan pure makes the interesting decisions
//! testable without touching pixels on disk.

use super::backend::{BackendError, CoverBackend};
use super::bounds::{self, Bounds};
use super::params::{CoverFit, CoverParams};
use super::sizing::{self, ResolvedSize, SizeError};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Size(#[from] SizeError),
}

/// Result type for cover operations.
pub type Result<T> = std::result::Result<T, CoverError>;

/// The decisions for one cover: what to cut and how big to draw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverPlan {
    pub bounds: Bounds,
    pub size: ResolvedSize,
}

/// A finished cover variant as recorded in the processed manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverVariant {
    pub width: u32,
    pub height: u32,
    /// False when detection fell back to the full image (or trimming was
    /// disabled), so nothing was actually cut away.
    pub trimmed: bool,
}

/// Decide bounds and display size for a decoded cover.
///
/// With trimming disabled the full image rectangle feeds the sizer
/// unchanged. The fit mode picks the sizing policy: upright covers are
/// clamped to `stack_width` x `max_spine_height`, rotated covers scale to
/// an exact `stack_width`.
pub fn plan_cover(buffer: &image::RgbaImage, params: &CoverParams) -> Result<CoverPlan> {
    let (width, height) = buffer.dimensions();

    let content = match params.trim {
        Some(tolerance) => bounds::detect(buffer, tolerance.channel_sum()),
        None => Bounds::full(width, height),
    };

    let size = match params.fit {
        CoverFit::Upright => sizing::resolve_size(
            f64::from(content.width()),
            f64::from(content.height()),
            f64::from(params.stack_width),
            f64::from(params.max_spine_height),
        )?,
        CoverFit::Rotated => sizing::resolve_rotated_size(
            f64::from(content.width()),
            f64::from(content.height()),
            f64::from(params.stack_width),
        )?,
    };

    Ok(CoverPlan {
        bounds: content,
        size,
    })
}

/// Produce one cover variant on disk: decode, trim, orient, resize, save.
pub fn create_cover_variant(
    backend: &impl CoverBackend,
    params: &CoverParams,
) -> Result<CoverVariant> {
    let buffer = backend.load_pixels(&params.source)?;
    let (full_width, full_height) = buffer.dimensions();

    let plan = plan_cover(&buffer, params)?;
    let trimmed = !plan.bounds.is_full(full_width, full_height);

    // A failed crop keeps the untrimmed buffer; the sizer already worked
    // from the bounds, so the variant stays visually consistent.
    let content = match bounds::crop(&buffer, &plan.bounds) {
        Some(cropped) => cropped,
        None => buffer,
    };

    let oriented = match params.fit {
        CoverFit::Upright => content,
        CoverFit::Rotated => image::imageops::rotate90(&content),
    };

    let resized = backend.resize(&oriented, plan.size.width, plan.size.height);

    if let Some(parent) = params.output.parent() {
        fs::create_dir_all(parent).map_err(BackendError::Io)?;
    }
    backend.save_png(&resized, &params.output)?;

    Ok(CoverVariant {
        width: plan.size.width,
        height: plan.size.height,
        trimmed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Tolerance;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::{Rgba, RgbaImage};

    /// White buffer with a dark block at (x, y) sized w x h.
    fn cover_with_block(width: u32, height: u32, block: (u32, u32, u32, u32)) -> RgbaImage {
        let (bx, by, bw, bh) = block;
        RgbaImage::from_fn(width, height, |x, y| {
            if x >= bx && x < bx + bw && y >= by && y < by + bh {
                Rgba([40, 40, 40, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn params(trim: Option<Tolerance>, fit: CoverFit, output: &std::path::Path) -> CoverParams {
        CoverParams {
            source: "/library/covers/dune.jpg".into(),
            output: output.to_path_buf(),
            trim,
            fit,
            stack_width: 200,
            max_spine_height: 150,
        }
    }

    // =========================================================================
    // plan_cover tests
    // =========================================================================

    #[test]
    fn plan_sizes_from_trimmed_bounds() {
        // 100x50 photo, content block 40x40: trimming changes the aspect
        // from 2:1 to square, so the height clamp binds.
        let buffer = cover_with_block(100, 50, (10, 5, 40, 40));
        let tmp = tempfile::TempDir::new().unwrap();
        let p = params(
            Some(Tolerance::new(10)),
            CoverFit::Upright,
            &tmp.path().join("out.png"),
        );

        let plan = plan_cover(&buffer, &p).unwrap();
        assert_eq!((plan.bounds.width(), plan.bounds.height()), (40, 40));
        assert_eq!((plan.size.width, plan.size.height), (150, 150));
    }

    #[test]
    fn plan_with_trim_disabled_uses_natural_dimensions() {
        let buffer = cover_with_block(100, 50, (10, 5, 40, 40));
        let tmp = tempfile::TempDir::new().unwrap();
        let p = params(None, CoverFit::Upright, &tmp.path().join("out.png"));

        let plan = plan_cover(&buffer, &p).unwrap();
        assert_eq!(plan.bounds, Bounds::full(100, 50));
        // Natural 2:1 aspect, width binds: 200x100.
        assert_eq!((plan.size.width, plan.size.height), (200, 100));
    }

    #[test]
    fn plan_rotated_uses_exact_width_policy() {
        // Trimmed content 80x40 rotated onto a 200px stack:
        // visual height = 80 * (200 / 40) = 400.
        let buffer = cover_with_block(100, 50, (10, 5, 80, 40));
        let tmp = tempfile::TempDir::new().unwrap();
        let p = params(
            Some(Tolerance::new(10)),
            CoverFit::Rotated,
            &tmp.path().join("out.png"),
        );

        let plan = plan_cover(&buffer, &p).unwrap();
        assert_eq!((plan.size.width, plan.size.height), (200, 400));
    }

    // =========================================================================
    // create_cover_variant tests
    // =========================================================================

    #[test]
    fn variant_runs_load_resize_save_in_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("covers").join("dune.png");
        let backend = MockBackend::with_pixels(vec![cover_with_block(100, 50, (10, 5, 40, 40))]);

        let variant = create_cover_variant(
            &backend,
            &params(Some(Tolerance::new(10)), CoverFit::Upright, &output),
        )
        .unwrap();

        assert_eq!((variant.width, variant.height), (150, 150));
        assert!(variant.trimmed);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], RecordedOp::Load(p) if p.ends_with("dune.jpg")));
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                input_width: 40,
                input_height: 40,
                width: 150,
                height: 150,
            }
        ));
        assert!(matches!(
            &ops[2],
            RecordedOp::Save {
                width: 150,
                height: 150,
                ..
            }
        ));
    }

    #[test]
    fn variant_on_uniform_cover_is_not_trimmed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("plain.png");
        let backend = MockBackend::with_pixels(vec![RgbaImage::from_pixel(
            100,
            50,
            Rgba([230, 230, 230, 255]),
        )]);

        let variant = create_cover_variant(
            &backend,
            &params(Some(Tolerance::new(10)), CoverFit::Upright, &output),
        )
        .unwrap();

        assert!(!variant.trimmed);
        assert_eq!((variant.width, variant.height), (200, 100));
    }

    #[test]
    fn variant_rotation_swaps_buffer_orientation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("rotated.png");
        let backend = MockBackend::with_pixels(vec![cover_with_block(100, 50, (10, 5, 80, 40))]);

        create_cover_variant(
            &backend,
            &params(Some(Tolerance::new(10)), CoverFit::Rotated, &output),
        )
        .unwrap();

        let ops = backend.get_operations();
        // The 80x40 content arrives at the resizer as 40x80.
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                input_width: 40,
                input_height: 80,
                width: 200,
                height: 400,
            }
        ));
    }

    #[test]
    fn variant_propagates_load_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("missing.png");
        let backend = MockBackend::new();

        let result = create_cover_variant(
            &backend,
            &params(Some(Tolerance::new(10)), CoverFit::Upright, &output),
        );
        assert!(matches!(
            result,
            Err(CoverError::Backend(BackendError::DecodeFailed(_)))
        ));
    }
}
