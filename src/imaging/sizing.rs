//! Aspect-preserving size resolution for cover display.
//!
//! Two fit policies coexist, selected by
//! [`CoverFit`](super::params::CoverFit):
//!
//! - [`resolve_size`] — upright covers, clamped to a max width *and* a
//!   max height. Width binds first because spines are width-dominant;
//!   the height clamp stops a pathologically tall cover from wrecking
//!   the stack's vertical rhythm.
//! - [`resolve_rotated_size`] — covers laid on their side, scaled to an
//!   exact visual width with no height clamp.
//!
//! Both reject non-positive inputs loudly instead of defaulting: a
//! zero-height natural size would mean dividing by zero, and a silently
//! produced zero-size cover is wrong in a way no fallback can mask.
//! Rounding to whole pixels happens only on the final values, never on
//! intermediate ratios.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SizeError {
    #[error("invalid {name} {value}: sizing inputs must be strictly positive")]
    InvalidDimension { name: &'static str, value: f64 },
}

/// Final display dimensions in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSize {
    pub width: u32,
    pub height: u32,
}

/// Fit a natural size inside `max_width` x `max_height`, preserving the
/// natural aspect ratio.
///
/// Width-first: tentatively take the full `max_width` and derive the
/// height from the aspect ratio; only when that overflows vertically is
/// the height clamp the binding constraint instead.
///
/// # Examples
/// ```
/// # use spinerack::imaging::resolve_size;
/// // Wide cover, width binds: 100x50 into 80x1000 → 80x40.
/// let size = resolve_size(100.0, 50.0, 80.0, 1000.0).unwrap();
/// assert_eq!((size.width, size.height), (80, 40));
///
/// // Tall cover, height binds: 50x100 into 80x60 → 30x60.
/// let size = resolve_size(50.0, 100.0, 80.0, 60.0).unwrap();
/// assert_eq!((size.width, size.height), (30, 60));
/// ```
pub fn resolve_size(
    natural_width: f64,
    natural_height: f64,
    max_width: f64,
    max_height: f64,
) -> Result<ResolvedSize, SizeError> {
    require_positive("natural width", natural_width)?;
    require_positive("natural height", natural_height)?;
    require_positive("max width", max_width)?;
    require_positive("max height", max_height)?;

    let aspect = natural_width / natural_height;

    let mut width = max_width;
    let mut height = width / aspect;
    if height > max_height {
        height = max_height;
        width = height * aspect;
    }

    Ok(ResolvedSize {
        width: round_px(width),
        height: round_px(height),
    })
}

/// Size a cover that is rotated 90° before placement, so its natural
/// width becomes the visual height.
///
/// `target_visual_width` is an exact target, not a max, and no height
/// clamp applies: the visual height is
/// `natural_width * (target_visual_width / natural_height)`.
pub fn resolve_rotated_size(
    natural_width: f64,
    natural_height: f64,
    target_visual_width: f64,
) -> Result<ResolvedSize, SizeError> {
    require_positive("natural width", natural_width)?;
    require_positive("natural height", natural_height)?;
    require_positive("target visual width", target_visual_width)?;

    let visual_height = natural_width * (target_visual_width / natural_height);

    Ok(ResolvedSize {
        width: round_px(target_visual_width),
        height: round_px(visual_height),
    })
}

fn require_positive(name: &'static str, value: f64) -> Result<(), SizeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SizeError::InvalidDimension { name, value })
    }
}

/// Final-step rounding; a sub-pixel result still renders at 1px.
fn round_px(value: f64) -> u32 {
    value.round().max(1.0) as u32
}
