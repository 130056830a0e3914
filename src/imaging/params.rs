//! Parameter types for cover processing.
//!
//! These structs describe *what* to do to a cover, not *how* to do it.
//! They are the interface between the high-level
//! [`operations`](super::operations) module (which plans and runs cover
//! jobs) and the [`backend`](super::backend) (which does the actual pixel
//! work), so backends can be swapped (e.g. for a recording mock in tests)
//! without touching operation logic.
//!
//! ## Types
//!
//! - [`Tolerance`] — Trim tolerance on the user scale (0-100, default 10).
//!   Clamped on construction; converts to the internal channel-sum scale.
//! - [`CoverFit`] — Which sizing policy places the cover on the stack.
//! - [`CoverParams`] — Everything needed to produce one cover variant:
//!   source, output path, trim setting, fit mode, stack constraints.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Trim tolerance on the user-facing 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance(pub u32);

impl Tolerance {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Linear map onto the internal channel-sum scale: 0-100 → 0-765,
    /// where 765 is three RGB channels fully apart.
    pub fn channel_sum(self) -> u32 {
        (f64::from(self.0) * 7.65).round() as u32
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(10)
    }
}

/// How a cover photograph is placed on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoverFit {
    /// Keep the photo upright, clamped to the stack width and the max
    /// spine height (width binds first).
    #[default]
    Upright,
    /// Rotate 90° so the spine lies along the stack: exact stack width,
    /// no height clamp.
    Rotated,
}

/// Everything needed to produce one cover variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` disables trimming entirely; the natural dimensions feed
    /// the sizer unchanged.
    pub trim: Option<Tolerance>,
    pub fit: CoverFit,
    pub stack_width: u32,
    pub max_spine_height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_clamps_to_user_scale() {
        assert_eq!(Tolerance::new(0).value(), 0);
        assert_eq!(Tolerance::new(55).value(), 55);
        assert_eq!(Tolerance::new(250).value(), 100);
    }

    #[test]
    fn tolerance_maps_linearly_to_channel_sum() {
        assert_eq!(Tolerance::new(0).channel_sum(), 0);
        assert_eq!(Tolerance::new(10).channel_sum(), 77);
        assert_eq!(Tolerance::new(100).channel_sum(), 765);
    }

    #[test]
    fn tolerance_default_is_10() {
        assert_eq!(Tolerance::default().value(), 10);
    }

    #[test]
    fn cover_fit_parses_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrap {
            fit: CoverFit,
        }

        let upright: Wrap = toml::from_str("fit = \"upright\"").unwrap();
        assert_eq!(upright.fit, CoverFit::Upright);

        let rotated: Wrap = toml::from_str("fit = \"rotated\"").unwrap();
        assert_eq!(rotated.fit, CoverFit::Rotated);

        assert!(toml::from_str::<Wrap>("fit = \"sideways\"").is_err());
    }
}
