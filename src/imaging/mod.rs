//! Cover processing in pure Rust, with no external image tools.
//!
//! | Operation | Where |
//! |---|---|
//! | **Bounds detection** | corner-vote background + four directional scans |
//! | **Crop** | `image::imageops::crop_imm` into a fresh buffer |
//! | **Sizing** | dual-clamp upright fit or exact-width rotated fit |
//! | **Decode / resize / encode** | `image` crate via [`RustBackend`] |
//!
//! The module is split into:
//! - **Bounds**: content-bounds detection and cropping (pure, unit testable)
//! - **Sizing**: aspect-preserving size resolution (pure, unit testable)
//! - **Parameters**: data structures describing cover jobs
//! - **Backend**: [`CoverBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining the pure math + backend

pub mod backend;
pub mod bounds;
pub mod operations;
mod params;
pub mod rust_backend;
mod sizing;

pub use backend::{BackendError, CoverBackend};
pub use bounds::{Bounds, crop, detect};
pub use operations::{CoverError, CoverPlan, CoverVariant, create_cover_variant, plan_cover};
pub use params::{CoverFit, CoverParams, Tolerance};
pub use rust_backend::{RustBackend, is_supported_cover, supported_cover_extensions};
pub use sizing::{ResolvedSize, SizeError, resolve_rotated_size, resolve_size};
