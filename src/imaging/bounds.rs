//! Content-bounds detection for cover photographs.
//!
//! Scanned spine photos almost always carry uniform margins around the
//! actual book. [`detect`] infers the background color from the four
//! corner pixels and runs four directional scans inward until each meets
//! a pixel that differs from that background by more than a tolerance,
//! yielding the tight content rectangle. [`crop`] cuts that rectangle
//! into a fresh buffer.
//!
//! Detection never fails: a uniform image, a fully transparent image, or
//! any inconsistent scan result falls back to the full-image rectangle,
//! so a bad photo disables trimming for that one cover instead of
//! blocking it from rendering.

use image::{Rgba, RgbaImage};

/// Pixels with alpha below this count as background regardless of color.
const MIN_CONTENT_ALPHA: u8 = 10;

/// Tight content rectangle within an image.
///
/// `left` and `top` are inclusive, `right` and `bottom` exclusive, so a
/// full-image rectangle is `(0, 0, width, height)` and
/// `width() == right - left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Bounds {
    /// Rectangle covering the whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            top: 0,
            left: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// True when this rectangle covers the whole `width` x `height` image.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        *self == Self::full(width, height)
    }

    /// True when `other` lies entirely within this rectangle.
    pub fn encloses(&self, other: &Bounds) -> bool {
        self.top <= other.top
            && self.left <= other.left
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}

/// Infer the background color and return the smallest rectangle holding
/// every pixel that differs from it by more than `tolerance`.
///
/// `tolerance` is a summed absolute RGB difference on the 0-765 scale
/// (765 = three channels fully apart); the user-facing 0-100 scale maps
/// onto it via [`Tolerance`](super::params::Tolerance). A pixel counts as
/// content only when it is not near-transparent and its distance from the
/// background strictly exceeds the tolerance.
///
/// Each edge is located by its own full pass over the buffer (top and
/// bottom row-major, left and right column-major). The naive
/// O(width * height) cost per direction is fine for spine-sized images
/// and keeps the four scans completely independent.
pub fn detect(buffer: &RgbaImage, tolerance: u32) -> Bounds {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Bounds::full(width, height);
    }

    let background = background_color(buffer);

    let bounds = Bounds {
        top: scan_from_top(buffer, background, tolerance),
        left: scan_from_left(buffer, background, tolerance),
        right: scan_from_right(buffer, background, tolerance),
        bottom: scan_from_bottom(buffer, background, tolerance),
    };

    // Inconsistent scans mean there is no usable content rectangle.
    if bounds.top >= bounds.bottom || bounds.left >= bounds.right {
        return Bounds::full(width, height);
    }

    bounds
}

/// Cut `bounds` out of `buffer` into a fresh buffer whose `(0, 0)` is the
/// original `(bounds.left, bounds.top)`.
///
/// Returns `None` when the rectangle is empty or does not fit inside the
/// buffer; callers keep the untrimmed image in that case. The returned
/// buffer shares no storage with the source.
pub fn crop(buffer: &RgbaImage, bounds: &Bounds) -> Option<RgbaImage> {
    let (width, height) = buffer.dimensions();
    if bounds.left >= bounds.right || bounds.top >= bounds.bottom {
        return None;
    }
    if bounds.right > width || bounds.bottom > height {
        return None;
    }

    let view = image::imageops::crop_imm(
        buffer,
        bounds.left,
        bounds.top,
        bounds.width(),
        bounds.height(),
    );
    Some(view.to_image())
}

/// Majority color among the four corner pixels.
///
/// Corners are visited top-left, top-right, bottom-left, bottom-right,
/// and only a strictly higher count replaces the current winner, so ties
/// resolve to the earliest corner. That keeps the inference deterministic
/// for gradients and two-tone margins.
fn background_color(buffer: &RgbaImage) -> [u8; 3] {
    let (width, height) = buffer.dimensions();
    let corners = [
        (0, 0),
        (width - 1, 0),
        (0, height - 1),
        (width - 1, height - 1),
    ];

    let mut counts: Vec<([u8; 3], u32)> = Vec::with_capacity(4);
    for (x, y) in corners {
        let p = buffer.get_pixel(x, y);
        let rgb = [p[0], p[1], p[2]];
        match counts.iter_mut().find(|(color, _)| *color == rgb) {
            Some((_, count)) => *count += 1,
            None => counts.push((rgb, 1)),
        }
    }

    let mut winner = counts[0];
    for &(color, count) in &counts[1..] {
        if count > winner.1 {
            winner = (color, count);
        }
    }
    winner.0
}

fn is_content(pixel: &Rgba<u8>, background: [u8; 3], tolerance: u32) -> bool {
    if pixel[3] < MIN_CONTENT_ALPHA {
        return false;
    }
    channel_distance(pixel, background) > tolerance
}

/// Summed absolute per-channel RGB difference (0-765).
fn channel_distance(pixel: &Rgba<u8>, background: [u8; 3]) -> u32 {
    let dr = (i32::from(pixel[0]) - i32::from(background[0])).unsigned_abs();
    let dg = (i32::from(pixel[1]) - i32::from(background[1])).unsigned_abs();
    let db = (i32::from(pixel[2]) - i32::from(background[2])).unsigned_abs();
    dr + dg + db
}

fn scan_from_top(buffer: &RgbaImage, background: [u8; 3], tolerance: u32) -> u32 {
    let (width, height) = buffer.dimensions();
    for y in 0..height {
        for x in 0..width {
            if is_content(buffer.get_pixel(x, y), background, tolerance) {
                return y;
            }
        }
    }
    0
}

fn scan_from_bottom(buffer: &RgbaImage, background: [u8; 3], tolerance: u32) -> u32 {
    let (width, height) = buffer.dimensions();
    for y in (0..height).rev() {
        for x in 0..width {
            if is_content(buffer.get_pixel(x, y), background, tolerance) {
                // Exclusive bound: the content row itself stays inside.
                return y + 1;
            }
        }
    }
    height
}

fn scan_from_left(buffer: &RgbaImage, background: [u8; 3], tolerance: u32) -> u32 {
    let (width, height) = buffer.dimensions();
    for x in 0..width {
        for y in 0..height {
            if is_content(buffer.get_pixel(x, y), background, tolerance) {
                return x;
            }
        }
    }
    0
}

fn scan_from_right(buffer: &RgbaImage, background: [u8; 3], tolerance: u32) -> u32 {
    let (width, height) = buffer.dimensions();
    for x in (0..width).rev() {
        for y in 0..height {
            if is_content(buffer.get_pixel(x, y), background, tolerance) {
                return x + 1;
            }
        }
    }
    width
}
