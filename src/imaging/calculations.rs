//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Dimensions;

/// Smallest scale a BMP quality value maps to.
pub const MIN_SCALE: f64 = 0.01;

/// Calculate output dimensions for a resize request.
///
/// Without `preserve_ratio` the target is used as-is. With it, the result
/// fits inside the target box while keeping the original aspect ratio: the
/// constrained axis keeps its target size and the other axis is derived.
///
/// # Examples
/// ```
/// # use nano_image::imaging::calculate_resize_dimensions;
/// # use nano_image::types::Dimensions;
/// // 800x600 (4:3) into a 400x400 box → width wins
/// assert_eq!(
///     calculate_resize_dimensions(Dimensions::new(800, 600), Dimensions::new(400, 400), true),
///     Dimensions::new(400, 300),
/// );
/// ```
pub fn calculate_resize_dimensions(
    original: Dimensions,
    target: Dimensions,
    preserve_ratio: bool,
) -> Dimensions {
    if !preserve_ratio || original.width == 0 || original.height == 0 {
        return target;
    }

    let aspect = original.width as f64 / original.height as f64;
    let target_aspect = target.width as f64 / target.height.max(1) as f64;

    if target_aspect > aspect {
        // Target box is wider than the image: height constrains
        let w = (target.height as f64 * aspect).round() as u32;
        Dimensions::new(w.max(1), target.height)
    } else {
        // Target box is taller (or same shape): width constrains
        let h = (target.width as f64 / aspect).round() as u32;
        Dimensions::new(target.width, h.max(1))
    }
}

/// Map a BMP quality value (1–100) to a linear scale factor in `[0.01, 1.0]`.
pub fn scale_for_quality(quality: u32) -> f64 {
    (quality as f64 / 100.0).clamp(MIN_SCALE, 1.0)
}

/// Apply a scale factor to both axes, rounding half away from zero.
///
/// May round an axis down to zero for tiny images at low scales; the
/// resampler rejects that.
pub fn scaled_dimensions(dims: Dimensions, scale: f64) -> Dimensions {
    Dimensions::new(
        (dims.width as f64 * scale).round() as u32,
        (dims.height as f64 * scale).round() as u32,
    )
}
