//! Decoded pixel data as seen by the rest of the crate.
//!
//! [`RasterImage`] wraps the backend's decoded bitmap so that callers never
//! touch `image` crate types directly. The BMP codec only needs the
//! [`PixelSource`] view: dimensions plus an RGB lookup per pixel.

use crate::types::Dimensions;
use image::{DynamicImage, GenericImageView, RgbImage};

/// An 8-bit RGB sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Read-only access to a grid of RGB pixels.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Color at `(x, y)`, with `(0, 0)` the top-left pixel.
    ///
    /// Callers stay within `0..width` and `0..height`.
    fn color_at(&self, x: u32, y: u32) -> Rgb;

    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }
}

/// Source rectangle for a resample operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    /// The rectangle covering an entire image.
    pub fn full(dims: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: dims.width,
            height: dims.height,
        }
    }
}

/// A decoded image owned by whoever holds it.
///
/// Cloning duplicates the pixel buffer. Dropping releases it.
#[derive(Debug, Clone)]
pub struct RasterImage {
    inner: DynamicImage,
}

impl RasterImage {
    pub fn new(inner: DynamicImage) -> Self {
        Self { inner }
    }

    /// Build an RGB raster by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgb) -> Self {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let c = f(x, y);
            image::Rgb([c.r, c.g, c.b])
        });
        Self::new(DynamicImage::ImageRgb8(img))
    }

    /// A raster filled with a single color.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// True for a zero-area raster, which no encoder accepts.
    pub fn is_empty(&self) -> bool {
        self.inner.width() == 0 || self.inner.height() == 0
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.inner
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(inner: DynamicImage) -> Self {
        Self::new(inner)
    }
}

impl PixelSource for RasterImage {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn color_at(&self, x: u32, y: u32) -> Rgb {
        // Alpha is dropped: every output path here is opaque truecolor.
        let [r, g, b, _] = self.inner.get_pixel(x, y).0;
        Rgb::new(r, g, b)
    }
}
