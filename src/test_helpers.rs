//! Shared test utilities: synthetic rasters and encoded images.
//!
//! Everything is generated in memory so tests need no fixture files.

use crate::imaging::{RasterImage, Rgb};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

/// A raster whose colour varies along both axes, so resampling and
/// row-order mistakes show up as pixel differences.
pub fn gradient(width: u32, height: u32) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        Rgb::new(
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        )
    })
}

/// A gradient encoded as a baseline JPEG.
pub fn encoded_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 90))
        .unwrap();
    buf
}

