//! Pure Rust backend on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP) | `image::ImageReader` with format sniffing |
//! | Resample | `crop_imm` + `resize_exact` with the configured filter |
//! | Blur | `image::DynamicImage::blur` (true Gaussian) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG, GIF, WebP | `DynamicImage::write_to` (lossless) |
//! | EXIF | custom [`exif`](super::exif) module (JPEG APP1 + TIFF IFD0) |
//!
//! BMP output is deliberately absent: it is produced by [`crate::bmp`].

use super::backend::{BackendError, RasterBackend};
use super::exif::{self, ExifData};
use super::params::{Blur, Quality, ResizeFilter};
use super::raster::{RasterImage, SourceRect};
use crate::types::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use log::debug;
use std::io::Cursor;
use std::path::Path;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    filter: ResizeFilter,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `filter` for every resample.
    pub fn with_filter(filter: ResizeFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_lossless(img: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>, BackendError> {
    let mut cursor = Cursor::new(Vec::new());
    // The GIF and WebP encoders only take 8-bit RGBA
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    rgba.write_to(&mut cursor, format).map_err(|e| {
        BackendError::ProcessingFailed(format!("{format:?} encode failed: {e}"))
    })?;
    Ok(cursor.into_inner())
}

impl RasterBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format();
        let img = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        debug!(
            "decoded {}x{} image ({:?})",
            img.width(),
            img.height(),
            format
        );
        Ok(RasterImage::new(img))
    }

    fn resample(
        &self,
        src: &RasterImage,
        rect: SourceRect,
        dst_width: u32,
        dst_height: u32,
    ) -> Result<RasterImage, BackendError> {
        if dst_width == 0 || dst_height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot resample to {dst_width}x{dst_height}"
            )));
        }
        let img = src.as_dynamic();
        let fits = rect.width > 0
            && rect.height > 0
            && rect.x.checked_add(rect.width).is_some_and(|r| r <= img.width())
            && rect.y.checked_add(rect.height).is_some_and(|b| b <= img.height());
        if !fits {
            return Err(BackendError::ProcessingFailed(format!(
                "source rect {rect:?} outside {}x{} image",
                img.width(),
                img.height()
            )));
        }

        let full = rect.x == 0 && rect.y == 0 && rect.width == img.width() && rect.height == img.height();
        let cropped;
        let region = if full {
            img
        } else {
            cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
            &cropped
        };
        let resized = region.resize_exact(dst_width, dst_height, self.filter.to_filter_type());
        debug!(
            "resampled {}x{} → {dst_width}x{dst_height} ({:?})",
            rect.width, rect.height, self.filter
        );
        Ok(RasterImage::new(resized))
    }

    fn blur(&self, src: &RasterImage, blur: Blur) -> Result<RasterImage, BackendError> {
        if blur.is_noop() {
            return Ok(src.clone());
        }
        Ok(RasterImage::new(src.as_dynamic().blur(blur.sigma)))
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let img = image.as_dynamic();
        match format {
            ImageFormat::Jpeg => encode_jpeg(img, quality),
            ImageFormat::Png => encode_lossless(img, image::ImageFormat::Png),
            ImageFormat::Gif => encode_lossless(img, image::ImageFormat::Gif),
            ImageFormat::WebP => encode_lossless(img, image::ImageFormat::WebP),
            ImageFormat::Bmp => Err(BackendError::UnsupportedFormat(
                "BMP output is handled by the bmp codec".to_string(),
            )),
        }
    }

    fn read_exif(&self, path: &Path) -> Result<ExifData, BackendError> {
        exif::read_exif(path)
    }

    fn write_exif(&self, path: &Path, exif_data: &ExifData) -> Result<(), BackendError> {
        exif::write_exif(path, exif_data)
    }
}
