//! Image processing backend trait and shared error type.
//!
//! The [`RasterBackend`] trait is the seam between this crate and the bitmap
//! library doing the heavy lifting: decode, resample, blur, encode the library
//! formats, and read/write EXIF. Everything above it (the BMP codec, the
//! session, export) is backend-agnostic and can run against a mock.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::exif::ExifData;
use super::params::{Blur, Quality};
use super::raster::{RasterImage, SourceRect};
use crate::types::ImageFormat;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Trait for bitmap backends.
///
/// Implementations never keep references to the rasters they are handed:
/// every operation borrows its input and returns a new owned raster.
pub trait RasterBackend {
    /// Decode an encoded image (any supported input format).
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BackendError>;

    /// Resample `rect` of `src` into a new `dst_width`×`dst_height` raster.
    fn resample(
        &self,
        src: &RasterImage,
        rect: SourceRect,
        dst_width: u32,
        dst_height: u32,
    ) -> Result<RasterImage, BackendError>;

    /// Gaussian blur.
    fn blur(&self, src: &RasterImage, blur: Blur) -> Result<RasterImage, BackendError>;

    /// Encode with one of the library formats. BMP is not one of them.
    fn encode(
        &self,
        image: &RasterImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Read embedded EXIF tags from a file.
    fn read_exif(&self, path: &Path) -> Result<ExifData, BackendError>;

    /// Replace the EXIF tags of a file in place.
    fn write_exif(&self, path: &Path, exif: &ExifData) -> Result<(), BackendError>;
}
