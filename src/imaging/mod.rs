//! Image processing — decode, resample, blur, encode, EXIF.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, GIF, WebP, BMP) |
//! | **Resample** | `resize_exact` with a configurable filter (Lanczos3 default) |
//! | **Blur** | `image::DynamicImage::blur` |
//! | **Encode** | `image` encoders for JPEG/PNG/GIF/WebP; BMP lives in [`crate::bmp`] |
//! | **EXIF** | custom parser/writer (JPEG APP1 + TIFF IFD0) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Raster**: The decoded-image handle and its pixel view
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **EXIF**: IFD0 read/write/strip for JPEG

pub mod backend;
mod calculations;
pub mod exif;
mod params;
pub mod raster;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend};
pub use calculations::{
    MIN_SCALE, calculate_resize_dimensions, scale_for_quality, scaled_dimensions,
};
pub use exif::{ExifData, ExifValue};
pub use params::{Blur, Quality, ResizeFilter};
pub use raster::{PixelSource, RasterImage, Rgb, SourceRect};
pub use rust_backend::RustBackend;
