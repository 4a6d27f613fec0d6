//! BMP encoder: uncompressed 24-bit truecolor.
//!
//! The only output format this crate writes itself. Layout:
//!
//! ```text
//! offset  size  field
//!      0     2  "BM"
//!      2     4  file size (u32 LE)
//!      6     4  reserved (two zero u16)
//!     10     4  pixel data offset = 54
//!     14     4  DIB header size = 40
//!     18     4  width (i32 LE)
//!     22     4  -height (i32 LE, negative = top-down)
//!     26     2  planes = 1
//!     28     2  bits per pixel = 24
//!     30     4  compression = 0
//!     34     4  pixel data size
//!     38     4  horizontal resolution = 2835 px/m
//!     42     4  vertical resolution = 2835 px/m
//!     46     4  palette colors = 0
//!     50     4  important colors = 0
//!     54     …  pixel rows
//! ```
//!
//! Rows are written starting from the *bottom* scanline, each as B,G,R
//! triplets followed by `width % 4` zero bytes. For 24-bit rows that count
//! equals the canonical `(4 - (width * 3) % 4) % 4`, since `3w ≡ -w (mod 4)`.
//!
//! The row order is part of the output contract and is not what readers
//! expect: a negative height tells them the first stored row is the top one,
//! so the image is shown upside down. Callers that need files other software
//! displays the right way up should flip the raster first.

use crate::imaging::{
    PixelSource, Quality, RasterBackend, RasterImage, SourceRect, scale_for_quality,
    scaled_dimensions,
};
use log::debug;
use std::path::Path;
use thiserror::Error;

/// Size of the file header plus the BITMAPINFOHEADER.
pub const HEADER_SIZE: usize = 54;
const DIB_HEADER_SIZE: u32 = 40;
const BITS_PER_PIXEL: u16 = 24;
/// 72 DPI.
const PIXELS_PER_METER: i32 = 2835;

#[derive(Error, Debug)]
pub enum BmpError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("scaling failed: {0}")]
    ScalingFailed(String),
    #[error("write failed for {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Sizes derived from the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpLayout {
    pub width: u32,
    pub height: u32,
    /// Zero bytes appended to every row.
    pub padding: usize,
    /// Bytes per row including padding.
    pub row_stride: usize,
    pub pixel_data_size: usize,
    pub file_size: usize,
}

impl BmpLayout {
    /// Compute the layout, rejecting sizes the 32-bit header fields can't hold.
    pub fn new(width: u32, height: u32) -> Result<Self, BmpError> {
        let too_large = || BmpError::InvalidImage(format!("dimensions too large: {width}x{height}"));

        if width == 0 || height == 0 {
            return Err(BmpError::InvalidImage(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(too_large());
        }

        let w = width as usize;
        let padding = w % 4;
        let row_stride = w
            .checked_mul(3)
            .and_then(|r| r.checked_add(padding))
            .ok_or_else(too_large)?;
        let pixel_data_size = row_stride
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        let file_size = pixel_data_size
            .checked_add(HEADER_SIZE)
            .filter(|&s| u32::try_from(s).is_ok())
            .ok_or_else(too_large)?;

        Ok(Self {
            width,
            height,
            padding,
            row_stride,
            pixel_data_size,
            file_size,
        })
    }

    fn write_header(&self, out: &mut Vec<u8>) {
        // File header (14 bytes)
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(self.file_size as u32).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(&(HEADER_SIZE as u32).to_le_bytes());

        // DIB header (BITMAPINFOHEADER, 40 bytes)
        out.extend_from_slice(&DIB_HEADER_SIZE.to_le_bytes());
        out.extend_from_slice(&(self.width as i32).to_le_bytes());
        out.extend_from_slice(&(-(self.height as i32)).to_le_bytes()); // negative = top-down
        out.extend_from_slice(&1u16.to_le_bytes()); // planes
        out.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // compression
        out.extend_from_slice(&(self.pixel_data_size as u32).to_le_bytes());
        out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // palette colors
        out.extend_from_slice(&0u32.to_le_bytes()); // important colors
    }
}

/// Encode `src` at its own size.
pub fn write_bmp<P: PixelSource + ?Sized>(src: &P) -> Result<Vec<u8>, BmpError> {
    let layout = BmpLayout::new(src.width(), src.height())?;

    let mut out = Vec::with_capacity(layout.file_size);
    layout.write_header(&mut out);

    for y in (0..layout.height).rev() {
        for x in 0..layout.width {
            let c = src.color_at(x, y);
            out.extend_from_slice(&[c.b, c.g, c.r]);
        }
        out.extend(std::iter::repeat_n(0u8, layout.padding));
    }

    debug_assert_eq!(out.len(), layout.file_size);
    Ok(out)
}

/// Encode `image` as BMP, optionally scaled down by `quality`.
///
/// `quality` in `1..=100` scales both axes by `quality / 100` (rounded)
/// through the backend's resampler before encoding; `None` or `100` keeps
/// full resolution. The scaled copy lives only for the duration of this call.
pub fn encode_bmp(
    backend: &impl RasterBackend,
    image: &RasterImage,
    quality: Option<u32>,
) -> Result<Vec<u8>, BmpError> {
    if image.is_empty() {
        return Err(BmpError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let scaled = match quality {
        Some(q) => scale(backend, image, q)?,
        None => None,
    };
    let source = scaled.as_ref().unwrap_or(image);

    let bytes = write_bmp(source)?;
    debug!(
        "encoded {}x{} BMP ({} bytes)",
        source.width(),
        source.height(),
        bytes.len()
    );
    Ok(bytes)
}

/// Encode `image` as BMP and write it to `path` in a single write.
///
/// Parent directories are not created; a missing one is a `WriteFailed`.
pub fn encode_bmp_to_file(
    backend: &impl RasterBackend,
    image: &RasterImage,
    path: &Path,
    quality: Option<u32>,
) -> Result<(), BmpError> {
    let bytes = encode_bmp(backend, image, quality)?;
    std::fs::write(path, &bytes).map_err(|source| BmpError::WriteFailed {
        path: path.display().to_string(),
        source,
    })
}

/// Produce the scaled copy for `quality`, or `None` when no scaling applies.
fn scale(
    backend: &impl RasterBackend,
    image: &RasterImage,
    quality: u32,
) -> Result<Option<RasterImage>, BmpError> {
    let quality = Quality::try_new(quality).ok_or_else(|| {
        BmpError::InvalidArgument(format!(
            "quality must be between {} and {}, got {quality}",
            Quality::MIN,
            Quality::MAX
        ))
    })?;

    let factor = scale_for_quality(quality.value());
    if factor >= 1.0 {
        return Ok(None);
    }

    let dims = image.dimensions();
    let target = scaled_dimensions(dims, factor);
    backend
        .resample(image, SourceRect::full(dims), target.width, target.height)
        .map(Some)
        .map_err(|e| BmpError::ScalingFailed(format!("{dims} → {target}: {e}")))
}
