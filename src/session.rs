//! The image being worked on, as an immutable value.
//!
//! An [`ImageSession`] is created by [`open`](ImageSession::open) or
//! [`load`](ImageSession::load) and threaded through the pipeline:
//!
//! ```text
//! open/load  →  resize / blur / EXIF edits  →  encode (bytes) or export::save (file)
//! ```
//!
//! Transform methods take `self` and hand back a new session; nothing is
//! stored between calls elsewhere. Dropping the session releases the raster.

use crate::bmp::{self, BmpError};
use crate::imaging::{
    BackendError, Blur, ExifData, PixelSource, Quality, RasterBackend, RasterImage, SourceRect,
    calculate_resize_dimensions,
};
use crate::types::{Dimensions, ImageFormat};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("BMP encoding failed: {0}")]
    Bmp(#[from] BmpError),
    #[error("Session has no source file")]
    NoSource,
}

/// A decoded image plus the geometry and metadata requested for it.
#[derive(Debug, Clone)]
pub struct ImageSession {
    raster: RasterImage,
    source: Option<PathBuf>,
    source_format: Option<ImageFormat>,
    original: Dimensions,
    target: Dimensions,
    crop: Dimensions,
    exif: Option<ExifData>,
}

impl ImageSession {
    /// Wrap an already-decoded raster.
    pub fn from_raster(raster: RasterImage) -> Self {
        let dims = raster.dimensions();
        Self {
            raster,
            source: None,
            source_format: None,
            original: dims,
            target: dims,
            crop: dims,
            exif: None,
        }
    }

    /// Open an image file.
    ///
    /// EXIF is read for JPEG sources; a failed EXIF read is logged and the
    /// session starts without metadata.
    pub fn open(backend: &impl RasterBackend, path: &Path) -> Result<Self, SessionError> {
        let bytes = std::fs::read(path)?;
        let raster = backend.decode(&bytes)?;
        let source_format = ImageFormat::from_path(path);

        let exif = if source_format == Some(ImageFormat::Jpeg) {
            match backend.read_exif(path) {
                Ok(exif) if !exif.is_empty() => Some(exif),
                Ok(_) => None,
                Err(e) => {
                    warn!("ignoring unreadable EXIF in {}: {e}", path.display());
                    None
                }
            }
        } else {
            None
        };

        debug!(
            "opened {} ({}, {} EXIF tags)",
            path.display(),
            raster.dimensions(),
            exif.as_ref().map_or(0, ExifData::len)
        );

        Ok(Self {
            source: Some(path.to_path_buf()),
            source_format,
            exif,
            ..Self::from_raster(raster)
        })
    }

    /// Decode an image held in memory.
    pub fn load(backend: &impl RasterBackend, bytes: &[u8]) -> Result<Self, SessionError> {
        Ok(Self::from_raster(backend.decode(bytes)?))
    }

    pub fn raster(&self) -> &RasterImage {
        &self.raster
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Dimensions of the decoded source (or as overridden by `with_width`/`with_height`).
    pub fn original_dimensions(&self) -> Dimensions {
        self.original
    }

    /// Dimensions the output will be rendered at.
    pub fn target_dimensions(&self) -> Dimensions {
        self.target
    }

    /// Dimensions last requested via [`resize`](Self::resize), used for thumbnail names.
    pub fn crop_dimensions(&self) -> Dimensions {
        self.crop
    }

    pub fn exif(&self) -> Option<&ExifData> {
        self.exif.as_ref()
    }

    /// Override the original and target width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.original.width = width;
        self.target.width = width;
        self
    }

    /// Override the original and target height.
    pub fn with_height(mut self, height: u32) -> Self {
        self.original.height = height;
        self.target.height = height;
        self
    }

    /// Set the output size, optionally fitting it to the original aspect ratio.
    pub fn resize(mut self, width: u32, height: u32, preserve_ratio: bool) -> Self {
        let requested = Dimensions::new(width, height);
        self.target = calculate_resize_dimensions(self.original, requested, preserve_ratio);
        self.crop = requested;
        debug!(
            "resize {} → {} (requested {requested}, preserve_ratio={preserve_ratio})",
            self.original, self.target
        );
        self
    }

    /// Blur the current pixels.
    pub fn blur(self, backend: &impl RasterBackend, blur: Blur) -> Result<Self, SessionError> {
        if blur.is_noop() {
            return Ok(self);
        }
        let raster = backend.blur(&self.raster, blur)?;
        Ok(Self { raster, ..self })
    }

    /// Drop any EXIF carried from the source.
    pub fn strip_exif(mut self) -> Self {
        self.exif = None;
        self
    }

    /// Replace the carried EXIF.
    pub fn with_exif(mut self, exif: ExifData) -> Self {
        self.exif = (!exif.is_empty()).then_some(exif);
        self
    }

    /// Produce the raster at the target size.
    ///
    /// The whole decoded image (as described by the original dimensions) is
    /// resampled onto the target; when nothing changes the raster is cloned.
    pub fn render(&self, backend: &impl RasterBackend) -> Result<RasterImage, SessionError> {
        let decoded = self.raster.dimensions();
        if self.target == decoded && self.original == decoded {
            return Ok(self.raster.clone());
        }

        // with_width/with_height may claim a larger original than was decoded
        let rect = SourceRect::full(Dimensions::new(
            self.original.width.min(decoded.width),
            self.original.height.min(decoded.height),
        ));
        Ok(backend.resample(&self.raster, rect, self.target.width, self.target.height)?)
    }

    /// Render and encode to bytes.
    ///
    /// For BMP, `quality` is a scale request (see [`crate::bmp`]) and `None`
    /// means full resolution. For the other formats `None` means the default
    /// [`Quality`].
    pub fn encode(
        &self,
        backend: &impl RasterBackend,
        format: ImageFormat,
        quality: Option<u32>,
    ) -> Result<Vec<u8>, SessionError> {
        let rendered = self.render(backend)?;
        let bytes = match format {
            ImageFormat::Bmp => bmp::encode_bmp(backend, &rendered, quality)?,
            other => {
                let quality = quality.map(Quality::new).unwrap_or_default();
                backend.encode(&rendered, other, quality)?
            }
        };
        Ok(bytes)
    }

    /// Delete the source file. The session stays usable.
    pub fn remove_source(&self) -> Result<(), SessionError> {
        let path = self.source.as_deref().ok_or(SessionError::NoSource)?;
        std::fs::remove_file(path)?;
        debug!("removed source {}", path.display());
        Ok(())
    }
}
