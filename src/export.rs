//! Writing a session to disk.
//!
//! Picks the encoder from the output format, applies a [`SavePolicy`] to
//! decide the final file name, creates missing directories, and embeds the
//! session's EXIF when the output is JPEG.
//!
//! ## Quality per format
//!
//! | Format | `quality` |
//! |---|---|
//! | JPEG | encoder quality, default 90 |
//! | PNG, GIF, WebP | ignored (lossless) |
//! | BMP | scale factor, only applied when given |

use crate::bmp::BmpError;
use crate::imaging::{BackendError, RasterBackend, exif};
use crate::naming::{SavePolicy, plan_output};
use crate::session::{ImageSession, SessionError};
use crate::types::{Dimensions, ImageFormat};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("BMP encoding failed: {0}")]
    Bmp(#[from] BmpError),
    #[error("Cannot determine output format for {0}")]
    UnknownFormat(String),
}

impl From<SessionError> for ExportError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Io(e) => ExportError::Io(e),
            SessionError::Backend(e) => ExportError::Backend(e),
            SessionError::Bmp(e) => ExportError::Bmp(e),
            SessionError::NoSource => {
                ExportError::Io(std::io::Error::other("session has no source file"))
            }
        }
    }
}

/// Encoder settings shared by every save variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// JPEG quality or BMP scale; `None` uses the format's default.
    pub quality: Option<u32>,
}

/// What a save produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
    pub bytes_written: usize,
    pub removed_existing: bool,
}

/// Encode the session for `format`, embedding its EXIF into JPEG output.
pub fn encode(
    backend: &impl RasterBackend,
    session: &ImageSession,
    format: ImageFormat,
    options: SaveOptions,
) -> Result<Vec<u8>, ExportError> {
    let bytes = session.encode(backend, format, options.quality)?;
    match session.exif() {
        Some(data) if format == ImageFormat::Jpeg => Ok(exif::insert_exif(&bytes, data)?),
        Some(data) => {
            warn!("dropping {} EXIF tags: {format} output has no EXIF", data.len());
            Ok(bytes)
        }
        None => Ok(bytes),
    }
}

/// Save with the format taken from `to`'s extension.
pub fn save(
    backend: &impl RasterBackend,
    session: &ImageSession,
    to: &Path,
    policy: SavePolicy,
    options: SaveOptions,
) -> Result<SaveReport, ExportError> {
    let format = ImageFormat::from_path(to)
        .ok_or_else(|| ExportError::UnknownFormat(to.display().to_string()))?;
    save_as(backend, session, to, policy, options, format)
}

/// Save as `format`; `to`'s extension is replaced with the format's.
pub fn save_as(
    backend: &impl RasterBackend,
    session: &ImageSession,
    to: &Path,
    policy: SavePolicy,
    options: SaveOptions,
    format: ImageFormat,
) -> Result<SaveReport, ExportError> {
    let plan = plan_output(
        to,
        format.extension(),
        policy,
        session.crop_dimensions(),
        unix_now(),
        Path::exists,
    );

    let bytes = encode(backend, session, format, options)?;
    let dimensions = rendered_dimensions(session, format, options);

    if let Some(parent) = plan.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if plan.remove_existing {
        debug!("removing existing {}", plan.path.display());
        std::fs::remove_file(&plan.path)?;
    }
    std::fs::write(&plan.path, &bytes)?;

    info!(
        "saved {} ({format}, {dimensions}, {} bytes)",
        plan.path.display(),
        bytes.len()
    );

    Ok(SaveReport {
        path: plan.path,
        format,
        dimensions,
        bytes_written: bytes.len(),
        removed_existing: plan.remove_existing,
    })
}

/// Save over `to`, deleting any file already there.
pub fn replace(
    backend: &impl RasterBackend,
    session: &ImageSession,
    to: &Path,
    options: SaveOptions,
) -> Result<SaveReport, ExportError> {
    save(backend, session, to, SavePolicy::Replace, options)
}

/// Size of the pixels actually written. BMP with a quality is scaled again.
fn rendered_dimensions(
    session: &ImageSession,
    format: ImageFormat,
    options: SaveOptions,
) -> Dimensions {
    let target = session.target_dimensions();
    match (format, options.quality) {
        (ImageFormat::Bmp, Some(q)) => crate::imaging::scaled_dimensions(
            target,
            crate::imaging::scale_for_quality(q),
        ),
        _ => target,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
