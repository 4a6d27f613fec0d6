//! Parameter types for image operations.
//!
//! These describe *what* to do, not *how*. They are the interface between
//! the [`session`](crate::session) (which decides what to produce) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can stand in during tests without changing session logic.
//!
//! ## Types
//!
//! - [`Quality`] — Encoding quality (1–100, default 90).
//! - [`Blur`] — Gaussian blur strength.
//! - [`ResizeFilter`] — Resampling kernel used by the backend.

use serde::{Deserialize, Serialize};

/// Quality setting for image encoding (1-100).
///
/// For JPEG this is the encoder quality. For BMP it is a scale request, see
/// [`crate::bmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    /// Clamp `value` into the valid range.
    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Accept `value` only if it is already in range.
    pub fn try_new(value: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Gaussian blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blur {
    /// Standard deviation of the Gaussian kernel, in pixels.
    pub sigma: f32,
}

impl Blur {
    pub fn new(sigma: f32) -> Self {
        Self { sigma }
    }

    /// A zero, negative or NaN sigma leaves the image untouched.
    pub fn is_noop(self) -> bool {
        self.sigma.is_nan() || self.sigma <= 0.0
    }
}

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
