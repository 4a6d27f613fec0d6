//! Shared types used across the pipeline stages.
//!
//! These types cross module boundaries (session → export → CLI output) and are
//! serialized to JSON by `nano-image info --json`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raster formats the utility can write.
///
/// JPEG, PNG, GIF and WebP go through the imaging backend; BMP goes through
/// the crate's own [`bmp`](crate::bmp) codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    #[serde(rename = "webp")]
    WebP,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 5] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::WebP,
        ImageFormat::Bmp,
    ];

    /// Parse a file extension (without the dot), case-insensitively.
    ///
    /// Accepts both `jpg` and `jpeg`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension used when naming output files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
        }
    }

    /// Whether the backend's encoder for this format honours a quality value.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::WebP => "WebP",
            Self::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("unknown image format '{s}' (expected jpeg, png, gif, webp or bmp)")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing_is_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("WebP"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("tiff"), None);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/photo.Bmp")),
            Some(ImageFormat::Bmp)
        );
        assert_eq!(ImageFormat::from_path(Path::new("/tmp/noext")), None);
    }

    #[test]
    fn every_format_roundtrips_through_its_extension() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn only_jpeg_is_lossy() {
        let lossy: Vec<_> = ImageFormat::ALL.into_iter().filter(|f| f.is_lossy()).collect();
        assert_eq!(lossy, vec![ImageFormat::Jpeg]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ImageFormat::WebP).unwrap();
        assert_eq!(json, "\"webp\"");
        let back: ImageFormat = serde_json::from_str("\"bmp\"").unwrap();
        assert_eq!(back, ImageFormat::Bmp);
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(360, 200).to_string(), "360x200");
    }
}
