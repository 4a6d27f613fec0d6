//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Format: JPEG
//!     Size: 4000x3000
//!     EXIF: 3 tags
//!         Make: Canon
//!         Model: EOS R5
//!         0x9999: 7
//! ```
//!
//! ## Convert
//!
//! ```text
//! photo.jpg → out/photo-360x200.bmp
//!     Format: BMP
//!     Size: 360x200
//!     Written: 216054 bytes (replaced existing)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::export::SaveReport;
use crate::imaging::exif::tag_name;
use crate::session::ImageSession;
use crate::types::{Dimensions, ImageFormat};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Longest EXIF value shown in text output.
const MAX_VALUE_CHARS: usize = 60;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display name for an EXIF tag: its standard name, or hex for unknown tags.
fn tag_label(tag: u16) -> String {
    match tag_name(tag) {
        Some(name) => name.to_string(),
        None => format!("0x{tag:04X}"),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_value(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Everything `info` reports about an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub format: Option<ImageFormat>,
    pub dimensions: Dimensions,
    /// Tag label → displayed value.
    pub exif: BTreeMap<String, String>,
}

impl ImageInfo {
    pub fn from_session(path: &Path, session: &ImageSession) -> Self {
        let exif = session
            .exif()
            .map(|data| {
                data.iter()
                    .map(|(tag, value)| (tag_label(tag), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            format: session.source_format(),
            dimensions: session.original_dimensions(),
            exif,
        }
    }
}

// ============================================================================
// Info
// ============================================================================

/// Format the `info` command output.
pub fn format_info(info: &ImageInfo) -> Vec<String> {
    let mut lines = vec![info.path.display().to_string()];
    let format = info
        .format
        .map_or_else(|| "unknown".to_string(), |f| f.to_string());
    lines.push(format!("{}Format: {format}", indent(1)));
    lines.push(format!("{}Size: {}", indent(1), info.dimensions));

    if info.exif.is_empty() {
        lines.push(format!("{}EXIF: none", indent(1)));
    } else {
        let noun = if info.exif.len() == 1 { "tag" } else { "tags" };
        lines.push(format!("{}EXIF: {} {noun}", indent(1), info.exif.len()));
        for (label, value) in &info.exif {
            lines.push(format!(
                "{}{label}: {}",
                indent(2),
                truncate_value(value, MAX_VALUE_CHARS)
            ));
        }
    }
    lines
}

/// Print `info` output to stdout.
pub fn print_info(info: &ImageInfo) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

/// `info --json` output.
pub fn format_info_json(info: &ImageInfo) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(info)
}

// ============================================================================
// Convert
// ============================================================================

/// Format the result of a file-to-file `convert`.
pub fn format_save_report(source: &Path, report: &SaveReport) -> Vec<String> {
    let written = if report.removed_existing {
        format!("{} bytes (replaced existing)", report.bytes_written)
    } else {
        format!("{} bytes", report.bytes_written)
    };
    vec![
        format!("{} → {}", source.display(), report.path.display()),
        format!("{}Format: {}", indent(1), report.format),
        format!("{}Size: {}", indent(1), report.dimensions),
        format!("{}Written: {written}", indent(1)),
    ]
}

/// Print `convert` output to stdout.
pub fn print_save_report(source: &Path, report: &SaveReport) {
    for line in format_save_report(source, report) {
        println!("{}", line);
    }
}
