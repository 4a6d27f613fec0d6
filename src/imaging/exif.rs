//! Minimal EXIF reader and writer for JPEG files.
//!
//! Handles the IFD0 subset of EXIF: the tags a photo carries about itself
//! (description, camera make/model, orientation, resolution, software,
//! timestamp, artist, copyright). Sub-IFDs (ExifIFD, GPS, thumbnails) are
//! neither read nor written.
//!
//! For reading: APP1 marker with `"Exif\0\0"` header, then a TIFF structure
//! (byte-order mark, magic 42, IFD0 offset).
//! For writing: a fresh little-endian TIFF block with a single IFD0, wrapped in
//! a new APP1 segment that replaces any existing EXIF segments.

use super::backend::BackendError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// IFD0 tag numbers understood by this module.
pub mod tags {
    pub const IMAGE_DESCRIPTION: u16 = 0x010E;
    pub const MAKE: u16 = 0x010F;
    pub const MODEL: u16 = 0x0110;
    pub const ORIENTATION: u16 = 0x0112;
    pub const X_RESOLUTION: u16 = 0x011A;
    pub const Y_RESOLUTION: u16 = 0x011B;
    pub const RESOLUTION_UNIT: u16 = 0x0128;
    pub const SOFTWARE: u16 = 0x0131;
    pub const DATE_TIME: u16 = 0x0132;
    pub const ARTIST: u16 = 0x013B;
    pub const COPYRIGHT: u16 = 0x8298;
}

/// Human-readable name for a known tag.
pub fn tag_name(tag: u16) -> Option<&'static str> {
    Some(match tag {
        tags::IMAGE_DESCRIPTION => "ImageDescription",
        tags::MAKE => "Make",
        tags::MODEL => "Model",
        tags::ORIENTATION => "Orientation",
        tags::X_RESOLUTION => "XResolution",
        tags::Y_RESOLUTION => "YResolution",
        tags::RESOLUTION_UNIT => "ResolutionUnit",
        tags::SOFTWARE => "Software",
        tags::DATE_TIME => "DateTime",
        tags::ARTIST => "Artist",
        tags::COPYRIGHT => "Copyright",
        _ => return None,
    })
}

/// A single EXIF value. Only the TIFF types this module round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExifValue {
    Ascii(String),
    Short(u16),
    Long(u32),
    Rational(u32, u32),
}

impl std::fmt::Display for ExifValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascii(s) => f.write_str(s),
            Self::Short(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Rational(n, d) => write!(f, "{n}/{d}"),
        }
    }
}

/// EXIF tags keyed by tag number, kept in tag order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExifData {
    entries: BTreeMap<u16, ExifValue>,
}

impl ExifData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: u16) -> Option<&ExifValue> {
        self.entries.get(&tag)
    }

    pub fn insert(&mut self, tag: u16, value: ExifValue) -> Option<ExifValue> {
        self.entries.insert(tag, value)
    }

    pub fn remove(&mut self, tag: u16) -> Option<ExifValue> {
        self.entries.remove(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ExifValue)> {
        self.entries.iter().map(|(tag, value)| (*tag, value))
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: u16, value: ExifValue) -> Self {
        self.insert(tag, value);
        self
    }
}

/// Read EXIF from a file. JPEG only; any other format yields an empty map.
pub fn read_exif(path: &Path) -> Result<ExifData, BackendError> {
    let bytes = std::fs::read(path)?;
    Ok(read_exif_from_jpeg(&bytes))
}

/// Replace the EXIF block of a JPEG file on disk.
pub fn write_exif(path: &Path, exif: &ExifData) -> Result<(), BackendError> {
    let bytes = std::fs::read(path)?;
    let updated = insert_exif(&bytes, exif)?;
    std::fs::write(path, updated)?;
    Ok(())
}

/// Parse EXIF out of JPEG bytes. Returns an empty map on any parse failure.
pub fn read_exif_from_jpeg(data: &[u8]) -> ExifData {
    let Ok(layout) = JpegLayout::parse(data) else {
        return ExifData::default();
    };
    layout
        .segments
        .iter()
        .find(|s| s.is_exif(data))
        .map(|s| parse_tiff(&data[s.payload_start() + EXIF_HEADER.len()..s.end]))
        .unwrap_or_default()
}

/// Remove every EXIF APP1 segment from a JPEG byte stream.
pub fn strip_exif(data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let layout = JpegLayout::parse(data)?;
    Ok(layout.rebuild(data, None))
}

/// Replace the EXIF of a JPEG byte stream with `exif`.
///
/// An empty map strips EXIF entirely rather than writing an empty IFD.
pub fn insert_exif(data: &[u8], exif: &ExifData) -> Result<Vec<u8>, BackendError> {
    let layout = JpegLayout::parse(data)?;
    if exif.is_empty() {
        return Ok(layout.rebuild(data, None));
    }
    let segment = build_app1_segment(exif)?;
    Ok(layout.rebuild(data, Some(&segment)))
}

// ---------------------------------------------------------------------------
// JPEG segment walking
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const MARKER_APP1: u8 = 0xE1;
const MARKER_SOS: u8 = 0xDA;
const MARKER_EOI: u8 = 0xD9;

/// One marker segment: `start` is the 0xFF byte, `end` is one past the payload.
#[derive(Debug, Clone, Copy)]
struct Segment {
    marker: u8,
    start: usize,
    end: usize,
}

impl Segment {
    fn payload_start(&self) -> usize {
        self.start + 4
    }

    fn is_exif(&self, data: &[u8]) -> bool {
        self.marker == MARKER_APP1 && data[self.payload_start()..self.end].starts_with(EXIF_HEADER)
    }
}

/// Header segments of a JPEG plus where the entropy-coded tail begins.
#[derive(Debug)]
struct JpegLayout {
    segments: Vec<Segment>,
    tail_start: usize,
}

impl JpegLayout {
    fn parse(data: &[u8]) -> Result<Self, BackendError> {
        if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
            return Err(BackendError::UnsupportedFormat(
                "EXIF can only be embedded in JPEG data".into(),
            ));
        }

        let mut segments = Vec::new();
        let mut pos = 2;
        loop {
            if pos + 1 >= data.len() {
                return Ok(Self {
                    segments,
                    tail_start: data.len(),
                });
            }
            if data[pos] != 0xFF {
                return Err(BackendError::ProcessingFailed(format!(
                    "corrupt JPEG: expected marker at offset {pos}"
                )));
            }
            let marker = data[pos + 1];
            // Fill bytes before a marker
            if marker == 0xFF {
                pos += 1;
                continue;
            }
            // Entropy-coded data follows SOS; everything from here is copied verbatim
            if marker == MARKER_SOS || marker == MARKER_EOI {
                return Ok(Self {
                    segments,
                    tail_start: pos,
                });
            }
            // Markers without a length field
            if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
                continue;
            }
            if pos + 4 > data.len() {
                return Err(BackendError::ProcessingFailed(
                    "corrupt JPEG: truncated segment header".into(),
                ));
            }
            let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let end = pos + 2 + len;
            if len < 2 || end > data.len() {
                return Err(BackendError::ProcessingFailed(format!(
                    "corrupt JPEG: segment 0x{marker:02X} at {pos} overruns the file"
                )));
            }
            segments.push(Segment {
                marker,
                start: pos,
                end,
            });
            pos = end;
        }
    }

    /// SOI, optional new EXIF segment, all non-EXIF segments, then the tail.
    fn rebuild(&self, data: &[u8], exif_segment: Option<&[u8]>) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + exif_segment.map_or(0, <[u8]>::len));
        out.extend_from_slice(&data[..2]);
        if let Some(segment) = exif_segment {
            out.extend_from_slice(segment);
        }
        for s in self.segments.iter().filter(|s| !s.is_exif(data)) {
            out.extend_from_slice(&data[s.start..s.end]);
        }
        out.extend_from_slice(&data[self.tail_start..]);
        out
    }
}

// ---------------------------------------------------------------------------
// TIFF IFD0 parsing
// ---------------------------------------------------------------------------

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

fn parse_tiff(data: &[u8]) -> ExifData {
    let mut result = ExifData::default();
    if data.len() < 8 {
        return result;
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return result,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let b = data.get(offset..offset + 2)?;
        Some(if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        })
    };
    let read_u32 = |offset: usize| -> Option<u32> {
        let b = data.get(offset..offset + 4)?;
        Some(if big_endian {
            u32::from_be_bytes([b[0], b[1], b[2], b[3]])
        } else {
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        })
    };

    if read_u16(2) != Some(42) {
        return result;
    }
    let Some(ifd_offset) = read_u32(4).map(|o| o as usize) else {
        return result;
    };
    let Some(entry_count) = read_u16(ifd_offset) else {
        return result;
    };

    for i in 0..entry_count as usize {
        let entry = ifd_offset + 2 + i * 12;
        let (Some(tag), Some(typ), Some(count)) =
            (read_u16(entry), read_u16(entry + 2), read_u32(entry + 4))
        else {
            break;
        };
        let count = count as usize;
        let value_field = entry + 8;

        let value = match typ {
            TYPE_ASCII => {
                // Up to 4 bytes are stored inline in the value field
                let start = if count <= 4 {
                    Some(value_field)
                } else {
                    read_u32(value_field).map(|o| o as usize)
                };
                start
                    .and_then(|s| data.get(s..s.checked_add(count)?))
                    .map(|bytes| {
                        let text = bytes.split(|&b| b == 0).next().unwrap_or_default();
                        ExifValue::Ascii(String::from_utf8_lossy(text).trim().to_string())
                    })
            }
            TYPE_SHORT if count >= 1 => read_u16(value_field).map(ExifValue::Short),
            TYPE_LONG if count >= 1 => read_u32(value_field).map(ExifValue::Long),
            TYPE_RATIONAL if count >= 1 => read_u32(value_field).and_then(|o| {
                let o = o as usize;
                Some(ExifValue::Rational(read_u32(o)?, read_u32(o + 4)?))
            }),
            _ => None,
        };

        if let Some(value) = value {
            result.insert(tag, value);
        }
    }

    result
}

// ---------------------------------------------------------------------------
// TIFF IFD0 serialization
// ---------------------------------------------------------------------------

/// Serialize `exif` as a little-endian TIFF block with a single IFD0.
fn build_tiff(exif: &ExifData) -> Vec<u8> {
    let count = exif.len();
    let ifd_start = 8;
    let data_start = ifd_start + 2 + count * 12 + 4;

    let mut ifd = Vec::with_capacity(2 + count * 12 + 4);
    let mut extra: Vec<u8> = Vec::new();

    ifd.extend_from_slice(&(count as u16).to_le_bytes());
    for (tag, value) in exif.iter() {
        ifd.extend_from_slice(&tag.to_le_bytes());

        // Out-of-line values land after the IFD, word aligned
        let mut place = |bytes: &[u8]| -> [u8; 4] {
            let offset = (data_start + extra.len()) as u32;
            extra.extend_from_slice(bytes);
            if extra.len() % 2 == 1 {
                extra.push(0);
            }
            offset.to_le_bytes()
        };

        let (typ, n, field): (u16, u32, [u8; 4]) = match value {
            ExifValue::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                let n = bytes.len() as u32;
                if bytes.len() <= 4 {
                    let mut field = [0u8; 4];
                    field[..bytes.len()].copy_from_slice(&bytes);
                    (TYPE_ASCII, n, field)
                } else {
                    (TYPE_ASCII, n, place(&bytes))
                }
            }
            ExifValue::Short(v) => {
                let b = v.to_le_bytes();
                (TYPE_SHORT, 1, [b[0], b[1], 0, 0])
            }
            ExifValue::Long(v) => (TYPE_LONG, 1, v.to_le_bytes()),
            ExifValue::Rational(num, den) => {
                let mut bytes = [0u8; 8];
                bytes[..4].copy_from_slice(&num.to_le_bytes());
                bytes[4..].copy_from_slice(&den.to_le_bytes());
                (TYPE_RATIONAL, 1, place(&bytes))
            }
        };

        ifd.extend_from_slice(&typ.to_le_bytes());
        ifd.extend_from_slice(&n.to_le_bytes());
        ifd.extend_from_slice(&field);
    }
    ifd.extend_from_slice(&0u32.to_le_bytes()); // no IFD1

    let mut out = Vec::with_capacity(data_start + extra.len());
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&(ifd_start as u32).to_le_bytes());
    out.extend_from_slice(&ifd);
    out.extend_from_slice(&extra);
    out
}

/// Full APP1 segment (marker, length, `"Exif\0\0"`, TIFF block).
fn build_app1_segment(exif: &ExifData) -> Result<Vec<u8>, BackendError> {
    let tiff = build_tiff(exif);
    let len = 2 + EXIF_HEADER.len() + tiff.len();
    let len = u16::try_from(len).map_err(|_| {
        BackendError::ProcessingFailed(format!(
            "EXIF block of {len} bytes does not fit in a JPEG segment"
        ))
    })?;

    let mut out = Vec::with_capacity(len as usize + 2);
    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(&tiff);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, a JFIF-ish APP0, an existing EXIF APP1, SOS with fake scan data, EOI.
    fn fake_jpeg_with_exif(exif_payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x07, b'J', b'F', b'I', b'F', 0]);
        let len = (2 + exif_payload.len()) as u16;
        data.extend_from_slice(&[0xFF, 0xE1]);
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(exif_payload);
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x12, 0x34, 0x56, 0xFF, 0xD9]);
        data
    }

    fn sample_exif() -> ExifData {
        ExifData::new()
            .with(tags::ARTIST, ExifValue::Ascii("Peter".into()))
            .with(tags::MAKE, ExifValue::Ascii("Fujifilm".into()))
            .with(tags::ORIENTATION, ExifValue::Short(6))
            .with(tags::X_RESOLUTION, ExifValue::Rational(72, 1))
            .with(tags::SOFTWARE, ExifValue::Ascii("abc".into()))
    }

    #[test]
    fn tiff_roundtrip_keeps_all_value_types() {
        let exif = sample_exif();
        assert_eq!(parse_tiff(&build_tiff(&exif)), exif);
    }

    #[test]
    fn parse_big_endian_tiff() {
        // MM, magic 42, IFD at 8, one SHORT entry: Orientation = 3
        let data = [
            b'M', b'M', 0, 42, 0, 0, 0, 8, //
            0, 1, //
            0x01, 0x12, 0, 3, 0, 0, 0, 1, 0, 3, 0, 0, //
            0, 0, 0, 0,
        ];
        let exif = parse_tiff(&data);
        assert_eq!(exif.get(tags::ORIENTATION), Some(&ExifValue::Short(3)));
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let data = [b'I', b'I', 43, 0, 8, 0, 0, 0, 0, 0];
        assert!(parse_tiff(&data).is_empty());
    }

    #[test]
    fn parse_truncated_ifd_keeps_what_it_read() {
        let mut tiff = build_tiff(&ExifData::new().with(tags::ORIENTATION, ExifValue::Short(1)));
        // Claim two entries while only one is present
        tiff[8] = 2;
        tiff.truncate(8 + 2 + 12);
        let exif = parse_tiff(&tiff);
        assert_eq!(exif.get(tags::ORIENTATION), Some(&ExifValue::Short(1)));
    }

    #[test]
    fn read_from_jpeg_finds_app1() {
        let mut payload = EXIF_HEADER.to_vec();
        payload.extend_from_slice(&build_tiff(&sample_exif()));
        let jpeg = fake_jpeg_with_exif(&payload);
        assert_eq!(read_exif_from_jpeg(&jpeg), sample_exif());
    }

    #[test]
    fn read_from_non_jpeg_is_empty() {
        assert!(read_exif_from_jpeg(b"\x89PNG\r\n\x1a\n").is_empty());
    }

    #[test]
    fn strip_removes_exif_and_keeps_everything_else() {
        let mut payload = EXIF_HEADER.to_vec();
        payload.extend_from_slice(&build_tiff(&sample_exif()));
        let jpeg = fake_jpeg_with_exif(&payload);

        let stripped = strip_exif(&jpeg).unwrap();
        assert!(read_exif_from_jpeg(&stripped).is_empty());
        assert_eq!(stripped.len(), jpeg.len() - (payload.len() + 4));
        assert!(stripped.starts_with(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(stripped.ends_with(&[0x12, 0x34, 0x56, 0xFF, 0xD9]));
    }

    #[test]
    fn insert_replaces_existing_exif() {
        let mut payload = EXIF_HEADER.to_vec();
        payload.extend_from_slice(&build_tiff(&sample_exif()));
        let jpeg = fake_jpeg_with_exif(&payload);

        let replacement =
            ExifData::new().with(tags::COPYRIGHT, ExifValue::Ascii("(c) 2019".into()));
        let updated = insert_exif(&jpeg, &replacement).unwrap();

        assert_eq!(read_exif_from_jpeg(&updated), replacement);
        // New segment goes right after SOI
        assert_eq!(&updated[2..4], &[0xFF, MARKER_APP1]);
    }

    #[test]
    fn insert_empty_map_strips() {
        let mut payload = EXIF_HEADER.to_vec();
        payload.extend_from_slice(&build_tiff(&sample_exif()));
        let jpeg = fake_jpeg_with_exif(&payload);
        let updated = insert_exif(&jpeg, &ExifData::new()).unwrap();
        assert_eq!(updated, strip_exif(&jpeg).unwrap());
    }

    #[test]
    fn insert_into_non_jpeg_is_unsupported() {
        let err = insert_exif(b"BM\0\0\0\0", &sample_exif()).unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedFormat(_)));
    }

    #[test]
    fn oversized_exif_is_rejected() {
        let huge = ExifData::new().with(tags::IMAGE_DESCRIPTION, ExifValue::Ascii("x".repeat(70_000)));
        let jpeg = fake_jpeg_with_exif(b"Exif\0\0");
        let err = insert_exif(&jpeg, &huge).unwrap_err();
        assert!(matches!(err, BackendError::ProcessingFailed(_)));
    }

    #[test]
    fn corrupt_segment_length_is_an_error() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0xFF, 0xFF];
        assert!(strip_exif(&data).is_err());
    }

    #[test]
    fn write_and_read_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        std::fs::write(&path, fake_jpeg_with_exif(b"Exif\0\0")).unwrap();

        write_exif(&path, &sample_exif()).unwrap();
        assert_eq!(read_exif(&path).unwrap(), sample_exif());
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read_exif(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[test]
    fn tag_names_cover_known_tags() {
        assert_eq!(tag_name(tags::ARTIST), Some("Artist"));
        assert_eq!(tag_name(0x9999), None);
    }
}
