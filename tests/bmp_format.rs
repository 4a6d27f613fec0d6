//! Byte-level checks of BMP output through the public API.
//!
//! Includes a reader that follows the written layout (bottom-up rows under a
//! negative height) and a comparison with the `image` crate's BMP decoder,
//! which trusts the negative height and therefore returns the rows flipped.

use nano_image::bmp::{self, BmpError, HEADER_SIZE};
use nano_image::imaging::{PixelSource, RasterImage, Rgb, RustBackend};

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn i32_at(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Decode a file as this crate lays it out: first stored row is the bottom one.
fn read_written_layout(bytes: &[u8]) -> (u32, u32, Vec<Rgb>) {
    assert_eq!(&bytes[..2], b"BM");
    let offset = u32_at(bytes, 10) as usize;
    let width = i32_at(bytes, 18) as u32;
    let height = i32_at(bytes, 22).unsigned_abs();
    assert_eq!(u16_at(bytes, 28), 24);

    let stride = width as usize * 3 + width as usize % 4;
    let mut pixels = vec![Rgb::default(); (width * height) as usize];
    for row in 0..height as usize {
        let y = height as usize - 1 - row;
        let start = offset + row * stride;
        for x in 0..width as usize {
            let p = &bytes[start + x * 3..start + x * 3 + 3];
            pixels[y * width as usize + x] = Rgb::new(p[2], p[1], p[0]);
        }
    }
    (width, height, pixels)
}

fn pattern(width: u32, height: u32) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        Rgb::new((x * 40) as u8, (y * 60) as u8, ((x + y) * 10) as u8)
    })
}

#[test]
fn red_four_by_two_is_exact() {
    let img = RasterImage::solid(4, 2, Rgb::new(255, 0, 0));
    let bytes = bmp::encode_bmp(&RustBackend::new(), &img, None).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(b"BM");
    expected.extend_from_slice(&78u32.to_le_bytes());
    expected.extend_from_slice(&[0, 0, 0, 0]);
    expected.extend_from_slice(&54u32.to_le_bytes());
    expected.extend_from_slice(&40u32.to_le_bytes());
    expected.extend_from_slice(&4i32.to_le_bytes());
    expected.extend_from_slice(&(-2i32).to_le_bytes());
    expected.extend_from_slice(&1u16.to_le_bytes());
    expected.extend_from_slice(&24u16.to_le_bytes());
    expected.extend_from_slice(&0u32.to_le_bytes());
    expected.extend_from_slice(&24u32.to_le_bytes());
    expected.extend_from_slice(&2835i32.to_le_bytes());
    expected.extend_from_slice(&2835i32.to_le_bytes());
    expected.extend_from_slice(&0u32.to_le_bytes());
    expected.extend_from_slice(&0u32.to_le_bytes());
    for _ in 0..8 {
        expected.extend_from_slice(&[0, 0, 255]);
    }

    assert_eq!(bytes, expected);
}

#[test]
fn file_size_formula_holds() {
    for (w, h) in [(1, 1), (3, 7), (5, 2), (16, 9), (33, 4)] {
        let bytes = bmp::write_bmp(&pattern(w, h)).unwrap();
        let stride = (w * 3 + w % 4) as usize;
        assert_eq!(bytes.len(), HEADER_SIZE + stride * h as usize, "{w}x{h}");
        assert_eq!(u32_at(&bytes, 2) as usize, bytes.len());
        assert_eq!(u32_at(&bytes, 34) as usize, stride * h as usize);
    }
}

#[test]
fn layout_aware_reader_recovers_pixels() {
    for (w, h) in [(4, 3), (5, 2), (7, 5)] {
        let src = pattern(w, h);
        let bytes = bmp::write_bmp(&src).unwrap();
        let (width, height, pixels) = read_written_layout(&bytes);
        assert_eq!((width, height), (w, h));
        for y in 0..h {
            for x in 0..w {
                assert_eq!(pixels[(y * w + x) as usize], src.color_at(x, y), "({x},{y})");
            }
        }
    }
}

#[test]
fn standard_reader_sees_rows_flipped() {
    let (w, h) = (4, 3);
    let src = pattern(w, h);
    let bytes = bmp::write_bmp(&src).unwrap();

    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Bmp)
        .unwrap()
        .to_rgb8();
    assert_eq!(decoded.dimensions(), (w, h));
    for y in 0..h {
        for x in 0..w {
            let [r, g, b] = decoded.get_pixel(x, y).0;
            assert_eq!(Rgb::new(r, g, b), src.color_at(x, h - 1 - y), "({x},{y})");
        }
    }
}

#[test]
fn quality_scales_before_encoding() {
    let src = pattern(20, 10);
    let bytes = bmp::encode_bmp(&RustBackend::new(), &src, Some(50)).unwrap();
    assert_eq!(i32_at(&bytes, 18), 10);
    assert_eq!(i32_at(&bytes, 22), -5);
    assert_eq!(bytes.len(), HEADER_SIZE + (10 * 3 + 2) * 5);
}

#[test]
fn full_quality_matches_unscaled() {
    let src = pattern(6, 4);
    let backend = RustBackend::new();
    assert_eq!(
        bmp::encode_bmp(&backend, &src, Some(100)).unwrap(),
        bmp::encode_bmp(&backend, &src, None).unwrap()
    );
}

#[test]
fn out_of_range_quality_rejected() {
    let src = pattern(4, 4);
    for q in [0, 101] {
        assert!(matches!(
            bmp::encode_bmp(&RustBackend::new(), &src, Some(q)),
            Err(BmpError::InvalidArgument(_))
        ));
    }
}

#[test]
fn file_output_matches_buffer() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("out.bmp");
    let src = pattern(5, 3);
    let backend = RustBackend::new();

    bmp::encode_bmp_to_file(&backend, &src, &path, None).unwrap();
    assert_eq!(
        std::fs::read(&path).unwrap(),
        bmp::encode_bmp(&backend, &src, None).unwrap()
    );
}
