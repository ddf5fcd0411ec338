//! Binary graymap (PGM `P5`) reading and writing, plain or gzip-compressed.
//!
//! ```text
//! P5
//! # optional comment lines
//! <width> <height>
//! <maxgray>
//! <width * height raw bytes, row-major, top row first>
//! ```
//!
//! A `.gz` suffix selects the gzip reader.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use image::ImageFormat;
use image::codecs::pnm::PnmDecoder;

use crate::error::MapError;

const PGM_MAGIC: &str = "P5";

/// Decoded graymap, rows in file order (top row first).
#[derive(Debug, Clone)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub max_gray: u32,
    pub pixels: Vec<u8>,
}

/// True when the path names a gzip-compressed map.
pub fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read a graymap from disk.
pub fn read_pgm(path: &Path) -> Result<RawImage, MapError> {
    let bytes = if is_compressed(path) {
        read_compressed(path)?
    } else {
        let mut reader = BufReader::new(File::open(path)?);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        bytes
    };
    parse_pgm(&bytes)
}

#[cfg(feature = "gzip")]
fn read_compressed(path: &Path) -> Result<Vec<u8>, MapError> {
    let file = File::open(path)?;
    let mut decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(not(feature = "gzip"))]
fn read_compressed(_path: &Path) -> Result<Vec<u8>, MapError> {
    Err(MapError::UnsupportedCompression)
}

/// First whitespace-delimited token, for error reporting.
fn magic_token(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .take(8)
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or_else(|| bytes.len().min(8));
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Parse an in-memory graymap.
pub fn parse_pgm(bytes: &[u8]) -> Result<RawImage, MapError> {
    let magic = magic_token(bytes);
    if magic != PGM_MAGIC {
        return Err(MapError::BadMagic { found: magic });
    }

    // The decoder consumes the header up to the single whitespace byte
    // that precedes the pixel data.
    let mut cursor = Cursor::new(bytes);
    let decoder =
        PnmDecoder::new(&mut cursor).map_err(|e| MapError::BadHeader(e.to_string()))?;
    let (_, header) = decoder.into_inner();
    let data_start = cursor.position() as usize;

    let (width, height) = (header.width(), header.height());
    let max_gray = header.maximal_sample();
    if width == 0 || height == 0 {
        return Err(MapError::BadHeader(format!(
            "empty map {}x{}",
            width, height
        )));
    }
    if max_gray == 0 || max_gray > 255 {
        return Err(MapError::BadHeader(format!(
            "unsupported maxgray {}",
            max_gray
        )));
    }

    let expected = width as usize * height as usize;
    let available = bytes.len().saturating_sub(data_start);
    if available < expected {
        return Err(MapError::Truncated {
            expected,
            actual: available,
        });
    }

    let pixels = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)?
        .into_luma8()
        .into_raw();

    Ok(RawImage {
        width,
        height,
        max_gray,
        pixels,
    })
}

/// Write a graymap (uncompressed) with a one-line comment.
pub fn write_pgm(path: &Path, image: &RawImage) -> Result<(), MapError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_image(&mut writer, image)?;
    writer.flush()?;
    Ok(())
}

/// Write a gzip-compressed graymap.
#[cfg(feature = "gzip")]
pub fn write_pgm_gz(path: &Path, image: &RawImage) -> Result<(), MapError> {
    let file = File::create(path)?;
    let mut encoder =
        flate2::write::GzEncoder::new(BufWriter::new(file), flate2::Compression::default());
    write_image(&mut encoder, image)?;
    encoder.finish()?.flush()?;
    Ok(())
}

fn write_image<W: Write>(writer: &mut W, image: &RawImage) -> std::io::Result<()> {
    writeln!(writer, "{}", PGM_MAGIC)?;
    writeln!(writer, "# drishti-mcl occupancy map")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "{}", image.max_gray)?;
    writer.write_all(&image.pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32) -> Vec<u8> {
        format!("P5\n# CREATOR: test\n{} {}\n255\n", width, height).into_bytes()
    }

    #[test]
    fn test_parse_with_comment_line() {
        let mut bytes = header(3, 2);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let image = parse_pgm(&bytes).unwrap();
        assert_eq!((image.width, image.height, image.max_gray), (3, 2, 255));
        assert_eq!(image.pixels, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_without_comment_and_single_line_header() {
        let mut bytes = b"P5 2 2 255\n".to_vec();
        bytes.extend_from_slice(&[10, 20, 30, 40]);
        let image = parse_pgm(&bytes).unwrap();
        assert_eq!(image.pixels, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_pixel_values_that_look_like_whitespace() {
        // Leading data bytes equal to '\n' and ' ' must not be eaten
        let mut bytes = header(2, 1);
        bytes.extend_from_slice(&[b'\n', b' ']);
        let image = parse_pgm(&bytes).unwrap();
        assert_eq!(image.pixels, vec![b'\n', b' ']);
    }

    #[test]
    fn test_bad_magic() {
        let bytes = b"P2\n2 2\n255\n0 0 0 0".to_vec();
        match parse_pgm(&bytes) {
            Err(MapError::BadMagic { found }) => assert_eq!(found, "P2"),
            other => panic!("expected BadMagic, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_bad_magic() {
        assert!(matches!(parse_pgm(&[]), Err(MapError::BadMagic { .. })));
    }

    #[test]
    fn test_truncated() {
        let mut bytes = header(4, 4);
        bytes.extend_from_slice(&[255; 10]);
        match parse_pgm(&bytes) {
            Err(MapError::Truncated { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 10);
            }
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_header() {
        let bytes = b"P5\nwide 4\n255\n".to_vec();
        assert!(matches!(parse_pgm(&bytes), Err(MapError::BadHeader(_))));
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed(Path::new("maps/cave.pgm.gz")));
        assert!(!is_compressed(Path::new("maps/cave.pgm")));
    }

    #[test]
    fn test_write_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.pgm");
        let image = RawImage {
            width: 4,
            height: 3,
            max_gray: 255,
            pixels: (0..12).map(|v| v * 20).collect(),
        };
        write_pgm(&path, &image).unwrap();
        let loaded = read_pgm(&path).unwrap();
        assert_eq!(loaded.pixels, image.pixels);
        assert_eq!((loaded.width, loaded.height), (4, 3));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_write_read_compressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.pgm.gz");
        let image = RawImage {
            width: 5,
            height: 2,
            max_gray: 255,
            pixels: vec![255, 0, 255, 0, 255, 7, 7, 7, 7, 7],
        };
        write_pgm_gz(&path, &image).unwrap();
        let loaded = read_pgm(&path).unwrap();
        assert_eq!(loaded.pixels, image.pixels);
    }

    #[cfg(not(feature = "gzip"))]
    #[test]
    fn test_compressed_file_needs_gzip_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.pgm.gz");
        std::fs::write(&path, [0x1f, 0x8b, 0x08, 0x00]).unwrap();
        assert!(matches!(read_pgm(&path), Err(MapError::UnsupportedCompression)));
    }

    #[test]
    fn test_maxgray_above_byte_range() {
        let mut bytes = b"P5\n2 1\n65535\n".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(parse_pgm(&bytes), Err(MapError::BadHeader(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_pgm(Path::new("/nonexistent/definitely/missing.pgm"));
        assert!(matches!(result, Err(MapError::Io(_))));
    }
}
