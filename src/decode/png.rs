//! PNG decoding via the `png` crate

use crate::error::{Error, Result};
use crate::frame::{rgba_len, SourceImage, RGBA_BPP};
use crate::processing::alloc_buffer;
use crate::types::Resolution;

use super::ImageKind;

use png::{BitDepth, ColorType, Transformations};

/// Decoder memory cap; enough for an 8192x8192 16-bit RGBA image
const PNG_MEMORY_LIMIT: usize = 1 << 30;

/// Decode PNG bytes into canonical RGBA
///
/// Palette, low bit-depth grey and tRNS are expanded, 16-bit samples are
/// stripped to 8, grey is promoted to RGB and missing alpha is filled with 255.
pub fn decode_png(data: &[u8]) -> Result<SourceImage> {
    let mut decoder = png::Decoder::new_with_limits(
        data,
        png::Limits {
            bytes: PNG_MEMORY_LIMIT,
        },
    );
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| Error::Decode(format!("Invalid PNG header: {}", e)))?;
    let header = reader.info();
    super::check_native_size(ImageKind::Png, Resolution::new(header.width, header.height))?;

    let mut buf = alloc_buffer(reader.output_buffer_size())?;
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| Error::Decode(format!("Failed to decode PNG data: {}", e)))?;

    if info.bit_depth != BitDepth::Eight {
        return Err(Error::Decode(format!(
            "Unexpected PNG bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let channels = match info.color_type {
        ColorType::Grayscale => 1,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Rgb => 3,
        ColorType::Rgba => 4,
        ColorType::Indexed => {
            return Err(Error::Decode("PNG palette was not expanded".into()));
        }
    };

    let resolution = Resolution::new(info.width, info.height);
    let row_bytes = info.width as usize * channels;
    if info.line_size < row_bytes || buf.len() < info.line_size * info.height as usize {
        return Err(Error::Decode("PNG row data shorter than image width".into()));
    }

    // Rows may carry padding beyond width * channels; the output never does
    let mut rgba = alloc_buffer(rgba_len(resolution)?)?;
    let dst_stride = info.width as usize * RGBA_BPP;
    for (src_row, dst_row) in buf
        .chunks(info.line_size)
        .zip(rgba.chunks_exact_mut(dst_stride))
    {
        expand_row(&src_row[..row_bytes], dst_row, channels);
    }

    tracing::debug!(
        "Decoded PNG {} ({:?}, {} channel(s))",
        resolution,
        info.color_type,
        channels
    );
    SourceImage::new(rgba, info.width, info.height)
}

/// Widen one row of 1-4 channel samples to RGBA
fn expand_row(src: &[u8], dst: &mut [u8], channels: usize) {
    for (s, d) in src.chunks_exact(channels).zip(dst.chunks_exact_mut(RGBA_BPP)) {
        match *s {
            [l] => d.copy_from_slice(&[l, l, l, 255]),
            [l, a] => d.copy_from_slice(&[l, l, l, a]),
            [r, g, b] => d.copy_from_slice(&[r, g, b, 255]),
            [r, g, b, a] => d.copy_from_slice(&[r, g, b, a]),
            _ => unreachable!("chunks_exact yields {} samples", channels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encode_png, solid_png};

    #[test]
    fn test_rgba8() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        let bytes = encode_png(2, 1, ColorType::Rgba, BitDepth::Eight, &data, None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.resolution(), Resolution::new(2, 1));
        assert_eq!(image.pixels(), &data);
    }

    #[test]
    fn test_rgb8_gets_opaque_alpha() {
        let data = [10, 20, 30, 40, 50, 60];
        let bytes = encode_png(1, 2, ColorType::Rgb, BitDepth::Eight, &data, None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.pixels(), &[10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_rgb16_is_stripped() {
        // Big-endian samples: high byte survives
        let data = [0xAB, 0xCD, 0x12, 0x34, 0xFF, 0x00];
        let bytes = encode_png(1, 1, ColorType::Rgb, BitDepth::Sixteen, &data, None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.pixels(), &[0xAB, 0x12, 0xFF, 255]);
    }

    #[test]
    fn test_grayscale_promoted_to_rgb() {
        let bytes = encode_png(2, 1, ColorType::Grayscale, BitDepth::Eight, &[0, 200], None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.pixels(), &[0, 0, 0, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_grayscale_alpha() {
        let bytes = encode_png(1, 1, ColorType::GrayscaleAlpha, BitDepth::Eight, &[77, 9], None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(image.pixels(), &[77, 77, 77, 9]);
    }

    #[test]
    fn test_one_bit_grayscale_expanded() {
        // 3 pixels packed in one byte: 1, 0, 1
        let bytes = encode_png(3, 1, ColorType::Grayscale, BitDepth::One, &[0b1010_0000], None);
        let image = decode_png(&bytes).unwrap();
        assert_eq!(
            image.pixels(),
            &[255, 255, 255, 255, 0, 0, 0, 255, 255, 255, 255, 255]
        );
    }

    #[test]
    fn test_palette_with_transparency() {
        let palette = vec![255, 0, 0, 0, 0, 255];
        let trns = vec![128];
        let bytes = encode_png(
            2,
            1,
            ColorType::Indexed,
            BitDepth::Eight,
            &[0, 1],
            Some((palette, trns)),
        );
        let image = decode_png(&bytes).unwrap();
        // Index 1 has no tRNS entry and stays opaque
        assert_eq!(image.pixels(), &[255, 0, 0, 128, 0, 0, 255, 255]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(decode_png(&[]), Err(Error::Decode(_))));
        assert!(matches!(decode_png(b"not a png at all"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_is_decode_error() {
        let data: Vec<u8> = (0..16 * 16 * 4).map(|i| (i * 7 % 251) as u8).collect();
        let bytes = encode_png(16, 16, ColorType::Rgba, BitDepth::Eight, &data, None);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(decode_png(truncated), Err(Error::Decode(_))));
    }

    #[test]
    fn test_oversized_header_rejected() {
        let bytes = solid_png(1, 9000, [1, 2, 3, 255]);
        let err = decode_png(&bytes).unwrap_err();
        assert!(matches!(err, Error::Decode(ref msg) if msg.contains("1x9000")), "{:?}", err);
    }
}
