//! JPEG decoding using the pure-Rust zune-jpeg backend

use crate::error::{Error, Result};
use crate::frame::{rgba_len, SourceImage, RGBA_BPP};
use crate::processing::alloc_buffer;
use crate::types::Resolution;

use super::ImageKind;

use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode JPEG bytes into canonical RGBA with opaque alpha
pub fn decode_jpeg(data: &[u8]) -> Result<SourceImage> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);

    decoder
        .decode_headers()
        .map_err(|e| Error::Decode(format!("Invalid JPEG header: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::Decode("JPEG missing frame header".into()))?;
    let resolution = Resolution::new(info.width as u32, info.height as u32);
    super::check_native_size(ImageKind::Jpeg, resolution)?;

    let pixels = decoder
        .decode()
        .map_err(|e| Error::Decode(format!("Failed to decode JPEG: {}", e)))?;

    // Grey sources may come back single channel
    let pixel_count = resolution.pixels() as usize;
    let components = pixels.len() / pixel_count;
    if !matches!(components, 1 | 3 | 4) || pixels.len() != components * pixel_count {
        return Err(Error::Decode(format!(
            "JPEG produced {} bytes for {}",
            pixels.len(),
            resolution
        )));
    }

    let mut rgba = alloc_buffer(rgba_len(resolution)?)?;
    let src_stride = resolution.width as usize * components;
    let dst_stride = resolution.width as usize * RGBA_BPP;
    for (src_row, dst_row) in pixels
        .chunks_exact(src_stride)
        .zip(rgba.chunks_exact_mut(dst_stride))
    {
        for (s, d) in src_row
            .chunks_exact(components)
            .zip(dst_row.chunks_exact_mut(RGBA_BPP))
        {
            let (r, g, b) = if components == 1 {
                (s[0], s[0], s[0])
            } else {
                (s[0], s[1], s[2])
            };
            d.copy_from_slice(&[r, g, b, 255]);
        }
    }

    tracing::debug!("Decoded JPEG {} ({} component(s))", resolution, components);
    SourceImage::new(rgba, resolution.width, resolution.height)
}
