//! Colorspace conversion from canonical RGBA
//!
//! Packed formats are byte swizzles of an RGBA copy. NV12 and I420 use
//! integer BT.601 with chroma averaged over each 2x2 block.

use super::alloc_buffer;
use crate::error::{Error, Result};
use crate::frame::{OutputFrame, SourceImage, RGBA_BPP};
use crate::types::{PixelFormat, Resolution};

/// Build the output frame for `format` from the canonical source
///
/// Always allocates a fresh buffer; `image` is never modified.
pub fn convert_image(image: &SourceImage, format: PixelFormat) -> Result<OutputFrame> {
    let resolution = image.resolution();
    let data = match format {
        PixelFormat::Nv12 => rgba_to_nv12(image.pixels(), resolution)?,
        PixelFormat::I420 => rgba_to_i420(image.pixels(), resolution)?,
        packed => {
            let mut data = alloc_buffer(image.pixels().len())?;
            data.copy_from_slice(image.pixels());
            swizzle_from_rgba(&mut data, packed)?;
            data
        }
    };
    OutputFrame::new(format, resolution, data)
}

/// Position of each output byte within the RGBA source pixel
fn packed_order(format: PixelFormat) -> Option<[usize; 4]> {
    match format {
        PixelFormat::Rgba => Some([0, 1, 2, 3]),
        PixelFormat::Bgra => Some([2, 1, 0, 3]),
        PixelFormat::Argb => Some([3, 0, 1, 2]),
        PixelFormat::Abgr => Some([3, 2, 1, 0]),
        PixelFormat::Nv12 | PixelFormat::I420 => None,
    }
}

/// Reorder RGBA pixels into a packed 4-channel format, in place
pub fn swizzle_from_rgba(pixels: &mut [u8], format: PixelFormat) -> Result<()> {
    let order = packed_order(format).ok_or_else(|| {
        Error::ColorspaceConversion(format!("{} is not a packed format", format))
    })?;
    if format == PixelFormat::Rgba {
        return Ok(());
    }

    for px in pixels.chunks_exact_mut(RGBA_BPP) {
        let rgba = [px[0], px[1], px[2], px[3]];
        for (dst, &src) in px.iter_mut().zip(&order) {
            *dst = rgba[src];
        }
    }
    Ok(())
}

/// Inverse of [`swizzle_from_rgba`]
pub fn swizzle_to_rgba(pixels: &mut [u8], format: PixelFormat) -> Result<()> {
    let order = packed_order(format).ok_or_else(|| {
        Error::ColorspaceConversion(format!("{} is not a packed format", format))
    })?;
    if format == PixelFormat::Rgba {
        return Ok(());
    }

    for px in pixels.chunks_exact_mut(RGBA_BPP) {
        let packed = [px[0], px[1], px[2], px[3]];
        for (&src, &dst) in packed.iter().zip(&order) {
            px[dst] = src;
        }
    }
    Ok(())
}

/// BT.601 full range, integer approximation
///
/// Returns Y (offset and clamped) plus unbiased U and V.
#[inline]
fn rgb_to_yuv_bt601(r: u8, g: u8, b: u8) -> (u8, i32, i32) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = (66 * r + 129 * g + 25 * b + 128) >> 8;
    let u = (-38 * r - 74 * g + 112 * b + 128) >> 8;
    let v = (112 * r - 94 * g - 18 * b + 128) >> 8;
    ((y + 16).clamp(0, 255) as u8, u, v)
}

fn check_input(input: &[u8], resolution: Resolution) -> Result<()> {
    if resolution.is_empty() {
        return Err(Error::ColorspaceConversion(format!(
            "Invalid frame size {}",
            resolution
        )));
    }
    let needed = resolution.pixels() as usize * RGBA_BPP;
    if input.len() < needed {
        return Err(Error::ColorspaceConversion(format!(
            "Input buffer is {} bytes, need {}",
            input.len(),
            needed
        )));
    }
    Ok(())
}

fn write_luma(input: &[u8], luma: &mut [u8]) {
    for (dst, px) in luma.iter_mut().zip(input.chunks_exact(RGBA_BPP)) {
        *dst = rgb_to_yuv_bt601(px[0], px[1], px[2]).0;
    }
}

/// Averaged (U, V) for chroma sample (cx, cy)
///
/// Each pixel's chroma is computed first, then the four are averaged.
/// Blocks on an odd right/bottom edge repeat the last column/row.
fn chroma_sample(input: &[u8], resolution: Resolution, cx: usize, cy: usize) -> (u8, u8) {
    let width = resolution.width as usize;
    let height = resolution.height as usize;
    let x0 = cx * 2;
    let y0 = cy * 2;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let mut u_sum = 0i32;
    let mut v_sum = 0i32;
    for (x, y) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
        let i = (y * width + x) * RGBA_BPP;
        let (_, u, v) = rgb_to_yuv_bt601(input[i], input[i + 1], input[i + 2]);
        u_sum += u;
        v_sum += v;
    }

    let u = (u_sum / 4 + 128).clamp(0, 255) as u8;
    let v = (v_sum / 4 + 128).clamp(0, 255) as u8;
    (u, v)
}

/// RGBA -> NV12 (Y plane, then interleaved UV plane)
pub fn rgba_to_nv12(input: &[u8], resolution: Resolution) -> Result<Vec<u8>> {
    check_input(input, resolution)?;

    let planes = PixelFormat::Nv12.plane_layouts(resolution);
    let chroma = resolution.chroma();
    let mut output = alloc_buffer(PixelFormat::Nv12.frame_size(resolution))?;
    let (luma, uv) = output.split_at_mut(planes[1].offset);

    write_luma(input, luma);

    for (cy, row) in uv.chunks_exact_mut(planes[1].stride).enumerate() {
        for (cx, pair) in row.chunks_exact_mut(2).enumerate() {
            let (u, v) = chroma_sample(input, resolution, cx, cy);
            pair[0] = u;
            pair[1] = v;
        }
    }
    debug_assert_eq!(uv.len(), chroma.pixels() as usize * 2);

    Ok(output)
}

/// RGBA -> I420 (Y plane, U plane, V plane)
pub fn rgba_to_i420(input: &[u8], resolution: Resolution) -> Result<Vec<u8>> {
    check_input(input, resolution)?;

    let planes = PixelFormat::I420.plane_layouts(resolution);
    let chroma_w = planes[1].stride;
    let mut output = alloc_buffer(PixelFormat::I420.frame_size(resolution))?;
    let (luma, chroma) = output.split_at_mut(planes[1].offset);
    let (u_plane, v_plane) = chroma.split_at_mut(planes[1].len);

    write_luma(input, luma);

    for (i, (u_dst, v_dst)) in u_plane.iter_mut().zip(v_plane.iter_mut()).enumerate() {
        let (u, v) = chroma_sample(input, resolution, i % chroma_w, i / chroma_w);
        *u_dst = u;
        *v_dst = v;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect()
    }

    #[test]
    fn test_swizzle_layouts() {
        let px = [10u8, 20, 30, 40];
        let cases = [
            (PixelFormat::Rgba, [10, 20, 30, 40]),
            (PixelFormat::Bgra, [30, 20, 10, 40]),
            (PixelFormat::Argb, [40, 10, 20, 30]),
            (PixelFormat::Abgr, [40, 30, 20, 10]),
        ];
        for (format, expected) in cases {
            let mut data = px.to_vec();
            swizzle_from_rgba(&mut data, format).unwrap();
            assert_eq!(data, expected, "{}", format);

            swizzle_to_rgba(&mut data, format).unwrap();
            assert_eq!(data, px, "{} round trip", format);
        }
    }

    #[test]
    fn test_swizzle_rejects_planar_formats() {
        let mut data = vec![0u8; 4];
        assert!(swizzle_from_rgba(&mut data, PixelFormat::Nv12).is_err());
        assert!(swizzle_to_rgba(&mut data, PixelFormat::I420).is_err());
    }

    #[test]
    fn test_red_nv12() {
        let res = Resolution::new(2, 2);
        let out = rgba_to_nv12(&solid(2, 2, [255, 0, 0, 255]), res).unwrap();
        // Y = ((66*255 + 128) >> 8) + 16, U/V from four identical samples
        assert_eq!(out, vec![82, 82, 82, 82, 90, 240]);
    }

    #[test]
    fn test_black_and_white_luma() {
        let res = Resolution::new(2, 2);
        let black = rgba_to_i420(&solid(2, 2, [0, 0, 0, 255]), res).unwrap();
        assert_eq!(black, vec![16, 16, 16, 16, 128, 128]);

        let white = rgba_to_i420(&solid(2, 2, [255, 255, 255, 255]), res).unwrap();
        assert_eq!(&white[..4], &[235, 235, 235, 235]);
        assert_eq!(&white[4..], &[128, 128]);
    }

    #[test]
    fn test_chroma_is_block_average() {
        // One red and three black pixels in a single block
        let mut input = solid(2, 2, [0, 0, 0, 255]);
        input[0] = 255;
        let out = rgba_to_nv12(&input, Resolution::new(2, 2)).unwrap();
        // U: (-38 + 0 + 0 + 0) / 4 = -9, V: (112 + 0 + 0 + 0) / 4 = 28
        assert_eq!(out[4], 119);
        assert_eq!(out[5], 156);
    }

    #[test]
    fn test_nv12_and_i420_share_chroma() {
        let res = Resolution::new(4, 4);
        let input: Vec<u8> = (0..64u32).map(|i| (i * 37 % 256) as u8).collect();
        let nv12 = rgba_to_nv12(&input, res).unwrap();
        let i420 = rgba_to_i420(&input, res).unwrap();

        assert_eq!(nv12.len(), 24);
        assert_eq!(i420.len(), 24);
        assert_eq!(&nv12[..16], &i420[..16]);

        let u: Vec<u8> = nv12[16..].iter().step_by(2).copied().collect();
        let v: Vec<u8> = nv12[17..].iter().step_by(2).copied().collect();
        assert_eq!(u, &i420[16..20]);
        assert_eq!(v, &i420[20..24]);
    }

    #[test]
    fn test_single_pixel_every_format() {
        let image = SourceImage::new(vec![1, 2, 3, 4], 1, 1).unwrap();
        for format in PixelFormat::ALL {
            let frame = convert_image(&image, format).unwrap();
            assert_eq!(frame.format(), format);
            assert_eq!(frame.plane_count(), format.plane_count());
            assert_eq!(frame.size(), format.frame_size(Resolution::new(1, 1)));
        }
        // Source untouched by any conversion
        assert_eq!(image.pixels(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_short_input_rejected() {
        let err = rgba_to_nv12(&[0u8; 8], Resolution::new(2, 2)).unwrap_err();
        assert!(matches!(err, Error::ColorspaceConversion(_)));
    }
}
