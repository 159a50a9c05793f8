//! Frame scaling

use super::alloc_buffer;
use crate::error::{Error, Result};
use crate::frame::{rgba_len, SourceImage, RGBA_BPP};
use crate::types::Resolution;

/// Scale an RGBA image, or hand it back untouched if already at `target`
pub fn scale_image(image: SourceImage, target: Resolution) -> Result<SourceImage> {
    if image.resolution() == target {
        return Ok(image);
    }

    let scaled = scale_nearest(
        image.pixels(),
        image.width(),
        image.height(),
        target.width,
        target.height,
    )?;
    tracing::debug!("Scaled image {} -> {}", image.resolution(), target);
    SourceImage::new(scaled, target.width, target.height)
}

/// Nearest-neighbour scale of tightly packed RGBA data
///
/// Destination pixel (x, y) samples source pixel
/// `(x * src_w / dst_w, y * src_h / dst_h)`, computed in 64-bit.
pub fn scale_nearest(
    input: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<Vec<u8>> {
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(Error::Scaling(format!(
            "Invalid dimensions {}x{} -> {}x{}",
            src_width, src_height, dst_width, dst_height
        )));
    }

    let src_len = rgba_len(Resolution::new(src_width, src_height))?;
    if input.len() < src_len {
        return Err(Error::Scaling("Input buffer too small".into()));
    }

    let src_stride = src_width as usize * RGBA_BPP;
    let dst_stride = dst_width as usize * RGBA_BPP;
    let mut output = alloc_buffer(rgba_len(Resolution::new(dst_width, dst_height))?)?;

    // Column lookup is identical for every row
    let columns: Vec<usize> = (0..dst_width as u64)
        .map(|x| (x * src_width as u64 / dst_width as u64) as usize * RGBA_BPP)
        .collect();

    for (y, dst_row) in output.chunks_exact_mut(dst_stride).enumerate() {
        let src_y = (y as u64 * src_height as u64 / dst_height as u64) as usize;
        let src_row = &input[src_y * src_stride..(src_y + 1) * src_stride];

        for (dst_px, &src_x) in dst_row.chunks_exact_mut(RGBA_BPP).zip(&columns) {
            dst_px.copy_from_slice(&src_row[src_x..src_x + RGBA_BPP]);
        }
    }

    Ok(output)
}
