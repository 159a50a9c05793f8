//! Image processing module
//!
//! Provides the CPU paths between the decoded image and the output frame:
//! - Nearest-neighbour resolution scaling
//! - Packed RGBA swizzles and BT.601 NV12 / I420 conversion

mod convert;
mod scale;

pub use convert::{convert_image, rgba_to_i420, rgba_to_nv12, swizzle_from_rgba, swizzle_to_rgba};
pub use scale::{scale_image, scale_nearest};

use crate::error::{Error, Result};

/// Allocate a zeroed buffer, reporting failure instead of aborting
pub(crate) fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation(len))?;
    buf.resize(len, 0);
    Ok(buf)
}
