//! Frame buffers: the decoded source image, the converted output frame,
//! and the timestamped handout given to the host for every request.

use crate::error::{Error, Result};
use crate::types::{PixelFormat, PlaneLayout, Resolution};
use std::sync::Arc;

/// Bytes per canonical RGBA pixel
pub const RGBA_BPP: usize = 4;

/// Decoded (and possibly rescaled) image in canonical RGBA layout
///
/// Rows are tightly packed: stride is always `width * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    resolution: Resolution,
    pixels: Vec<u8>,
}

impl SourceImage {
    /// Wrap a tightly packed RGBA buffer
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let resolution = Resolution::new(width, height);
        if resolution.is_empty() {
            return Err(Error::Decode(format!("Invalid image size {}", resolution)));
        }
        let expected = rgba_len(resolution)?;
        if pixels.len() != expected {
            return Err(Error::Decode(format!(
                "RGBA buffer is {} bytes, expected {} for {}",
                pixels.len(),
                expected,
                resolution
            )));
        }
        Ok(Self { resolution, pixels })
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.resolution.width as usize * RGBA_BPP
    }

    /// Raw RGBA bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * RGBA_BPP;
        let p = &self.pixels[idx..idx + RGBA_BPP];
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// Byte length of a tightly packed RGBA buffer, checked for overflow
pub(crate) fn rgba_len(resolution: Resolution) -> Result<usize> {
    (resolution.width as usize)
        .checked_mul(resolution.height as usize)
        .and_then(|n| n.checked_mul(RGBA_BPP))
        .ok_or_else(|| Error::Allocation(usize::MAX))
}

/// Converted frame in the negotiated format
///
/// Built exactly once per run and never mutated afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct OutputFrame {
    format: PixelFormat,
    resolution: Resolution,
    planes: Vec<PlaneLayout>,
    data: Box<[u8]>,
}

impl OutputFrame {
    /// Wrap converted data, checking it matches the format's plane layout
    pub fn new(format: PixelFormat, resolution: Resolution, data: Vec<u8>) -> Result<Self> {
        let planes = format.plane_layouts(resolution);
        let expected = format.frame_size(resolution);
        if data.len() != expected {
            return Err(Error::ColorspaceConversion(format!(
                "{} frame is {} bytes, expected {} for {}",
                format,
                data.len(),
                expected,
                resolution
            )));
        }
        Ok(Self {
            format,
            resolution,
            planes,
            data: data.into_boxed_slice(),
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Whole frame buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Per-plane offset and stride
    pub fn planes(&self) -> &[PlaneLayout] {
        &self.planes
    }

    /// Bytes of plane `index`
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes
            .get(index)
            .map(|p| &self.data[p.offset..p.offset + p.len])
    }
}

/// One emitted frame: a shared reference to the cached content plus timing
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Cached frame content, shared by every emitted frame
    pub frame: Arc<OutputFrame>,
    /// Presentation timestamp in nanoseconds
    pub pts: u64,
    /// Decode timestamp; not applicable for a still source
    pub dts: Option<u64>,
    /// Duration in nanoseconds
    pub duration: u64,
    /// Index of this frame since start
    pub sequence: u64,
}

impl VideoFrame {
    pub fn data(&self) -> &[u8] {
        self.frame.data()
    }

    pub fn format(&self) -> PixelFormat {
        self.frame.format()
    }

    pub fn resolution(&self) -> Resolution {
        self.frame.resolution()
    }

    /// True if both frames point at the same cached buffer
    pub fn shares_buffer_with(&self, other: &VideoFrame) -> bool {
        Arc::ptr_eq(&self.frame, &other.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_image_rejects_bad_length() {
        assert!(SourceImage::new(vec![0; 15], 2, 2).is_err());
        assert!(SourceImage::new(Vec::new(), 0, 4).is_err());

        let image = SourceImage::new(vec![7; 16], 2, 2).unwrap();
        assert_eq!(image.stride(), 8);
        assert_eq!(image.pixel(1, 1), Some([7, 7, 7, 7]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_output_frame_planes() {
        let res = Resolution::new(4, 2);
        let data: Vec<u8> = (0..12).collect();
        let frame = OutputFrame::new(PixelFormat::I420, res, data).unwrap();

        assert_eq!(frame.plane_count(), 3);
        assert_eq!(frame.plane(0).unwrap(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(frame.plane(1).unwrap(), &[8, 9]);
        assert_eq!(frame.plane(2).unwrap(), &[10, 11]);
        assert!(frame.plane(3).is_none());
    }

    #[test]
    fn test_output_frame_rejects_wrong_size() {
        let res = Resolution::new(4, 2);
        let err = OutputFrame::new(PixelFormat::Nv12, res, vec![0; 11]).unwrap_err();
        assert!(matches!(err, Error::ColorspaceConversion(_)));
    }
}
