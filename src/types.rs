//! Common types used throughout stillframe

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Nanoseconds per second, the host clock unit
pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Largest width or height the source will produce
pub const MAX_DIMENSION: u32 = 8192;

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Calculate total pixels
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True if either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Both dimensions within `1..=MAX_DIMENSION`
    pub fn within_limits(&self) -> bool {
        !self.is_empty() && self.width <= MAX_DIMENSION && self.height <= MAX_DIMENSION
    }

    /// Size of a 4:2:0 chroma plane, rounding odd dimensions up
    pub fn chroma(&self) -> Resolution {
        Resolution::new(self.width.div_ceil(2), self.height.div_ceil(2))
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Framerate as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framerate {
    pub num: u32,
    pub den: u32,
}

impl Framerate {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_60: Self = Self::new(60, 1);

    /// Both terms strictly positive
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// This framerate, or 25/1 if either term is zero
    pub fn or_default(self) -> Self {
        if self.is_valid() {
            self
        } else {
            Self::default()
        }
    }

    /// Get framerate as f64
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Frame duration in nanoseconds (`1s * den / num`, truncated)
    pub fn frame_duration_ns(&self) -> u64 {
        let rate = self.or_default();
        (NSEC_PER_SEC as u128 * rate.den as u128 / rate.num as u128) as u64
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_25
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Framerate {
    type Err = Error;

    /// Parses `"30/1"` or a bare `"30"`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num = num
            .parse::<u32>()
            .map_err(|_| Error::Config(format!("Invalid framerate numerator in '{}'", s)))?;
        let den = den
            .parse::<u32>()
            .map_err(|_| Error::Config(format!("Invalid framerate denominator in '{}'", s)))?;
        Ok(Self::new(num, den))
    }
}

/// Output pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// RGBA - 32-bit, canonical decode layout
    #[default]
    Rgba,
    /// BGRA - 32-bit, R and B swapped
    Bgra,
    /// ARGB - 32-bit, alpha first
    Argb,
    /// ABGR - 32-bit, alpha first, reversed colour
    Abgr,
    /// NV12 - Y plane + interleaved UV plane
    Nv12,
    /// I420 - Planar YUV 4:2:0
    I420,
}

impl PixelFormat {
    /// Every format the source can negotiate
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgba,
        PixelFormat::Bgra,
        PixelFormat::Argb,
        PixelFormat::Abgr,
        PixelFormat::Nv12,
        PixelFormat::I420,
    ];

    /// Caps name of the format
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Bgra => "BGRA",
            PixelFormat::Argb => "ARGB",
            PixelFormat::Abgr => "ABGR",
            PixelFormat::Nv12 => "NV12",
            PixelFormat::I420 => "I420",
        }
    }

    /// Single-plane 4 bytes/pixel format
    pub fn is_packed(&self) -> bool {
        !self.is_yuv()
    }

    /// Planar YUV 4:2:0 format
    pub fn is_yuv(&self) -> bool {
        matches!(self, PixelFormat::Nv12 | PixelFormat::I420)
    }

    /// Number of planes in a frame of this format
    pub fn plane_count(&self) -> usize {
        match self {
            PixelFormat::Nv12 => 2,
            PixelFormat::I420 => 3,
            _ => 1,
        }
    }

    /// Offset, stride and length of every plane for a tightly packed frame
    pub fn plane_layouts(&self, resolution: Resolution) -> Vec<PlaneLayout> {
        let width = resolution.width as usize;
        let height = resolution.height as usize;
        let chroma = resolution.chroma();
        let chroma_w = chroma.width as usize;
        let chroma_h = chroma.height as usize;

        match self {
            PixelFormat::Nv12 => {
                let luma = PlaneLayout::new(0, width, width * height);
                let uv_stride = chroma_w * 2;
                let uv = PlaneLayout::new(luma.len, uv_stride, uv_stride * chroma_h);
                vec![luma, uv]
            }
            PixelFormat::I420 => {
                let luma = PlaneLayout::new(0, width, width * height);
                let u = PlaneLayout::new(luma.len, chroma_w, chroma_w * chroma_h);
                let v = PlaneLayout::new(u.offset + u.len, chroma_w, chroma_w * chroma_h);
                vec![luma, u, v]
            }
            _ => vec![PlaneLayout::new(0, width * 4, width * 4 * height)],
        }
    }

    /// Total byte length of a frame of this format
    pub fn frame_size(&self, resolution: Resolution) -> usize {
        self.plane_layouts(resolution)
            .last()
            .map(|p| p.offset + p.len)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PixelFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Negotiation(format!("Unsupported pixel format '{}'", s)))
    }
}

/// Placement of one plane inside a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the plane's first row
    pub offset: usize,
    /// Bytes per row
    pub stride: usize,
    /// Total plane bytes
    pub len: usize,
}

impl PlaneLayout {
    pub const fn new(offset: usize, stride: usize, len: usize) -> Self {
        Self {
            offset,
            stride,
            len,
        }
    }
}
