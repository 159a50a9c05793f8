//! Still image decoding
//!
//! Turns a file into a canonical RGBA [`SourceImage`]:
//! - PNG via the `png` crate
//! - JPEG via zune-jpeg
//!
//! The decoder is picked from the file extension before anything is read.

mod jpeg;
mod png;

pub use self::jpeg::decode_jpeg;
pub use self::png::decode_png;

use crate::error::{Error, Result};
use crate::frame::SourceImage;
use crate::types::{Resolution, MAX_DIMENSION};
use std::path::Path;

/// Supported still image container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Sniff the kind from a path's extension (case-insensitive)
    ///
    /// `.png` is PNG; `.jpg`, `.jpeg` and the `.jpp` alias are JPEG.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" => Ok(ImageKind::Png),
            "jpg" | "jpeg" | "jpp" => Ok(ImageKind::Jpeg),
            "" => Err(Error::UnsupportedFormat(format!(
                "'{}' has no file extension (supported: png, jpg/jpeg/jpp)",
                path.display()
            ))),
            other => Err(Error::UnsupportedFormat(format!(
                "'.{}' (supported: png, jpg/jpeg/jpp)",
                other
            ))),
        }
    }

    /// Decode in-memory bytes of this kind
    pub fn decode_bytes(&self, data: &[u8]) -> Result<SourceImage> {
        match self {
            ImageKind::Png => decode_png(data),
            ImageKind::Jpeg => decode_jpeg(data),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Png => "PNG",
            ImageKind::Jpeg => "JPEG",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject header sizes the source cannot produce, before any pixel buffer exists
fn check_native_size(kind: ImageKind, resolution: Resolution) -> Result<()> {
    if resolution.within_limits() {
        Ok(())
    } else {
        Err(Error::Decode(format!(
            "{} size {} outside 1..={}",
            kind, resolution, MAX_DIMENSION
        )))
    }
}

/// Decode the image at `path` into canonical RGBA
pub fn decode_file(path: &Path) -> Result<SourceImage> {
    let kind = ImageKind::from_path(path)?;
    let data = std::fs::read(path)?;
    let image = kind.decode_bytes(&data).map_err(|e| match e {
        Error::Decode(msg) => Error::Decode(format!("'{}': {}", path.display(), msg)),
        other => other,
    })?;

    tracing::info!(
        "Loaded {} image '{}' ({})",
        kind,
        path.display(),
        image.resolution()
    );
    Ok(image)
}
