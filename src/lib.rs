//! Stillframe: a static image video source
//!
//! Decodes a single PNG or JPEG, optionally scales it, converts it once to the
//! negotiated pixel format and then serves that one buffer as an unbounded
//! stream of timestamped frames.
//!
//! # Features
//!
//! - **Decode**: PNG (`png`) and JPEG (`zune-jpeg`) into canonical RGBA
//! - **Scale**: nearest-neighbour resize to a pinned or configured size
//! - **Convert**: RGBA, BGRA, ARGB, ABGR, NV12 and I420 (BT.601, integer)
//!
//! # Example
//!
//! ```rust,no_run
//! use stillframe::{FixedCaps, ImageSource, SourceConfig};
//!
//! fn main() -> stillframe::Result<()> {
//!     let config = SourceConfig::default().with_location("slate.png");
//!     let mut source = ImageSource::new(config, FixedCaps::new());
//!
//!     source.start()?;
//!     for _ in 0..3 {
//!         let frame = source.next_frame()?;
//!         println!("pts={} {} bytes", frame.pts, frame.data().len());
//!     }
//!     source.stop();
//!     Ok(())
//! }
//! ```

pub mod caps;
pub mod clock;
pub mod config;
pub mod decode;
pub mod error;
pub mod frame;
pub mod processing;
pub mod source;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-exports for convenience
pub use caps::{CapsNegotiator, CapsProposal, FixedCaps, VideoCaps};
pub use config::SourceConfig;
pub use decode::ImageKind;
pub use error::{Error, ErrorCategory, Result};
pub use frame::{OutputFrame, SourceImage, VideoFrame};
pub use source::{ImageSource, SourceState};
pub use types::{Framerate, PixelFormat, PlaneLayout, Resolution};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
