//! Static image source
//!
//! Decodes one image at start, converts it once the output format is known,
//! then hands out the same buffer for every frame with advancing timestamps.
//!
//! ```text
//! Unloaded --start--> Loaded --first request--> Negotiated --> Serving
//!     ^                                                          |
//!     +--------------------------- stop -------------------------+
//! ```

use crate::caps::{CapsNegotiator, FixedCaps, VideoCaps};
use crate::clock::FrameClock;
use crate::config::SourceConfig;
use crate::decode;
use crate::error::{Error, Result};
use crate::frame::{OutputFrame, SourceImage, VideoFrame};
use crate::processing;
use crate::types::{Framerate, PixelFormat, Resolution, MAX_DIMENSION};

use std::sync::Arc;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Nothing decoded
    Unloaded,
    /// Image decoded (and scaled), output format not yet chosen
    Loaded,
    /// Output frame converted and cached, nothing emitted yet
    Negotiated,
    /// Emitting the cached frame
    Serving,
}

enum State {
    Unloaded,
    Loaded {
        image: SourceImage,
    },
    Negotiated {
        frame: Arc<OutputFrame>,
    },
    Serving {
        frame: Arc<OutputFrame>,
    },
}

/// Source that serves a single still image as an endless video stream
pub struct ImageSource<N: CapsNegotiator = FixedCaps> {
    config: SourceConfig,
    negotiator: N,
    state: State,
    clock: FrameClock,
}

impl<N: CapsNegotiator> ImageSource<N> {
    /// Create an unloaded source
    pub fn new(config: SourceConfig, negotiator: N) -> Self {
        let clock = FrameClock::new(config.framerate);
        Self {
            config,
            negotiator,
            state: State::Unloaded,
            clock,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Replace the configuration; only allowed while unloaded
    pub fn set_config(&mut self, config: SourceConfig) -> Result<()> {
        if self.state() != SourceState::Unloaded {
            return Err(Error::Config(
                "Configuration cannot change while the source is running".into(),
            ));
        }
        self.clock = FrameClock::new(config.framerate);
        self.config = config;
        Ok(())
    }

    pub fn negotiator(&self) -> &N {
        &self.negotiator
    }

    pub fn negotiator_mut(&mut self) -> &mut N {
        &mut self.negotiator
    }

    pub fn state(&self) -> SourceState {
        match self.state {
            State::Unloaded => SourceState::Unloaded,
            State::Loaded { .. } => SourceState::Loaded,
            State::Negotiated { .. } => SourceState::Negotiated,
            State::Serving { .. } => SourceState::Serving,
        }
    }

    /// Duration of each emitted frame in nanoseconds
    pub fn frame_duration_ns(&self) -> u64 {
        self.clock.duration_ns()
    }

    /// Loaded image, before conversion
    pub fn source_image(&self) -> Option<&SourceImage> {
        match &self.state {
            State::Loaded { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Cached output frame, once negotiated
    pub fn output_frame(&self) -> Option<&Arc<OutputFrame>> {
        match &self.state {
            State::Negotiated { frame } | State::Serving { frame } => Some(frame),
            _ => None,
        }
    }

    /// Decode the configured image and scale it to the output size
    pub fn start(&mut self) -> Result<()> {
        if self.state() != SourceState::Unloaded {
            tracing::warn!("Source restarted without stop");
            self.stop();
        }

        self.config.validate()?;
        let location = self.config.location()?;
        let image = decode::decode_file(location)?;

        let target = self.plan_output(image.resolution())?;
        if target != image.resolution() {
            tracing::info!(
                "Scaling {} -> {} (nearest neighbour)",
                image.resolution(),
                target
            );
        }
        let image = processing::scale_image(image, target)?;

        self.clock = FrameClock::new(self.config.framerate);
        self.state = State::Loaded { image };
        Ok(())
    }

    /// Pick output size: downstream pinned size, then configured size, then native
    fn plan_output(&self, native: Resolution) -> Result<Resolution> {
        let mut pinned = None;
        for proposal in self.negotiator.peer_caps() {
            if let Some(res) = proposal.pinned_resolution() {
                pinned = Some(res);
            }
            if let Some(format) = proposal.packed_format() {
                tracing::trace!("Downstream proposes {}", format);
            }
        }

        let resolution = pinned
            .or_else(|| self.config.size_override())
            .unwrap_or(native);
        if !resolution.within_limits() {
            return Err(Error::Negotiation(format!(
                "Output size {} outside 1..={}",
                resolution, MAX_DIMENSION
            )));
        }
        Ok(resolution)
    }

    /// Fix the output format and build the cached frame
    ///
    /// Runs the conversion on the first call only; later calls return the
    /// cached frame even if downstream caps have since changed.
    pub fn negotiate(&mut self) -> Result<Arc<OutputFrame>> {
        let image = match &self.state {
            State::Unloaded => return Err(Error::NotLoaded),
            State::Negotiated { frame } | State::Serving { frame } => return Ok(frame.clone()),
            State::Loaded { image } => image,
        };

        let caps = fixed_caps(&mut self.negotiator, image.resolution(), self.config.framerate)?;
        if caps.resolution != image.resolution() {
            tracing::warn!(
                "Negotiated size {} differs from loaded image {}, keeping image size",
                caps.resolution,
                image.resolution()
            );
        }

        let frame = Arc::new(processing::convert_image(image, caps.format)?);
        tracing::info!(
            "Negotiated {} {} ({} bytes, {} plane(s))",
            frame.format(),
            frame.resolution(),
            frame.size(),
            frame.plane_count()
        );

        // Drops the canonical RGBA buffer
        self.state = State::Negotiated {
            frame: frame.clone(),
        };
        Ok(frame)
    }

    /// Produce the next frame: the cached buffer with the next timestamp
    pub fn next_frame(&mut self) -> Result<VideoFrame> {
        let frame = self.negotiate()?;
        if let State::Negotiated { .. } = self.state {
            tracing::debug!("First frame handed out");
            self.state = State::Serving {
                frame: frame.clone(),
            };
        }

        let (sequence, pts) = self.clock.tick();
        tracing::trace!("Frame {} pts={}ns", sequence, pts);
        Ok(VideoFrame {
            frame,
            pts,
            dts: None,
            duration: self.clock.duration_ns(),
            sequence,
        })
    }

    /// Release all buffers and return to `Unloaded`
    pub fn stop(&mut self) {
        if self.state() != SourceState::Unloaded {
            tracing::info!("Source stopped after {} frame(s)", self.clock.frame_count());
        }
        self.state = State::Unloaded;
        self.clock.reset();
    }
}

/// Read the caps fixed on the link, fixing default RGBA caps first if needed
fn fixed_caps<N: CapsNegotiator>(
    negotiator: &mut N,
    resolution: Resolution,
    framerate: Framerate,
) -> Result<VideoCaps> {
    if let Some(caps) = negotiator.current_caps()? {
        return Ok(caps);
    }

    let default = VideoCaps::new(PixelFormat::Rgba, resolution, framerate);
    tracing::debug!("No caps negotiated, setting '{}'", default);
    negotiator
        .set_caps(&default)
        .map_err(|e| Error::Negotiation(format!("Failed to set default caps: {}", e)))?;

    negotiator
        .current_caps()?
        .ok_or_else(|| Error::Negotiation("No caps after setting defaults".into()))
}
