//! Capability negotiation with the downstream consumer
//!
//! The host owns the link; the source only queries what downstream proposes,
//! reads what was fixed, and fixes default caps when nothing was.

use crate::error::{Error, Result};
use crate::types::{Framerate, PixelFormat, Resolution};
use std::str::FromStr;

/// Media type of every caps structure the source produces
pub const MEDIA_TYPE: &str = "video/x-raw";

/// Fully fixed output capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoCaps {
    pub format: PixelFormat,
    pub resolution: Resolution,
    pub framerate: Framerate,
}

impl VideoCaps {
    pub fn new(format: PixelFormat, resolution: Resolution, framerate: Framerate) -> Self {
        Self {
            format,
            resolution,
            framerate,
        }
    }
}

impl std::fmt::Display for VideoCaps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, format={}, width={}, height={}, framerate={}",
            MEDIA_TYPE,
            self.format,
            self.resolution.width,
            self.resolution.height,
            self.framerate
        )
    }
}

impl FromStr for VideoCaps {
    type Err = Error;

    /// Parses the `video/x-raw, format=…, width=…, height=…[, framerate=…]` form
    fn from_str(s: &str) -> Result<Self> {
        let proposal: CapsProposal = s.parse()?;
        let name = proposal
            .format
            .ok_or_else(|| Error::Negotiation(format!("Caps '{}' have no format", s)))?;
        let (width, height) = match (proposal.width, proposal.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(Error::Negotiation(format!(
                    "Caps '{}' have no fixed size",
                    s
                )))
            }
        };
        Ok(Self {
            format: name.parse()?,
            resolution: Resolution::new(width, height),
            framerate: proposal.framerate.unwrap_or_default(),
        })
    }
}

/// One structure of the caps downstream advertises; any field may be open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapsProposal {
    /// Format name exactly as downstream wrote it
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub framerate: Option<Framerate>,
}

impl CapsProposal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Width and height, if both are pinned to positive values
    pub fn pinned_resolution(&self) -> Option<Resolution> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(Resolution::new(w, h)),
            _ => None,
        }
    }

    /// Recognised packed format named by this proposal
    pub fn packed_format(&self) -> Option<PixelFormat> {
        self.format
            .as_deref()
            .and_then(|name| name.parse::<PixelFormat>().ok())
            .filter(PixelFormat::is_packed)
    }
}

impl FromStr for CapsProposal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut proposal = CapsProposal::new();

        for (i, field) in s.split(',').map(str::trim).enumerate() {
            if field.is_empty() {
                continue;
            }
            let Some((key, value)) = field.split_once('=') else {
                if i == 0 {
                    // Leading media type
                    continue;
                }
                return Err(Error::Negotiation(format!("Malformed caps field '{}'", field)));
            };
            let value = strip_type_prefix(value.trim());

            match key.trim() {
                "format" => proposal.format = Some(value.to_string()),
                "width" => proposal.width = Some(parse_dimension(key, value)?),
                "height" => proposal.height = Some(parse_dimension(key, value)?),
                "framerate" => {
                    proposal.framerate = Some(
                        value
                            .parse()
                            .map_err(|e| Error::Negotiation(format!("Bad framerate: {}", e)))?,
                    )
                }
                other => tracing::trace!("Ignoring caps field '{}'", other),
            }
        }

        Ok(proposal)
    }
}

/// Drop a `(string)` / `(int)` / `(fraction)` annotation
fn strip_type_prefix(value: &str) -> &str {
    match value.strip_prefix('(').and_then(|v| v.split_once(')')) {
        Some((_, rest)) => rest.trim(),
        None => value,
    }
}

fn parse_dimension(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::Negotiation(format!("Bad {} '{}'", key, value)))
}

/// The host side of capability negotiation
pub trait CapsNegotiator {
    /// Caps structures the downstream peer accepts, in preference order
    fn peer_caps(&self) -> Vec<CapsProposal>;

    /// Caps currently fixed on the link, if negotiation has happened
    fn current_caps(&self) -> Result<Option<VideoCaps>>;

    /// Fix `caps` on the link
    fn set_caps(&mut self, caps: &VideoCaps) -> Result<()>;
}

/// In-memory negotiator with a fixed set of proposals
#[derive(Debug, Clone, Default)]
pub struct FixedCaps {
    proposals: Vec<CapsProposal>,
    current: Option<VideoCaps>,
    reject_set: bool,
}

impl FixedCaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downstream will propose `proposal` (appended after earlier ones)
    pub fn with_proposal(mut self, proposal: CapsProposal) -> Self {
        self.proposals.push(proposal);
        self
    }

    /// Link already fixed to `caps`
    pub fn with_current(mut self, caps: VideoCaps) -> Self {
        self.current = Some(caps);
        self
    }

    /// Downstream refuses every `set_caps`
    pub fn rejecting(mut self) -> Self {
        self.reject_set = true;
        self
    }

    /// Replace the fixed caps, as a downstream renegotiation would
    pub fn set_current(&mut self, caps: Option<VideoCaps>) {
        self.current = caps;
    }
}

impl CapsNegotiator for FixedCaps {
    fn peer_caps(&self) -> Vec<CapsProposal> {
        self.proposals.clone()
    }

    fn current_caps(&self) -> Result<Option<VideoCaps>> {
        Ok(self.current)
    }

    fn set_caps(&mut self, caps: &VideoCaps) -> Result<()> {
        if self.reject_set {
            return Err(Error::Negotiation(format!("Downstream rejected '{}'", caps)));
        }
        self.current = Some(*caps);
        Ok(())
    }
}
