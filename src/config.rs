//! Configuration types for stillframe
//!
//! Mirrors the element's property bag: `location`, `fps`, `width`, `height`.

use crate::error::{Error, Result};
use crate::types::{Framerate, Resolution, MAX_DIMENSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Image to load (png, jpg/jpeg/jpp)
    pub location: Option<PathBuf>,
    /// Output framerate
    pub framerate: Framerate,
    /// Forced output width (0 = native)
    pub width: u32,
    /// Forced output height (0 = native)
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: None,
            framerate: Framerate::default(),
            width: 0,
            height: 0,
        }
    }
}

impl SourceConfig {
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_framerate(mut self, framerate: Framerate) -> Self {
        self.set_framerate(framerate);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the framerate; a zero term resets it to 25/1
    pub fn set_framerate(&mut self, framerate: Framerate) {
        if !framerate.is_valid() {
            tracing::warn!("Invalid framerate {}, using {}", framerate, Framerate::default());
        }
        self.framerate = framerate.or_default();
    }

    /// Configured image path
    pub fn location(&self) -> Result<&Path> {
        match self.location.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(Error::Config("'location' property not set".into())),
        }
    }

    /// Forced output size, only when both width and height are set
    pub fn size_override(&self) -> Option<Resolution> {
        if self.width > 0 && self.height > 0 {
            Some(Resolution::new(self.width, self.height))
        } else {
            None
        }
    }

    /// Check the configuration is usable for starting a source
    pub fn validate(&self) -> Result<()> {
        self.location()?;
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value > MAX_DIMENSION {
                return Err(Error::Config(format!(
                    "'{}' {} out of range 0..={}",
                    name, value, MAX_DIMENSION
                )));
            }
        }
        if (self.width == 0) != (self.height == 0) {
            tracing::warn!(
                "Only one of width/height set ({}x{}), size override ignored",
                self.width,
                self.height
            );
        }
        Ok(())
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: SourceConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        let framerate = config.framerate;
        config.set_framerate(framerate);
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
