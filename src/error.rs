//! Error types for stillframe

use thiserror::Error;

/// Result type alias for stillframe operations
pub type Result<T> = std::result::Result<T, Error>;

/// stillframe error type
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    // Load errors
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No image loaded")]
    NotLoaded,

    // Processing errors
    #[error("Scaling error: {0}")]
    Scaling(String),

    #[error("Colorspace conversion error: {0}")]
    ColorspaceConversion(String),

    #[error("Allocation of {0} bytes failed")]
    Allocation(usize),

    // Negotiation errors
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category reported to the host pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Resource (file, location) missing
    ResourceNotFound,
    /// Resource exists but could not be read or decoded
    ResourceRead,
    /// Stream data could not be brought into the requested format
    StreamFormat,
    /// Out of memory
    NoSpace,
    /// Capability negotiation failed
    Negotiation,
}

impl Error {
    /// Host-facing category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::NotLoaded => ErrorCategory::ResourceNotFound,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorCategory::ResourceNotFound
            }
            Error::Io(_) | Error::UnsupportedFormat(_) | Error::Decode(_) => {
                ErrorCategory::ResourceRead
            }
            Error::Scaling(_) | Error::ColorspaceConversion(_) => ErrorCategory::StreamFormat,
            Error::Allocation(_) => ErrorCategory::NoSpace,
            Error::Negotiation(_) => ErrorCategory::Negotiation,
        }
    }

    /// Check if retrying the failed request can succeed
    ///
    /// A bad image never heals, but downstream may still settle on caps.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Negotiation(_))
    }
}
