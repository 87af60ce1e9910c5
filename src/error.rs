//! Error handling for Pitchpage
//!
//! Every engine call returns a typed error. The dispatcher classifies it and
//! turns per-request failures into a single generic notice.

use thiserror::Error;

/// Result type alias for Pitchpage operations
pub type Result<T> = std::result::Result<T, PitchPageError>;

/// Main error type for Pitchpage operations
#[derive(Error, Debug)]
pub enum PitchPageError {
    // Input Errors
    #[error("Could not decode audio: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Processing Errors
    #[error("Pitch transform failed: {reason}")]
    Transform { reason: String },

    #[error("Text contains nothing to render")]
    EmptyText,

    // Startup Errors
    #[error("Failed to load font: {reason}")]
    FontLoad { reason: String },

    #[error("Failed to load resource {path}: {reason}")]
    ResourceLoad { path: String, reason: String },

    // Output Errors
    #[error("Failed to encode output: {reason}")]
    Encode { reason: String },

    #[error("Delivery to {destination} failed: {reason}")]
    Delivery { destination: String, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PitchPageError {
    /// Shorthand for a decode failure without an underlying source
    pub fn decode(reason: impl Into<String>) -> Self {
        PitchPageError::Decode {
            reason: reason.into(),
            source: None,
        }
    }

    /// Shorthand for a transform failure
    pub fn transform(reason: impl Into<String>) -> Self {
        PitchPageError::Transform {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PitchPageError::Decode { .. } => "DECODE_ERROR",
            PitchPageError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            PitchPageError::Transform { .. } => "TRANSFORM_ERROR",
            PitchPageError::EmptyText => "LAYOUT_EMPTY",
            PitchPageError::FontLoad { .. } => "FONT_LOAD_ERROR",
            PitchPageError::ResourceLoad { .. } => "RESOURCE_LOAD_ERROR",
            PitchPageError::Encode { .. } => "ENCODE_ERROR",
            PitchPageError::Delivery { .. } => "DELIVERY_ERROR",
            PitchPageError::Config { .. } => "CONFIG_ERROR",
            PitchPageError::Io(_) => "IO_ERROR",
            PitchPageError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error must abort engine startup
    ///
    /// Font, template and configuration problems are never retried per request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PitchPageError::FontLoad { .. }
                | PitchPageError::ResourceLoad { .. }
                | PitchPageError::Config { .. }
        )
    }

    /// Check if this error means "nothing to do" rather than a failure
    pub fn is_noop(&self) -> bool {
        matches!(self, PitchPageError::EmptyText)
    }
}
