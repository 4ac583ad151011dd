//! Error types for the sink registry
//!
//! Rendering itself never fails; these errors cover the ambient surfaces
//! around it: configuration loading and writing the rendered output to disk.

use thiserror::Error;

/// Main error type for sink registry operations
#[derive(Error, Debug)]
pub enum SinkRegistryError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Invalid file path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O errors (reading config, writing rendered output)
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Webhook URL parsing errors
    #[error("Invalid URL: {source}")]
    UrlError {
        #[from]
        source: url::ParseError,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Rendered output could not be persisted
    #[error("Output error: {0}")]
    OutputError(String),
}

/// Result type alias for sink registry operations
pub type Result<T> = std::result::Result<T, SinkRegistryError>;

impl SinkRegistryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new output error
    pub fn output<S: Into<String>>(msg: S) -> Self {
        Self::OutputError(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// I/O and output failures can succeed on the next sync; configuration
    /// problems need operator action.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::IoError { .. } | Self::OutputError(_))
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_)
            | Self::ConfigFileMissing(_)
            | Self::InvalidLogLevel(_)
            | Self::InvalidPath(_) => "config",
            Self::IoError { .. } => "io",
            Self::SerializationError { .. } => "serialization",
            Self::TomlError { .. } => "toml",
            Self::UrlError { .. } => "url",
            Self::ValidationError(_) => "validation",
            Self::OutputError(_) => "output",
        }
    }
}
