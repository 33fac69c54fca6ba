use thiserror::Error;

/// Result type for position map operations
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised while decoding, encoding or building position maps
#[derive(Error, Debug)]
pub enum MapError {
    /// The serialized map carries a version this codec does not speak
    #[error("Unsupported position map version: {0} (expected 3)")]
    UnsupportedVersion(u32),

    /// A `mappings` string segment has an invalid shape
    #[error("Invalid mappings at generated line {line}: {message}")]
    InvalidMappings { line: usize, message: String },

    /// A base64 VLQ value could not be decoded
    #[error("Invalid VLQ: {0}")]
    InvalidVlq(String),

    /// A segment references a source that is not in the `sources` table
    #[error("Source index {index} out of range ({len} sources)")]
    SourceIndexOutOfRange { index: u32, len: usize },

    /// A segment references a name that is not in the `names` table
    #[error("Name index {index} out of range ({len} names)")]
    NameIndexOutOfRange { index: u32, len: usize },

    /// JSON (de)serialization error
    #[error("Position map JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MapError {
    /// Create an invalid mappings error
    pub fn invalid_mappings(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidMappings {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid VLQ error
    pub fn invalid_vlq(message: impl Into<String>) -> Self {
        Self::InvalidVlq(message.into())
    }
}
