use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Empty pattern")]
    EmptyPattern,

    #[error("Invalid search options: {0}")]
    InvalidOptions(String),

    /// A position map was required but none is available for this source
    #[error("No position map available for this source")]
    MapUnavailable,
}

impl SearchError {
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }
}
