use lens_code_printer::PrinterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopeError>;

#[derive(Error, Debug)]
pub enum ScopeError {
    /// No position map for this source, or no syntax support for its language
    #[error("No position map available: {0}")]
    MapUnavailable(String),

    #[error("Empty identifier")]
    EmptyIdentifier,

    #[error("Invalid analysis options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Parser(#[from] PrinterError),
}

impl ScopeError {
    pub fn map_unavailable(msg: impl Into<String>) -> Self {
        Self::MapUnavailable(msg.into())
    }
}
