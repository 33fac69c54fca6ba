use lens_code_printer::PrinterError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// `ENOSPC` on Linux and macOS
const NO_SPACE_OS_ERROR: i32 = 28;

/// Errors that terminate a render request
#[derive(Error, Debug)]
pub enum RenderError {
    /// The source or output path does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The process may not read or write the path
    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    /// The device holding the path is full
    #[error("No space left on device while writing {}", path.display())]
    NoSpace { path: PathBuf },

    /// Any other I/O failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Printer could not be constructed or failed outside the fallback path
    #[error(transparent)]
    Printer(#[from] PrinterError),

    /// A user-supplied transform failed
    #[error("Transform '{name}' failed: {source}")]
    Transform {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RenderError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ if err.raw_os_error() == Some(NO_SPACE_OS_ERROR) => Self::NoSpace { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a transform error
    pub fn transform(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Transform {
            name: name.into(),
            source,
        }
    }
}

/// Cache write failures. These never abort a render; they surface as warnings.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Permission denied writing cache entry {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("No space left on device writing cache entry {}", path.display())]
    NoSpace { path: PathBuf },

    #[error("Cache I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    /// Classify an I/O error raised while writing `path`
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ if err.raw_os_error() == Some(NO_SPACE_OS_ERROR) => Self::NoSpace { path },
            _ => Self::Io { path, source: err },
        }
    }
}
