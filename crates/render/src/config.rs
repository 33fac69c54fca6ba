use lens_code_printer::PrinterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Limits for line-preserving literal truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncateOptions {
    /// Literals longer than this many characters (quotes included) are shortened
    pub char_limit: usize,

    /// Characters kept at each end of a shortened literal
    pub preview_len: usize,
}

impl Default for TruncateOptions {
    fn default() -> Self {
        Self {
            char_limit: 500,
            preview_len: 100,
        }
    }
}

impl TruncateOptions {
    pub fn new(char_limit: usize, preview_len: usize) -> Self {
        Self {
            char_limit,
            preview_len,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.char_limit == 0 {
            return Err("char_limit must be > 0".to_string());
        }
        if self.preview_len == 0 {
            return Err("preview_len must be > 0".to_string());
        }
        Ok(())
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub printer: PrinterConfig,

    /// Applied to rendered text after cache retrieval; `None` disables truncation
    pub truncate: Option<TruncateOptions>,
}

impl RenderConfig {
    pub fn with_truncation(truncate: TruncateOptions) -> Self {
        Self {
            truncate: Some(truncate),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.printer.validate()?;
        if let Some(truncate) = &self.truncate {
            truncate.validate()?;
        }
        Ok(())
    }
}

/// Location of the on-disk render cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

impl CacheConfig {
    pub const DIR_NAME: &'static str = "source-lens";

    /// `<user cache dir>/source-lens/renders`, or a relative fallback when the
    /// platform has no cache directory
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join(Self::DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", Self::DIR_NAME)))
            .join("renders")
    }
}
