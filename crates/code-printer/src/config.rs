use serde::{Deserialize, Serialize};

/// Layout and parse-tolerance settings for the printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Spaces per indentation level
    pub indent_width: usize,

    /// Largest share of source bytes that may sit inside syntax errors before a
    /// parse is considered unrecoverable
    pub max_error_ratio: f64,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            max_error_ratio: 0.5,
        }
    }
}

impl PrinterConfig {
    /// Reject any syntax error at all
    pub fn strict() -> Self {
        Self {
            max_error_ratio: 0.0,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.indent_width == 0 || self.indent_width > 8 {
            return Err(format!(
                "indent_width must be between 1 and 8 (got {})",
                self.indent_width
            ));
        }

        if !(0.0..=1.0).contains(&self.max_error_ratio) {
            return Err(format!(
                "max_error_ratio must be within [0, 1] (got {})",
                self.max_error_ratio
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PrinterConfig::default().validate().is_ok());
        assert!(PrinterConfig::strict().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = PrinterConfig {
            indent_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PrinterConfig {
            max_error_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("max_error_ratio"));
    }
}
