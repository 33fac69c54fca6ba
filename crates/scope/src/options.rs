use serde::{Deserialize, Serialize};

/// Binding analysis parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeOptions {
    /// 1-based line whose first resolvable occurrence selects a single binding
    pub target_line: Option<u32>,

    /// References listed per binding; `total_reference_count` is never capped
    pub max_references: usize,

    /// Fail with `MapUnavailable` instead of returning unresolved positions
    pub require_map: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            target_line: None,
            max_references: 100,
            require_map: false,
        }
    }
}

impl AnalyzeOptions {
    #[must_use]
    pub fn targeting(line: u32) -> Self {
        Self {
            target_line: Some(line),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_max_references(mut self, max: usize) -> Self {
        self.max_references = max;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_references == 0 {
            return Err("max_references must be > 0".to_string());
        }
        if self.target_line == Some(0) {
            return Err("target_line is 1-based".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_limits() {
        assert!(AnalyzeOptions::default().validate().is_ok());
        assert!(AnalyzeOptions::targeting(0).validate().is_err());
        assert!(AnalyzeOptions::default()
            .with_max_references(0)
            .validate()
            .unwrap_err()
            .contains("max_references"));
    }
}
