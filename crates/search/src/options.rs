use serde::{Deserialize, Serialize};

/// Search request parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub pattern: String,

    /// Treat `pattern` as a regular expression instead of literal text
    pub is_regex: bool,

    pub case_sensitive: bool,

    /// Lines of context collected before and after each reported line
    pub context_lines: usize,

    /// Matches materialized in the result; counting continues past this
    pub max_matches: usize,

    /// Soft wall-clock budget for the scan; 0 disables it
    pub timeout_ms: u64,

    /// Fail with `MapUnavailable` instead of returning unresolved positions
    pub require_map: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            is_regex: false,
            case_sensitive: false,
            context_lines: 2,
            max_matches: 50,
            timeout_ms: 5_000,
            require_map: false,
        }
    }
}

impl SearchOptions {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn regex(mut self) -> Self {
        self.is_regex = true;
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    #[must_use]
    pub fn with_context(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    #[must_use]
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = max;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_matches == 0 {
            return Err("max_matches must be > 0".to_string());
        }
        if self.context_lines > 100 {
            return Err(format!(
                "context_lines must be <= 100 (got {})",
                self.context_lines
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SearchOptions::new("x").validate().is_ok());
    }

    #[test]
    fn zero_match_cap_is_rejected() {
        let options = SearchOptions::new("x").with_max_matches(0);
        assert!(options.validate().unwrap_err().contains("max_matches"));
    }

    #[test]
    fn deserializes_partial_requests() {
        let options: SearchOptions =
            serde_json::from_str(r#"{"pattern":"a+","is_regex":true}"#).unwrap();
        assert!(options.is_regex);
        assert_eq!(options.max_matches, 50);
    }
}
