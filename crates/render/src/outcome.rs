use lens_source_map::PositionMap;
use serde::{Deserialize, Serialize};

/// Result of rendering one source. Falling back to the original text is an
/// expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Reformatted text and a map from rendered positions to the source file
    Rendered { text: String, map: PositionMap },
    /// The source text unchanged, with no map
    Fallback { text: String, reason: String },
}

impl RenderOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Rendered { text, .. } | Self::Fallback { text, .. } => text,
        }
    }

    pub fn map(&self) -> Option<&PositionMap> {
        match self {
            Self::Rendered { map, .. } => Some(map),
            Self::Fallback { .. } => None,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn into_parts(self) -> (String, Option<PositionMap>) {
        match self {
            Self::Rendered { text, map } => (text, Some(map)),
            Self::Fallback { text, .. } => (text, None),
        }
    }
}

/// How the cache took part in a render
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// A valid entry was reused
    Hit,
    /// No entry existed; the render was computed (and stored when possible)
    Miss,
    /// An entry older than the source was replaced
    Stale,
    /// The cache was not consulted (no store, unsupported language, in-memory source)
    Bypassed,
}

/// A render outcome plus non-fatal diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub outcome: RenderOutcome,
    pub cache: CacheStatus,
    /// Cache write failures and skipped steps; never fatal
    pub warnings: Vec<String>,
}

impl RenderReport {
    pub fn new(outcome: RenderOutcome, cache: CacheStatus) -> Self {
        Self {
            outcome,
            cache,
            warnings: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        self.outcome.text()
    }

    pub fn map(&self) -> Option<&PositionMap> {
        self.outcome.map()
    }
}
