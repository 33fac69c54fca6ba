//! Value types shared by every stage of the rendering pipeline.
//!
//! Positions follow one convention everywhere: lines are 1-based, columns are
//! 0-based byte offsets within the line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: u32,
    /// 0-based byte column
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position in an original (pre-render) file, as resolved through a position map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginalPosition {
    pub source: String,
    /// 1-based line number
    pub line: u32,
    /// 0-based byte column
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OriginalPosition {
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for OriginalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// A generated position paired with where it came from, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedPosition {
    pub generated: Position,
    pub original: Option<OriginalPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub line: u32,
    pub content: String,
}

/// One reported search hit. At most one is reported per generated line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub line: u32,
    /// Byte column of the first occurrence on the line
    pub column: u32,
    pub content: String,
    #[serde(default)]
    pub context_before: Vec<ContextLine>,
    #[serde(default)]
    pub context_after: Vec<ContextLine>,
    pub original: Option<OriginalPosition>,
}

/// Why a search stopped materializing or counting matches.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchTruncation {
    MaxMatches,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
    /// Number of distinct generated lines that matched
    pub total_matches: usize,
    /// `total_matches > matches.len()`
    pub truncated: bool,
    #[serde(default)]
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

impl SearchResults {
    #[must_use]
    pub fn truncation(&self) -> Option<SearchTruncation> {
        if self.timed_out {
            Some(SearchTruncation::Timeout)
        } else if self.truncated {
            Some(SearchTruncation::MaxMatches)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Param,
    Function,
    Class,
    CatchParam,
    Import,
}

impl BindingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
            Self::Param => "param",
            Self::Function => "function",
            Self::Class => "class",
            Self::CatchParam => "catch_param",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which occurrence selected a binding in targeted analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitLocation {
    Definition { location: MappedPosition },
    Reference { location: MappedPosition },
}

impl HitLocation {
    #[must_use]
    pub const fn location(&self) -> &MappedPosition {
        match self {
            Self::Definition { location } | Self::Reference { location } => location,
        }
    }

    #[must_use]
    pub const fn is_definition(&self) -> bool {
        matches!(self, Self::Definition { .. })
    }
}

/// A lexical declaration and the occurrences that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Unique per analysis run; same-named bindings in different scopes differ here
    pub scope_id: u32,
    pub name: String,
    pub kind: BindingKind,
    pub definition: MappedPosition,
    /// Source order, capped by the caller's reference limit
    pub references: Vec<MappedPosition>,
    pub total_reference_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_location: Option<HitLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingAnalysis {
    pub identifier: String,
    pub bindings: Vec<Binding>,
    /// Occurrences that resolve to no declaration (implicit globals)
    pub unresolved_references: usize,
}
