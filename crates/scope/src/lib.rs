//! # Source Lens Scope Analysis
//!
//! Answers "which declaration does this name refer to?" for rendered
//! JavaScript and TypeScript, so a caller looking at one line of a minified
//! bundle can separate the many unrelated bindings that share a short name.
//!
//! Analysis runs in two passes over the tree-sitter syntax tree:
//!
//! 1. **Declare**: an iterative walk builds the scope tree (program, functions,
//!    classes, blocks, loops, catch clauses) and records every declaration and
//!    occurrence of the requested name with its enclosing scope.
//! 2. **Resolve**: each occurrence walks its scope chain to the nearest
//!    declaration. Resolving after the walk gives hoisted `var` and function
//!    declarations their whole scope.
//!
//! Positions are reported in rendered coordinates and, when a position map is
//! supplied, resolved to the original file.

mod analyzer;
mod error;
mod options;
mod syntax_kind;

pub use analyzer::analyze;
pub use error::{Result, ScopeError};
pub use options::AnalyzeOptions;
