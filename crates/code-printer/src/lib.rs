//! # Source Lens Code Printer
//!
//! Turns minified JavaScript/TypeScript into readable text while recording where
//! every printed token came from.
//!
//! ```text
//! source ──> SyntaxParser (tree-sitter, error tolerant) ──> ParsedSource
//!                                                              │
//!                       tokenize (atomic literals/comments) <──┘
//!                                │
//!                                └──> CodePrinter layout ──> PrintedSource { text, map }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lens_code_printer::{CodePrinter, Language};
//!
//! let printer = CodePrinter::default();
//! let printed = printer
//!     .format("if(a){b()}", Language::JavaScript, "app.min.js")
//!     .unwrap();
//! assert_eq!(printed.text, "if (a) {\n  b()\n}\n");
//! ```

mod config;
mod error;
mod language;
mod parser;
mod printer;
pub mod tokens;

pub use config::PrinterConfig;
pub use error::{PrinterError, Result};
pub use language::Language;
pub use parser::{parse_source, ParsedSource, SyntaxParser};
pub use printer::{CodePrinter, PrintedSource};

/// Tree-sitter types re-exported for consumers walking a [`ParsedSource`].
pub use tree_sitter::{Node, Point, TreeCursor};
