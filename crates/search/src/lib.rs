//! # Source Lens Search
//!
//! Regex and literal search over rendered text, reported in rendered
//! coordinates and resolved back to the original file through a position map.
//!
//! - One match per line: the first occurrence wins, `total_matches` counts lines.
//! - Lines and context windows are sliced through a [`LineIndex`], never by
//!   splitting the whole buffer.
//! - `max_matches` caps materialized matches only; a soft time budget caps the scan.
//!
//! [`LineIndex`]: lens_source_map::LineIndex

mod engine;
mod error;
mod options;

pub use engine::search;
pub use error::{Result, SearchError};
pub use options::SearchOptions;
