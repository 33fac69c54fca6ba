//! # Source Lens Position Maps
//!
//! Positional truth across lossy rendering passes.
//!
//! ## Architecture
//!
//! ```text
//! raw source ──render──> rendered text      (map₁: rendered → raw)
//!                 │
//!                 └──transform──> transformed text   (map₂: transformed → rendered)
//!
//! compose(map₂, map₁) = mapFinal: transformed → raw
//! ```
//!
//! - [`PositionMap`]: per-generated-line segment lists with nearest-match lookup,
//!   serialized in the version 3 `mappings` wire form.
//! - [`LineIndex`] / [`TextBuffer`]: line offset tables for O(log n) offset → line
//!   lookup and zero-copy line slicing.
//! - [`compose`] / [`compose_chain`]: cascade maps so the last stage resolves
//!   straight to the original file.
//!
//! ## Example
//!
//! ```rust
//! use lens_protocol::Position;
//! use lens_source_map::{compose, PositionMap};
//!
//! let rendered = "let a = 1;\nlet b = a;\n";
//! let map = PositionMap::identity(rendered, "app.min.js");
//! let cascade = compose(&PositionMap::identity(rendered, "stage.js"), &map);
//!
//! let original = cascade.resolve(Position::new(2, 8)).unwrap();
//! assert_eq!((original.line, original.column), (2, 8));
//! assert_eq!(original.source, "app.min.js");
//! ```

mod codec;
mod compose;
mod error;
mod line_index;
mod map;
pub mod vlq;

pub use codec::{decode_mappings, encode_mappings, RawPositionMap, MAP_VERSION};
pub use compose::{compose, compose_chain};
pub use error::{MapError, Result};
pub use line_index::{count_lines, LineIndex, TextBuffer};
pub use map::{MapBuilder, OriginalLocation, PositionMap, Segment};
