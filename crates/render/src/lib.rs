//! # Source Lens Renderer
//!
//! Readable renderings of minified JavaScript and TypeScript, with a position
//! map from every rendered position back to the file on disk.
//!
//! ## Pipeline
//!
//! ```text
//! file ──> cache lookup (path, mtime) ──hit──────────────┐
//!               │ miss / stale                           │
//!               └──> parse + print ──> cache put         │
//!                        │ unrecoverable                 ▼
//!                        └──> Fallback(source text)   [transforms] ──> truncate
//! ```
//!
//! - [`Renderer`]: the entry point; falls back to the unchanged source instead
//!   of failing when a file cannot be parsed.
//! - [`CacheStore`]: injected store keyed by path and modification time, with
//!   [`FsCacheStore`] (atomic, sharded JSON files) and [`MemoryCacheStore`].
//! - [`truncate_literals`]: shortens long literals without changing the line
//!   count, so maps stay valid against the shortened text.
//! - [`SourceTransform`]: post-render rewrites whose maps are composed onto the
//!   render map.
//!
//! ## Example
//!
//! ```rust
//! use lens_code_printer::Language;
//! use lens_render::{RenderConfig, Renderer};
//!
//! let renderer = Renderer::without_cache(RenderConfig::default()).unwrap();
//! let outcome = renderer.render_source("if(a){b()}", Language::JavaScript, "app.js");
//! assert_eq!(outcome.text(), "if (a) {\n  b()\n}\n");
//! assert!(outcome.map().is_some());
//! ```

mod cache;
mod config;
mod error;
mod outcome;
mod renderer;
mod transform;
pub mod truncate;

pub use cache::{CacheKey, CacheLookup, CacheStore, CachedRender, FsCacheStore, MemoryCacheStore};
pub use config::{CacheConfig, RenderConfig, TruncateOptions};
pub use error::{CacheError, RenderError, Result};
pub use outcome::{CacheStatus, RenderOutcome, RenderReport};
pub use renderer::Renderer;
pub use transform::{write_output, IdentifierRenamer, SourceTransform, TransformOutput};
pub use truncate::truncate_literals;
