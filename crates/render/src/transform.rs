use crate::error::{RenderError, Result};
use lens_code_printer::ParsedSource;
use lens_source_map::{MapBuilder, OriginalLocation, PositionMap};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static OUTPUT_TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Text produced by a transform plus a map from that text back to its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub text: String,
    pub map: PositionMap,
}

/// A rewrite stage run after rendering. Its map becomes the outer map of a
/// composition with everything rendered so far.
pub trait SourceTransform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, source: &str, parsed: &ParsedSource) -> anyhow::Result<TransformOutput>;
}

/// Renames identifier occurrences by name.
///
/// Only plain `identifier` nodes are rewritten; property names and shorthand
/// properties keep their text.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRenamer {
    renames: HashMap<String, String>,
}

impl IdentifierRenamer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

struct Replacement<'a> {
    start_byte: usize,
    end_byte: usize,
    row: u32,
    column: u32,
    from: &'a str,
    to: &'a str,
}

impl SourceTransform for IdentifierRenamer {
    fn name(&self) -> &str {
        "identifier-renamer"
    }

    fn apply(&self, source: &str, parsed: &ParsedSource) -> anyhow::Result<TransformOutput> {
        for (from, to) in &self.renames {
            if to.is_empty() || to.contains(char::is_whitespace) {
                anyhow::bail!("invalid replacement name '{to}' for '{from}'");
            }
        }

        let mut replacements = Vec::new();
        let mut cursor = parsed.root().walk();
        'walk: loop {
            let node = cursor.node();
            if node.kind() == "identifier" {
                let text = source.get(node.start_byte()..node.end_byte()).unwrap_or("");
                if let Some((from, to)) = self.renames.get_key_value(text) {
                    let start = node.start_position();
                    replacements.push(Replacement {
                        start_byte: node.start_byte(),
                        end_byte: node.end_byte(),
                        row: start.row as u32,
                        column: start.column as u32,
                        from,
                        to,
                    });
                }
            } else if cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }

        let mut text = String::with_capacity(source.len());
        let mut pos = 0;
        for replacement in &replacements {
            text.push_str(&source[pos..replacement.start_byte]);
            text.push_str(replacement.to);
            pos = replacement.end_byte;
        }
        text.push_str(&source[pos..]);

        let map = shifted_identity(source, &replacements);
        log::debug!("Renamed {} identifier occurrence(s)", replacements.len());
        Ok(TransformOutput { text, map })
    }
}

/// Identity segmentation of `source`, with generated columns shifted by the
/// length changes of earlier replacements on the same line. Renamed
/// identifiers keep their old name in the map.
fn shifted_identity(source: &str, replacements: &[Replacement<'_>]) -> PositionMap {
    let identity = PositionMap::identity(source, "input");
    let mut by_row: HashMap<u32, Vec<&Replacement<'_>>> = HashMap::new();
    for replacement in replacements {
        by_row.entry(replacement.row).or_default().push(replacement);
    }

    let mut builder = MapBuilder::with_sources(identity.sources());
    for (row, segments) in identity.lines().iter().enumerate() {
        let row = row as u32;
        let on_row = by_row.get(&row).map_or(&[][..], Vec::as_slice);
        for segment in segments {
            let column = segment.generated_column;
            let mut shift: i64 = 0;
            let mut renamed = None;
            for replacement in on_row {
                if replacement.column < column {
                    shift += replacement.to.len() as i64 - replacement.from.len() as i64;
                } else if replacement.column == column {
                    renamed = Some(replacement.from);
                }
            }

            let mut original = segment.original.unwrap_or(OriginalLocation::new(0, row, column));
            if let Some(name) = renamed {
                original.name_index = Some(builder.add_name(name));
            }
            let generated = (i64::from(column) + shift).max(0) as u32;
            builder.add_mapping(row, generated, Some(original));
        }
    }
    builder.build()
}

/// Write transform output to `path` through a temporary file and rename.
/// Unlike cache writes, failures here are returned to the caller.
pub async fn write_output(path: impl AsRef<Path>, text: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RenderError::from_io(parent, e))?;
    }

    let seq = OUTPUT_TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(".{}.{seq}.tmp", std::process::id()));
    let tmp = std::path::PathBuf::from(tmp_name);

    if let Err(err) = tokio::fs::write(&tmp, text).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(RenderError::from_io(path, err));
    }
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(RenderError::from_io(path, err));
    }
    Ok(())
}
