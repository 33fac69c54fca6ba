use crate::codec::RawPositionMap;
use crate::error::{MapError, Result};
use crate::line_index::to_u32;
use lens_protocol::{OriginalPosition, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a generated segment came from. Lines here are 0-based, as in the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalLocation {
    pub source_index: u32,
    pub line: u32,
    pub column: u32,
    pub name_index: Option<u32>,
}

impl OriginalLocation {
    #[must_use]
    pub const fn new(source_index: u32, line: u32, column: u32) -> Self {
        Self {
            source_index,
            line,
            column,
            name_index: None,
        }
    }

    #[must_use]
    pub const fn with_name(mut self, name_index: u32) -> Self {
        self.name_index = Some(name_index);
        self
    }
}

/// One entry of a generated line. `original == None` marks an explicitly unmapped run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub generated_column: u32,
    pub original: Option<OriginalLocation>,
}

/// Segment-based map from generated-text positions to original-text positions.
///
/// Segments within a generated line are sorted by `generated_column`. Lookups use
/// nearest-match semantics: a column resolves through the closest segment at or
/// before it on the same line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPositionMap", into = "RawPositionMap")]
pub struct PositionMap {
    file: Option<String>,
    sources: Vec<String>,
    names: Vec<String>,
    lines: Vec<Vec<Segment>>,
}

impl PositionMap {
    /// Assemble a map from its tables, validating every index and sorting each line.
    pub fn from_parts(
        file: Option<String>,
        sources: Vec<String>,
        names: Vec<String>,
        mut lines: Vec<Vec<Segment>>,
    ) -> Result<Self> {
        for segment in lines.iter().flatten() {
            let Some(original) = segment.original else {
                continue;
            };
            if original.source_index as usize >= sources.len() {
                return Err(MapError::SourceIndexOutOfRange {
                    index: original.source_index,
                    len: sources.len(),
                });
            }
            if let Some(name) = original.name_index {
                if name as usize >= names.len() {
                    return Err(MapError::NameIndexOutOfRange {
                        index: name,
                        len: names.len(),
                    });
                }
            }
        }

        for line in &mut lines {
            line.sort_by_key(|segment| segment.generated_column);
        }
        trim_trailing_empty(&mut lines);

        Ok(Self {
            file,
            sources,
            names,
            lines,
        })
    }

    /// A lexical-granularity identity map over `text`: one segment at the start of
    /// every line and one at every token start, each mapping to itself.
    pub fn identity(text: &str, source: impl Into<String>) -> Self {
        let mut builder = MapBuilder::new();
        let source_index = builder.add_source(source);

        for (line_idx, line) in text.split('\n').enumerate() {
            let line_no = to_u32(line_idx);
            builder.add_mapping(
                line_no,
                0,
                Some(OriginalLocation::new(source_index, line_no, 0)),
            );

            let mut prev_word = false;
            for (col, ch) in line.char_indices() {
                let word = is_word_char(ch);
                if col > 0 && !ch.is_whitespace() && !(word && prev_word) {
                    let col = to_u32(col);
                    builder.add_mapping(
                        line_no,
                        col,
                        Some(OriginalLocation::new(source_index, line_no, col)),
                    );
                }
                prev_word = word;
            }
        }

        builder.build()
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Segment lists indexed by 0-based generated line.
    #[must_use]
    pub fn lines(&self) -> &[Vec<Segment>] {
        &self.lines
    }

    #[must_use]
    pub fn generated_line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }

    /// Segments of 1-based generated `line`.
    #[must_use]
    pub fn line_segments(&self, line: u32) -> &[Segment] {
        line.checked_sub(1)
            .and_then(|idx| self.lines.get(idx as usize))
            .map_or(&[], Vec::as_slice)
    }

    /// Nearest-match lookup on a 0-based generated line.
    #[must_use]
    pub fn lookup(&self, generated_line: u32, generated_column: u32) -> Option<OriginalLocation> {
        let segments = self.lines.get(generated_line as usize)?;
        let idx = segments.partition_point(|s| s.generated_column <= generated_column);
        if idx == 0 {
            return None;
        }
        segments[idx - 1].original
    }

    /// Resolve a generated position to its original position.
    #[must_use]
    pub fn resolve(&self, position: Position) -> Option<OriginalPosition> {
        let line = position.line.checked_sub(1)?;
        let original = self.lookup(line, position.column)?;
        Some(self.original_position(&original))
    }

    /// First mapped segment on 1-based generated `line`.
    #[must_use]
    pub fn resolve_line(&self, line: u32) -> Option<OriginalPosition> {
        self.line_segments(line)
            .iter()
            .find_map(|segment| segment.original)
            .map(|original| self.original_position(&original))
    }

    /// Reverse lookup: the earliest generated position mapping to the closest
    /// original column at or before `column` on the given 1-based original line.
    #[must_use]
    pub fn generated_position_for(&self, source: &str, line: u32, column: u32) -> Option<Position> {
        let source_index = to_u32(self.sources.iter().position(|s| s == source)?);
        let original_line = line.checked_sub(1)?;

        let mut best: Option<(u32, Position)> = None;
        for (line_idx, segments) in self.lines.iter().enumerate() {
            for segment in segments {
                let Some(original) = segment.original else {
                    continue;
                };
                if original.source_index != source_index
                    || original.line != original_line
                    || original.column > column
                {
                    continue;
                }
                let candidate = Position::new(to_u32(line_idx) + 1, segment.generated_column);
                let better = match best {
                    None => true,
                    Some((best_col, best_pos)) => {
                        original.column > best_col
                            || (original.column == best_col && candidate < best_pos)
                    }
                };
                if better {
                    best = Some((original.column, candidate));
                }
            }
        }
        best.map(|(_, position)| position)
    }

    /// Convert a raw location into the public position type (1-based line, names resolved).
    #[must_use]
    pub fn original_position(&self, original: &OriginalLocation) -> OriginalPosition {
        OriginalPosition {
            source: self
                .sources
                .get(original.source_index as usize)
                .cloned()
                .unwrap_or_default(),
            line: original.line + 1,
            column: original.column,
            name: original
                .name_index
                .and_then(|idx| self.names.get(idx as usize).cloned()),
        }
    }

    #[must_use]
    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<String>, Vec<String>, Vec<Vec<Segment>>) {
        (self.file, self.sources, self.names, self.lines)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn trim_trailing_empty(lines: &mut Vec<Vec<Segment>>) {
    while lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
}

/// Incremental producer of a [`PositionMap`], interning sources and names.
#[derive(Debug, Default)]
pub struct MapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    source_ids: HashMap<String, u32>,
    names: Vec<String>,
    name_ids: HashMap<String, u32>,
    lines: Vec<Vec<Segment>>,
}

impl MapBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing `sources` table, keeping its indices.
    #[must_use]
    pub fn with_sources(sources: &[String]) -> Self {
        let mut builder = Self::new();
        for source in sources {
            builder.sources.push(source.clone());
            builder
                .source_ids
                .entry(source.clone())
                .or_insert(to_u32(builder.sources.len() - 1));
        }
        builder
    }

    #[must_use]
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn add_source(&mut self, source: impl Into<String>) -> u32 {
        let source = source.into();
        if let Some(&id) = self.source_ids.get(&source) {
            return id;
        }
        let id = to_u32(self.sources.len());
        self.sources.push(source.clone());
        self.source_ids.insert(source, id);
        id
    }

    pub fn add_name(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_ids.get(name) {
            return id;
        }
        let id = to_u32(self.names.len());
        self.names.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    /// Record a segment on 0-based `generated_line`.
    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        original: Option<OriginalLocation>,
    ) {
        let line = generated_line as usize;
        if self.lines.len() <= line {
            self.lines.resize_with(line + 1, Vec::new);
        }
        self.lines[line].push(Segment {
            generated_column,
            original,
        });
    }

    #[must_use]
    pub fn build(self) -> PositionMap {
        let mut lines = self.lines;
        for line in &mut lines {
            line.sort_by_key(|segment| segment.generated_column);
        }
        trim_trailing_empty(&mut lines);
        PositionMap {
            file: self.file,
            sources: self.sources,
            names: self.names,
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PositionMap {
        let mut builder = MapBuilder::new();
        let src = builder.add_source("app.min.js");
        let name = builder.add_name("decrypt");
        builder.add_mapping(0, 0, Some(OriginalLocation::new(src, 0, 0)));
        builder.add_mapping(0, 6, Some(OriginalLocation::new(src, 0, 6).with_name(name)));
        builder.add_mapping(1, 2, Some(OriginalLocation::new(src, 0, 20)));
        builder.add_mapping(1, 9, None);
        builder.build()
    }

    #[test]
    fn lookup_uses_nearest_preceding_segment() {
        let map = sample();
        assert_eq!(map.lookup(0, 3), Some(OriginalLocation::new(0, 0, 0)));
        assert_eq!(map.lookup(0, 6).unwrap().name_index, Some(0));
        assert_eq!(map.lookup(0, 100).unwrap().column, 6);
        assert_eq!(map.lookup(1, 1), None, "nothing precedes column 1");
        assert_eq!(map.lookup(1, 9), None, "explicitly unmapped");
        assert_eq!(map.lookup(7, 0), None);
    }

    #[test]
    fn resolve_reports_one_based_lines_and_names() {
        let map = sample();
        let original = map.resolve(Position::new(1, 8)).unwrap();
        assert_eq!(original.source, "app.min.js");
        assert_eq!(original.line, 1);
        assert_eq!(original.column, 6);
        assert_eq!(original.name.as_deref(), Some("decrypt"));
        assert!(map.resolve(Position::new(0, 0)).is_none());
    }

    #[test]
    fn resolve_line_skips_leading_gap() {
        let map = sample();
        let original = map.resolve_line(2).unwrap();
        assert_eq!(original.column, 20);
    }

    #[test]
    fn reverse_lookup_finds_generated_position() {
        let map = sample();
        assert_eq!(
            map.generated_position_for("app.min.js", 1, 25),
            Some(Position::new(2, 2))
        );
        assert_eq!(
            map.generated_position_for("app.min.js", 1, 7),
            Some(Position::new(1, 6))
        );
        assert_eq!(map.generated_position_for("other.js", 1, 0), None);
    }

    #[test]
    fn from_parts_rejects_dangling_indices() {
        let lines = vec![vec![Segment {
            generated_column: 0,
            original: Some(OriginalLocation::new(3, 0, 0)),
        }]];
        let err = PositionMap::from_parts(None, vec!["a.js".into()], Vec::new(), lines).unwrap_err();
        assert!(matches!(err, MapError::SourceIndexOutOfRange { index: 3, .. }));
    }

    #[test]
    fn from_parts_sorts_segments() {
        let seg = |col| Segment {
            generated_column: col,
            original: Some(OriginalLocation::new(0, 0, col)),
        };
        let map = PositionMap::from_parts(
            None,
            vec!["a.js".into()],
            Vec::new(),
            vec![vec![seg(5), seg(1)], Vec::new()],
        )
        .unwrap();
        assert_eq!(map.lines()[0][0].generated_column, 1);
        assert_eq!(map.generated_line_count(), 1);
    }

    #[test]
    fn identity_marks_line_and_token_starts() {
        let map = PositionMap::identity("  foo(bar)\nx", "t.js");
        let cols: Vec<u32> = map.lines()[0].iter().map(|s| s.generated_column).collect();
        assert_eq!(cols, vec![0, 2, 5, 6, 9]);
        assert_eq!(map.lines()[1].len(), 1);
        let resolved = map.resolve(Position::new(1, 6)).unwrap();
        assert_eq!((resolved.line, resolved.column), (1, 6));
    }
}
