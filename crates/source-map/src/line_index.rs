//! Line offset table over a text buffer.
//!
//! - `offsets[i]` is the byte offset where line `i + 1` begins; `offsets[0] == 0`.
//! - A buffer with `n` newlines has `n + 1` lines (an empty buffer has one empty line).
//! - Line ranges exclude the terminator; a `\r` before `\n` is excluded too.

use lens_protocol::Position;
use memchr::memchr_iter;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    offsets: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build the index in a single pass over the bytes of `text`.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut offsets = Vec::with_capacity(bytes.len() / 40 + 1);
        offsets.push(0);
        offsets.extend(memchr_iter(b'\n', bytes).map(|nl| nl + 1));
        Self {
            offsets,
            len: bytes.len(),
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn text_len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// 1-based line containing `offset`. Offsets past the end clamp to the last line.
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.offsets.partition_point(|&start| start <= offset).max(1)
    }

    /// Byte offset where 1-based `line` starts.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.offsets.get(line - 1).copied()
    }

    /// Byte range of 1-based `line`, excluding its terminator.
    pub fn line_range(&self, line: usize, text: &str) -> Option<Range<usize>> {
        let start = self.line_start(line)?;
        let mut end = match self.offsets.get(line) {
            Some(&next) => next - 1,
            None => self.len,
        };
        if end > start && text.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(start..end)
    }

    /// Slice the content of 1-based `line` out of `text` without copying.
    pub fn line_text<'a>(&self, text: &'a str, line: usize) -> Option<&'a str> {
        let range = self.line_range(line, text)?;
        text.get(range)
    }

    #[must_use]
    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_of_offset(offset);
        let start = self.offsets[line - 1];
        Position::new(to_u32(line), to_u32(offset - start))
    }

    /// Byte offset of `position`, or `None` when the line does not exist or the
    /// column runs past the end of the line.
    #[must_use]
    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let start = self.line_start(line)?;
        let line_end = match self.offsets.get(line) {
            Some(&next) => next - 1,
            None => self.len,
        };
        let offset = start + position.column as usize;
        (offset <= line_end).then_some(offset)
    }
}

/// A text stage (rendered or transformed code) together with its line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    index: LineIndex,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let index = LineIndex::new(&text);
        Self { text, index }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        self.index.line_text(&self.text, line)
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Number of lines in `text`: newline count plus one.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    memchr_iter(b'\n', text.as_bytes()).count() + 1
}

pub(crate) fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
