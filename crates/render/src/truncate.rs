//! Line-preserving truncation of long string and template literals.
//!
//! A literal longer than `char_limit` characters becomes
//! `head + "...[truncated N chars]..." + newlines + tail`, where `newlines` re-emits
//! every line break the removed interior contained. The total line count of the
//! text never changes, so a position map computed before truncation stays valid.

use crate::config::TruncateOptions;
use lens_code_printer::{Language, SyntaxParser};
use std::ops::Range;
use tree_sitter::Node;

/// Shorten long literals in `text`. Returns `text` unchanged when it cannot be
/// parsed or contains nothing to shorten.
pub fn truncate_literals(text: &str, language: Language, options: &TruncateOptions) -> String {
    let parsed = match SyntaxParser::new(language).and_then(|mut parser| parser.parse(text)) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::debug!("Skipping literal truncation: {err}");
            return text.to_string();
        }
    };

    let mut edits = Vec::new();
    collect_edits(text, parsed.root(), options, &mut edits);
    if edits.is_empty() {
        return text.to_string();
    }

    log::debug!("Truncated {} long literal(s)", edits.len());
    apply_edits(text, &edits)
}

struct Edit {
    range: Range<usize>,
    replacement: String,
}

fn collect_edits(text: &str, root: Node<'_>, options: &TruncateOptions, edits: &mut Vec<Edit>) {
    let mut cursor = root.walk();
    'walk: loop {
        let node = cursor.node();
        let literal = matches!(node.kind(), "string" | "template_string");

        if literal {
            if let Some(edit) = shorten(text, node, options) {
                edits.push(edit);
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
}

fn shorten(text: &str, node: Node<'_>, options: &TruncateOptions) -> Option<Edit> {
    let range = node.start_byte()..node.end_byte();
    let literal = text.get(range.clone())?;
    let char_len = literal.chars().count();
    if char_len <= options.char_limit {
        return None;
    }

    let keep = options.preview_len.min(char_len / 2).max(1);
    let protected = protected_spans(literal, node);

    let head_end = retreat_out_of(&protected, byte_offset_of_char(literal, keep));
    let tail_start = advance_out_of(
        &protected,
        byte_offset_of_char(literal, char_len - keep),
    );
    if head_end == 0 || tail_start >= literal.len() || head_end >= tail_start {
        return None;
    }

    let head = &literal[..head_end];
    let tail = &literal[tail_start..];
    let newlines = count_newlines(literal)
        .saturating_sub(count_newlines(head))
        .saturating_sub(count_newlines(tail));

    let line_break = if node.kind() == "template_string" {
        "\n"
    } else {
        "\\\n"
    };

    let mut replacement = String::with_capacity(head.len() + tail.len() + 40);
    replacement.push_str(head);
    replacement.push_str(&format!("...[truncated {char_len} chars]..."));
    for _ in 0..newlines {
        replacement.push_str(line_break);
    }
    replacement.push_str(tail);

    Some(Edit { range, replacement })
}

/// Byte spans inside `literal` that must not be split: template substitutions,
/// and escape sequences in the literal's own text.
fn protected_spans(literal: &str, node: Node<'_>) -> Vec<Range<usize>> {
    let base = node.start_byte();
    let mut cursor = node.walk();
    let substitutions: Vec<Range<usize>> = node
        .children(&mut cursor)
        .filter(|child| child.kind() == "template_substitution")
        .map(|child| child.start_byte() - base..child.end_byte() - base)
        .collect();

    let mut spans = escape_spans(literal, &substitutions);
    spans.extend(substitutions);
    spans
}

/// Escape sequences outside `skip`. Code inside a substitution has its own
/// backslashes (regexes, nested strings) that are not escapes of this literal.
fn escape_spans(literal: &str, skip: &[Range<usize>]) -> Vec<Range<usize>> {
    let bytes = literal.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(substitution) = skip.iter().find(|span| span.contains(&i)) {
            i = substitution.end;
            continue;
        }
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let start = i;
        let Some(next) = literal[i + 1..].chars().next() else {
            break;
        };
        let mut end = i + 1 + next.len_utf8();
        match next {
            'u' if bytes.get(end) == Some(&b'{') => {
                end = literal[end..]
                    .find('}')
                    .map_or(bytes.len(), |close| end + close + 1);
            }
            'u' => end = hex_run_end(bytes, end, 4),
            'x' => end = hex_run_end(bytes, end, 2),
            '\r' if bytes.get(end) == Some(&b'\n') => end += 1,
            _ => {}
        }
        spans.push(start..end.min(bytes.len()));
        i = end;
    }
    spans
}

fn hex_run_end(bytes: &[u8], from: usize, max: usize) -> usize {
    let mut end = from;
    while end < bytes.len() && end - from < max && bytes[end].is_ascii_hexdigit() {
        end += 1;
    }
    end
}

/// Move `offset` back until no span strictly contains it.
fn retreat_out_of(spans: &[Range<usize>], mut offset: usize) -> usize {
    while let Some(span) = enclosing(spans, offset) {
        offset = span.start;
    }
    offset
}

/// Move `offset` forward until no span strictly contains it.
fn advance_out_of(spans: &[Range<usize>], mut offset: usize) -> usize {
    while let Some(span) = enclosing(spans, offset) {
        offset = span.end;
    }
    offset
}

fn enclosing(spans: &[Range<usize>], offset: usize) -> Option<&Range<usize>> {
    spans
        .iter()
        .find(|span| span.start < offset && offset < span.end)
}

fn byte_offset_of_char(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(offset, _)| offset)
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for edit in edits {
        out.push_str(&text[pos..edit.range.start]);
        out.push_str(&edit.replacement);
        pos = edit.range.end;
    }
    out.push_str(&text[pos..]);
    out
}
