//! Flattening a syntax tree into the lexical tokens the printer lays out.
//!
//! Strings, templates, regexes, comments, numbers and JSX text are atomic: their
//! bytes are copied verbatim and never re-spaced. Zero-width recovery nodes are
//! dropped. Any non-whitespace byte that no leaf covers becomes a `Raw` token so
//! the printed text never loses input.

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Identifier,
    Keyword,
    /// Named word-like leaves such as `this`, `true`, `null`
    Word,
    Number,
    String,
    Template,
    Regex,
    Comment,
    LineComment,
    JsxText,
    Punctuation,
    Raw,
}

impl TokenClass {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenClass::Comment | TokenClass::LineComment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub class: TokenClass,
    pub kind: &'static str,
    pub parent_kind: &'static str,
    pub grandparent_kind: &'static str,
    pub start_byte: usize,
    /// 0-based row of the first byte
    pub row: u32,
    /// 0-based byte column of the first byte
    pub column: u32,
    /// Whether the source has a line break between the previous token and this one
    pub newline_before: bool,
}

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "private_property_identifier",
    "statement_identifier",
    "type_identifier",
];

fn atomic_class(node: &Node<'_>, text: &str) -> Option<TokenClass> {
    let class = match node.kind() {
        "string" => TokenClass::String,
        "template_string" => TokenClass::Template,
        "regex" => TokenClass::Regex,
        "number" => TokenClass::Number,
        "jsx_text" => TokenClass::JsxText,
        "hash_bang_line" => TokenClass::LineComment,
        "comment" | "html_comment" => {
            if text.starts_with("/*") {
                TokenClass::Comment
            } else {
                TokenClass::LineComment
            }
        }
        _ => return None,
    };
    Some(class)
}

fn leaf_class(node: &Node<'_>, text: &str, parent_kind: &str) -> TokenClass {
    if IDENTIFIER_KINDS.contains(&node.kind()) {
        return TokenClass::Identifier;
    }
    let wordy = text.chars().next().is_some_and(is_word_char);
    if node.is_named() {
        return if wordy {
            TokenClass::Word
        } else {
            TokenClass::Punctuation
        };
    }
    if wordy && text.chars().all(|c| c.is_ascii_alphabetic()) {
        if parent_kind == "predefined_type" {
            TokenClass::Word
        } else {
            TokenClass::Keyword
        }
    } else {
        TokenClass::Punctuation
    }
}

pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Collect the leaf tokens of `root` in source order.
pub fn tokenize<'a>(source: &'a str, root: Node<'_>) -> Vec<Token<'a>> {
    let mut collector = Collector {
        source,
        tokens: Vec::new(),
        pos: 0,
        row: 0,
        row_start: 0,
    };

    let mut cursor = root.walk();
    'walk: loop {
        let node = cursor.node();
        let text = source.get(node.start_byte()..node.end_byte()).unwrap_or("");
        let atomic = atomic_class(&node, text);

        if atomic.is_some() || node.child_count() == 0 {
            if !node.is_missing() && !text.trim().is_empty() {
                let (parent_kind, grandparent_kind) = ancestry(&node);
                let class = atomic.unwrap_or_else(|| leaf_class(&node, text, parent_kind));
                collector.push_node(&node, text, class, parent_kind, grandparent_kind);
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

    collector.flush_gap(source.len());
    collector.tokens
}

fn ancestry(node: &Node<'_>) -> (&'static str, &'static str) {
    let parent = node.parent();
    let grandparent = parent.and_then(|p| p.parent());
    (
        parent.map_or("", |p| p.kind()),
        grandparent.map_or("", |g| g.kind()),
    )
}

struct Collector<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    /// End of the last consumed byte
    pos: usize,
    /// Row and row start offset at `pos`
    row: u32,
    row_start: usize,
}

impl<'a> Collector<'a> {
    fn push_node(
        &mut self,
        node: &Node<'_>,
        text: &'a str,
        class: TokenClass,
        parent_kind: &'static str,
        grandparent_kind: &'static str,
    ) {
        let start = node.start_byte();
        if start < self.pos {
            // overlapping leaf from error recovery
            return;
        }
        let newline_before = self.flush_gap(start);
        let point = node.start_position();
        self.tokens.push(Token {
            text,
            class,
            kind: node.kind(),
            parent_kind,
            grandparent_kind,
            start_byte: start,
            row: point.row as u32,
            column: point.column as u32,
            newline_before,
        });
        self.advance_to(node.end_byte());
    }

    /// Emit uncovered non-whitespace runs in `pos..end` as raw tokens and report
    /// whether the remaining gap before `end` contains a line break.
    fn flush_gap(&mut self, end: usize) -> bool {
        let gap = self.source.get(self.pos..end).unwrap_or("");
        let base = self.pos;
        let mut newline = false;
        let mut run_start: Option<usize> = None;

        for (offset, ch) in gap.char_indices() {
            if ch.is_whitespace() {
                if let Some(start) = run_start.take() {
                    self.push_raw(base + start, base + offset, newline);
                    newline = false;
                }
                if ch == '\n' {
                    newline = true;
                }
            } else if run_start.is_none() {
                run_start = Some(offset);
            }
        }
        if let Some(start) = run_start {
            self.push_raw(base + start, end, newline);
            newline = false;
        }

        self.advance_to(end);
        newline
    }

    fn push_raw(&mut self, start: usize, end: usize, newline_before: bool) {
        self.advance_to(start);
        let text = self.source.get(start..end).unwrap_or("");
        self.tokens.push(Token {
            text,
            class: TokenClass::Raw,
            kind: "",
            parent_kind: "",
            grandparent_kind: "",
            start_byte: start,
            row: self.row,
            column: (start - self.row_start) as u32,
            newline_before,
        });
        self.advance_to(end);
    }

    fn advance_to(&mut self, end: usize) {
        if end <= self.pos {
            return;
        }
        let bytes = &self.source.as_bytes()[self.pos..end];
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                self.row += 1;
                self.row_start = self.pos + i + 1;
            }
        }
        self.pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::parser::SyntaxParser;

    fn texts(source: &str) -> Vec<String> {
        let mut parser = SyntaxParser::new(Language::JavaScript).unwrap();
        let parsed = parser.parse(source).unwrap();
        tokenize(source, parsed.root())
            .into_iter()
            .map(|t| t.text.to_string())
            .collect()
    }

    #[test]
    fn strings_and_templates_are_atomic() {
        let tokens = texts("a=\"x y\"+`t ${b} u`;");
        assert_eq!(tokens, vec!["a", "=", "\"x y\"", "+", "`t ${b} u`", ";"]);
    }

    #[test]
    fn records_positions_and_line_breaks() {
        let source = "let a\nfoo(/re+/g)";
        let mut parser = SyntaxParser::new(Language::JavaScript).unwrap();
        let parsed = parser.parse(source).unwrap();
        let tokens = tokenize(source, parsed.root());

        let foo = tokens.iter().find(|t| t.text == "foo").unwrap();
        assert_eq!((foo.row, foo.column), (1, 0));
        assert!(foo.newline_before);
        assert_eq!(foo.class, TokenClass::Identifier);

        let regex = tokens.iter().find(|t| t.class == TokenClass::Regex).unwrap();
        assert_eq!(regex.text, "/re+/g");
        assert_eq!(regex.column, 4);

        let keyword = &tokens[0];
        assert_eq!(keyword.class, TokenClass::Keyword);
        assert!(!keyword.newline_before);
    }

    #[test]
    fn comments_keep_their_flavor() {
        let mut parser = SyntaxParser::new(Language::JavaScript).unwrap();
        let source = "/* a */ x // b\n";
        let parsed = parser.parse(source).unwrap();
        let classes: Vec<TokenClass> = tokenize(source, parsed.root())
            .into_iter()
            .map(|t| t.class)
            .collect();
        assert_eq!(
            classes,
            vec![TokenClass::Comment, TokenClass::Identifier, TokenClass::LineComment]
        );
    }
}
