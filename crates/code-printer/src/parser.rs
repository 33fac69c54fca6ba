use crate::error::{PrinterError, Result};
use crate::language::Language;
use tree_sitter::{Node, Parser, Tree};

/// An error-tolerant syntax tree together with how much of it failed to parse.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    tree: Tree,
    language: Language,
    error_ratio: f64,
}

impl ParsedSource {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Share of source bytes covered by `ERROR` nodes (0.0 for a clean parse)
    pub fn error_ratio(&self) -> f64 {
        self.error_ratio
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Tree-sitter parser bound to one language
pub struct SyntaxParser {
    parser: Parser,
    language: Language,
}

impl SyntaxParser {
    pub fn new(language: Language) -> Result<Self> {
        if !language.supports_ast() {
            return Err(PrinterError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| PrinterError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `source`, recovering from syntax errors where tree-sitter can.
    pub fn parse(&mut self, source: &str) -> Result<ParsedSource> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| PrinterError::parse("Failed to parse source code"))?;

        let error_ratio = error_ratio(tree.root_node(), source.len());
        Ok(ParsedSource {
            tree,
            language: self.language,
            error_ratio,
        })
    }

    /// Parse and reject trees whose error share exceeds `max_error_ratio`. A limit
    /// of zero rejects any syntax error, including zero-width recovery nodes.
    pub fn parse_recoverable(&mut self, source: &str, max_error_ratio: f64) -> Result<ParsedSource> {
        let parsed = self.parse(source)?;
        let strict_violation = max_error_ratio <= 0.0 && parsed.has_errors();
        if strict_violation || parsed.error_ratio > max_error_ratio {
            return Err(PrinterError::parse(format!(
                "{:.0}% of the {} source is unparseable (limit {:.0}%)",
                parsed.error_ratio * 100.0,
                self.language.as_str(),
                max_error_ratio * 100.0
            )));
        }
        if parsed.has_errors() {
            log::debug!(
                "Recovered from syntax errors ({:.1}% of source)",
                parsed.error_ratio * 100.0
            );
        }
        Ok(parsed)
    }
}

/// One-shot convenience over [`SyntaxParser::parse_recoverable`].
pub fn parse_source(source: &str, language: Language, max_error_ratio: f64) -> Result<ParsedSource> {
    SyntaxParser::new(language)?.parse_recoverable(source, max_error_ratio)
}

fn error_ratio(root: Node<'_>, source_len: usize) -> f64 {
    if source_len == 0 || !root.has_error() {
        return 0.0;
    }
    if root.is_error() {
        return 1.0;
    }

    let mut error_bytes = 0usize;
    let mut cursor = root.walk();
    'walk: loop {
        let node = cursor.node();
        let descend = if node.is_error() {
            error_bytes += node.end_byte().saturating_sub(node.start_byte());
            false
        } else {
            node.has_error()
        };

        if descend && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    (error_bytes as f64 / source_len as f64).min(1.0)
}
