use crate::config::PrinterConfig;
use crate::error::{PrinterError, Result};
use crate::language::Language;
use crate::parser::{ParsedSource, SyntaxParser};
use crate::tokens::{is_word_char, tokenize, Token, TokenClass};
use lens_source_map::{MapBuilder, OriginalLocation, PositionMap};

/// Reformatted text plus a map from printed positions to source positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedSource {
    pub text: String,
    pub map: PositionMap,
}

/// Re-emits a syntax tree as readable, indented text.
///
/// The printer works on the leaf token stream, so every source byte that is not
/// whitespace survives verbatim and in order. Only whitespace changes.
#[derive(Debug, Clone, Default)]
pub struct CodePrinter {
    config: PrinterConfig,
}

impl CodePrinter {
    pub fn new(config: PrinterConfig) -> Result<Self> {
        config.validate().map_err(PrinterError::invalid_config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Parse `source` and print it, failing when the parse is unrecoverable.
    pub fn format(&self, source: &str, language: Language, source_name: &str) -> Result<PrintedSource> {
        let mut parser = SyntaxParser::new(language)?;
        let parsed = parser.parse_recoverable(source, self.config.max_error_ratio)?;
        Ok(self.print(source, &parsed, source_name))
    }

    /// Print an already parsed source. `source_name` becomes the map's only source.
    pub fn print(&self, source: &str, parsed: &ParsedSource, source_name: &str) -> PrintedSource {
        let tokens = tokenize(source, parsed.root());
        let mut layout = Layout::new(&self.config, source_name, source.len());

        for (idx, token) in tokens.iter().enumerate() {
            layout.emit(token, tokens.get(idx + 1));
        }

        let printed = layout.finish();
        log::debug!(
            "Printed {} tokens: {} -> {} bytes, {} segments",
            tokens.len(),
            source.len(),
            printed.text.len(),
            printed.map.segment_count()
        );
        printed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Paren,
    Square,
    /// Brace whose contents are laid out one entry per line
    Block,
    /// Brace kept on one line (JSX expressions)
    Inline,
}

const STATEMENT_BODIES: &[&str] = &[
    "statement_block",
    "class_body",
    "switch_body",
    "enum_body",
    "interface_body",
    "object_type",
];

struct Layout<'c> {
    config: &'c PrinterConfig,
    out: String,
    line: u32,
    column: u32,
    builder: MapBuilder,
    source: u32,
    brackets: Vec<Bracket>,
    indent: usize,
    pending_newline: bool,
    prev: Option<PrevToken>,
}

#[derive(Debug, Clone)]
struct PrevToken {
    text: String,
    class: TokenClass,
    parent_kind: &'static str,
    opened_block: bool,
}

impl<'c> Layout<'c> {
    fn new(config: &'c PrinterConfig, source_name: &str, source_len: usize) -> Self {
        let mut builder = MapBuilder::new();
        let source = builder.add_source(source_name);
        Self {
            config,
            out: String::with_capacity(source_len + source_len / 4),
            line: 0,
            column: 0,
            builder,
            source,
            brackets: Vec::new(),
            indent: 0,
            pending_newline: false,
            prev: None,
        }
    }

    fn emit(&mut self, token: &Token<'_>, next: Option<&Token<'_>>) {
        let closed = self.close_bracket(token);
        if closed == Some(Bracket::Block) {
            self.indent = self.indent.saturating_sub(1);
        }

        let (break_line, space) = match &self.prev {
            Some(prev) => {
                let closes_nonempty_block = closed == Some(Bracket::Block) && !prev.opened_block;
                let break_line = self.pending_newline || token.newline_before || closes_nonempty_block;
                (break_line, !break_line && needs_space(prev, token))
            }
            None => (false, false),
        };
        if break_line {
            self.newline();
        } else if space {
            self.write_raw(" ");
        }

        if self.column == 0 && self.indent > 0 {
            let width = self.indent * self.config.indent_width;
            self.write_raw(&" ".repeat(width));
        }

        self.write_token(token);
        let opened = self.open_bracket(token);
        if opened == Some(Bracket::Block) {
            self.indent += 1;
        }

        self.pending_newline = self.breaks_after(token, next, closed, opened);
        self.prev = Some(PrevToken {
            text: token.text.to_string(),
            class: token.class,
            parent_kind: token.parent_kind,
            opened_block: opened == Some(Bracket::Block),
        });
    }

    fn close_bracket(&mut self, token: &Token<'_>) -> Option<Bracket> {
        if token.class != TokenClass::Punctuation {
            return None;
        }
        let top = *self.brackets.last()?;
        let matches = match token.text {
            ")" => top == Bracket::Paren,
            "]" => top == Bracket::Square,
            "}" => matches!(top, Bracket::Block | Bracket::Inline),
            _ => false,
        };
        if matches {
            self.brackets.pop()
        } else {
            None
        }
    }

    fn open_bracket(&mut self, token: &Token<'_>) -> Option<Bracket> {
        if token.class != TokenClass::Punctuation {
            return None;
        }
        let bracket = match token.text {
            "(" => Bracket::Paren,
            "[" => Bracket::Square,
            "{" if is_inline_brace(token) => Bracket::Inline,
            "{" => Bracket::Block,
            _ => return None,
        };
        self.brackets.push(bracket);
        Some(bracket)
    }

    fn breaks_after(
        &self,
        token: &Token<'_>,
        next: Option<&Token<'_>>,
        closed: Option<Bracket>,
        opened: Option<Bracket>,
    ) -> bool {
        if token.class == TokenClass::LineComment {
            return true;
        }
        let Some(next) = next else {
            return false;
        };
        if token.class != TokenClass::Punctuation {
            return false;
        }

        let in_block = matches!(self.brackets.last(), None | Some(Bracket::Block));
        match token.text {
            "{" => opened == Some(Bracket::Block) && next.text != "}",
            "}" => {
                closed == Some(Bracket::Block)
                    && STATEMENT_BODIES.contains(&token.parent_kind)
                    && !continues_statement(token, next)
            }
            ";" => in_block,
            "," => {
                self.brackets.last() == Some(&Bracket::Block)
                    && token.parent_kind != "sequence_expression"
            }
            ":" => matches!(token.parent_kind, "switch_case" | "switch_default"),
            _ => false,
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line += 1;
        self.column = 0;
    }

    fn write_raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.column += text.len() as u32;
    }

    fn write_token(&mut self, token: &Token<'_>) {
        let mut original = OriginalLocation::new(self.source, token.row, token.column);
        if token.class == TokenClass::Identifier {
            original.name_index = Some(self.builder.add_name(token.text));
        }
        self.builder.add_mapping(self.line, self.column, Some(original));

        let mut pieces = token.text.split('\n');
        if let Some(first) = pieces.next() {
            self.write_raw(first);
        }
        for (offset, piece) in pieces.enumerate() {
            self.newline();
            let continuation = OriginalLocation::new(self.source, token.row + offset as u32 + 1, 0);
            self.builder.add_mapping(self.line, 0, Some(continuation));
            self.write_raw(piece);
        }
    }

    fn finish(mut self) -> PrintedSource {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        PrintedSource {
            text: self.out,
            map: self.builder.build(),
        }
    }
}

fn is_inline_brace(token: &Token<'_>) -> bool {
    matches!(token.parent_kind, "jsx_expression" | "template_substitution")
}

fn continues_statement(brace: &Token<'_>, next: &Token<'_>) -> bool {
    match next.text {
        ";" | "," | ")" | "]" | "." | "?." | "(" | "else" | "catch" | "finally" => true,
        "while" => brace.grandparent_kind == "do_statement",
        _ => false,
    }
}

fn is_spaced_operator(text: &str, class: TokenClass, parent_kind: &str) -> bool {
    if class != TokenClass::Punctuation || matches!(text, "(" | ")" | "[" | "]" | "{" | "}" | ",") {
        return false;
    }
    match parent_kind {
        "binary_expression"
        | "assignment_expression"
        | "augmented_assignment_expression"
        | "ternary_expression" => true,
        "arrow_function" => text == "=>",
        "variable_declarator"
        | "assignment_pattern"
        | "object_assignment_pattern"
        | "field_definition"
        | "public_field_definition"
        | "required_parameter"
        | "optional_parameter"
        | "type_alias_declaration"
        | "enum_assignment" => text == "=",
        "union_type" => text == "|",
        "intersection_type" => text == "&",
        _ => false,
    }
}

fn needs_space(prev: &PrevToken, token: &Token<'_>) -> bool {
    let p = prev.text.as_str();
    let t = token.text;

    if prev.class.is_comment() || token.class.is_comment() {
        return true;
    }
    if p.ends_with(is_word_char) && t.starts_with(is_word_char) {
        return true;
    }
    if prev.class == TokenClass::Number && t == "." && p.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if (p.ends_with('+') && t.starts_with('+'))
        || (p.ends_with('-') && t.starts_with('-'))
        || (p.ends_with('/') && (t.starts_with('/') || t.starts_with('*')))
    {
        return true;
    }
    if is_spaced_operator(p, prev.class, prev.parent_kind)
        || is_spaced_operator(t, token.class, token.parent_kind)
    {
        return true;
    }
    if prev.class == TokenClass::Punctuation {
        match p {
            "," => return !matches!(t, ")" | "]"),
            ";" => return !matches!(t, ";" | ")"),
            ":" if matches!(prev.parent_kind, "pair" | "pair_pattern" | "type_annotation") => {
                return true
            }
            ")" if t.starts_with(is_word_char) => return true,
            _ => {}
        }
    }
    if prev.class == TokenClass::Keyword {
        let tight = matches!(t, ";" | "," | ")" | "]" | "." | "?." | ":")
            || (t == "(" && matches!(p, "super" | "import"));
        return !tight;
    }
    if token.class == TokenClass::Keyword && matches!(p, ")" | "]" | "}") {
        return true;
    }
    if t == "{" && token.class == TokenClass::Punctuation && !is_inline_brace(token) {
        return !matches!(p, "(" | "[" | "{" | "!" | "..." | "<" | "${");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_protocol::Position;
    use pretty_assertions::assert_eq;

    fn format(source: &str) -> PrintedSource {
        CodePrinter::default()
            .format(source, Language::JavaScript, "app.min.js")
            .unwrap()
    }

    #[test]
    fn splits_statements_onto_lines() {
        let printed = format("const x=1;console.log(x);const y=x+1;");
        assert_eq!(
            printed.text,
            "const x = 1;\nconsole.log(x);\nconst y = x + 1;\n"
        );
    }

    #[test]
    fn indents_blocks() {
        let printed = format("function f(a,b){if(a){return b}else{return a}}");
        assert_eq!(
            printed.text,
            "function f(a, b) {\n  if (a) {\n    return b\n  } else {\n    return a\n  }\n}\n"
        );
    }

    #[test]
    fn keeps_empty_blocks_inline() {
        let printed = format("try{a()}catch(e){}");
        assert_eq!(printed.text, "try {\n  a()\n} catch (e) {}\n");
    }

    #[test]
    fn for_header_stays_on_one_line() {
        let printed = format("for(i=0;i<n;i++)s+=i;");
        assert_eq!(printed.text, "for (i = 0; i < n; i++) s += i;\n");
    }

    #[test]
    fn object_literals_get_one_entry_per_line() {
        let printed = format("var o={a:1,b:function(){return 2}};");
        assert_eq!(
            printed.text,
            "var o = {\n  a: 1,\n  b: function () {\n    return 2\n  }\n};\n"
        );
    }

    #[test]
    fn map_points_tokens_at_source() {
        let printed = format("const x=1;console.log(x);");
        let log = printed.map.resolve(Position::new(2, 8)).unwrap();
        assert_eq!(log.source, "app.min.js");
        assert_eq!((log.line, log.column), (1, 18));
        assert_eq!(log.name.as_deref(), Some("log"));

        let arg = printed.map.resolve(Position::new(2, 12)).unwrap();
        assert_eq!((arg.line, arg.column), (1, 22));
    }

    #[test]
    fn multi_line_template_gets_continuation_segments() {
        let printed = format("a=`x\ny`;b");
        assert_eq!(printed.text, "a = `x\ny`;\nb\n");
        let continuation = printed.map.resolve(Position::new(2, 1)).unwrap();
        assert_eq!((continuation.line, continuation.column), (2, 0));
        let b = printed.map.resolve(Position::new(3, 0)).unwrap();
        assert_eq!((b.line, b.column), (2, 3));
    }

    #[test]
    fn line_comment_forces_break() {
        let printed = format("a(// note\nb)");
        assert_eq!(printed.text, "a( // note\nb)\n");
    }

    #[test]
    fn unary_operators_do_not_fuse() {
        let printed = format("a=b- -c;d=+ +e");
        assert_eq!(printed.text, "a = b - -c;\nd = + +e\n");
    }

    #[test]
    fn empty_source_prints_nothing() {
        let printed = format("");
        assert_eq!(printed.text, "");
        assert!(printed.map.is_empty());
    }
}
