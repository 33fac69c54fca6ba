//! Classification of tree-sitter node kinds by their role in scoping.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Program,
    Function,
    Class,
    Block,
}

impl ScopeKind {
    /// `var` declarations bind to the nearest closure
    pub(crate) fn is_closure(self) -> bool {
        matches!(self, Self::Program | Self::Function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyntaxKind {
    Program,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    Method,
    ClassDeclaration,
    ClassExpression,
    StatementBlock,
    ForStatement,
    ForInStatement,
    CatchClause,
    SwitchBody,
    VariableDeclaration,
    LexicalDeclaration,
    ImportClause,
    NamespaceImport,
    ImportSpecifier,
    ExportSpecifier,
    /// Identifier-like leaves that can name a binding
    Reference,
    Other,
}

impl SyntaxKind {
    pub(crate) fn of(kind: &str) -> Self {
        match kind {
            "program" => Self::Program,
            "function_declaration" | "generator_function_declaration" => Self::FunctionDeclaration,
            "function_expression" | "function" | "generator_function" => Self::FunctionExpression,
            "arrow_function" => Self::ArrowFunction,
            "method_definition" => Self::Method,
            "class_declaration" | "abstract_class_declaration" => Self::ClassDeclaration,
            "class" => Self::ClassExpression,
            "statement_block" => Self::StatementBlock,
            "for_statement" => Self::ForStatement,
            "for_in_statement" => Self::ForInStatement,
            "catch_clause" => Self::CatchClause,
            "switch_body" => Self::SwitchBody,
            "variable_declaration" => Self::VariableDeclaration,
            "lexical_declaration" => Self::LexicalDeclaration,
            "import_clause" => Self::ImportClause,
            "namespace_import" => Self::NamespaceImport,
            "import_specifier" => Self::ImportSpecifier,
            "export_specifier" => Self::ExportSpecifier,
            "identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern" => Self::Reference,
            _ => Self::Other,
        }
    }

    pub(crate) fn is_function(self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration | Self::FunctionExpression | Self::ArrowFunction | Self::Method
        )
    }

    /// The scope this node opens, if any. A function body block shares the
    /// function's scope, so `parent` is needed to decide for blocks.
    pub(crate) fn opens_scope(self, parent: Option<SyntaxKind>) -> Option<ScopeKind> {
        match self {
            Self::Program => Some(ScopeKind::Program),
            _ if self.is_function() => Some(ScopeKind::Function),
            Self::ClassDeclaration | Self::ClassExpression => Some(ScopeKind::Class),
            Self::StatementBlock if parent.is_some_and(SyntaxKind::is_function) => None,
            Self::StatementBlock
            | Self::ForStatement
            | Self::ForInStatement
            | Self::CatchClause
            | Self::SwitchBody => Some(ScopeKind::Block),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_bodies_share_the_function_scope() {
        let block = SyntaxKind::of("statement_block");
        assert_eq!(block.opens_scope(Some(SyntaxKind::of("arrow_function"))), None);
        assert_eq!(
            block.opens_scope(Some(SyntaxKind::of("if_statement"))),
            Some(ScopeKind::Block)
        );
        assert_eq!(
            SyntaxKind::of("method_definition").opens_scope(None),
            Some(ScopeKind::Function)
        );
    }

    #[test]
    fn only_programs_and_functions_are_closures() {
        assert!(ScopeKind::Program.is_closure());
        assert!(ScopeKind::Function.is_closure());
        assert!(!ScopeKind::Block.is_closure());
        assert!(!ScopeKind::Class.is_closure());
    }
}
