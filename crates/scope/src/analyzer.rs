use crate::error::{Result, ScopeError};
use crate::options::AnalyzeOptions;
use crate::syntax_kind::{ScopeKind, SyntaxKind};
use lens_code_printer::{Language, SyntaxParser};
use lens_protocol::{Binding, BindingAnalysis, BindingKind, HitLocation, MappedPosition, Position};
use lens_source_map::PositionMap;
use std::collections::HashSet;
use tree_sitter::Node;

type ScopeId = u32;
type BindingId = usize;

/// Find the lexical bindings named `identifier` in `text` and the occurrences
/// resolving to each.
///
/// Without a target line every binding in the file is reported. With one, the
/// first occurrence on that line that resolves to a binding selects it, and
/// the result holds that binding alone with its [`HitLocation`].
pub fn analyze(
    text: &str,
    language: Language,
    map: Option<&PositionMap>,
    identifier: &str,
    options: &AnalyzeOptions,
) -> Result<BindingAnalysis> {
    options.validate().map_err(ScopeError::InvalidOptions)?;
    if identifier.is_empty() {
        return Err(ScopeError::EmptyIdentifier);
    }
    if !language.supports_ast() {
        return Err(ScopeError::map_unavailable(format!(
            "no syntax support for {}",
            language.as_str()
        )));
    }
    if options.require_map && map.is_none() {
        return Err(ScopeError::map_unavailable("analysis requires a position map"));
    }

    let parsed = SyntaxParser::new(language)?.parse(text)?;
    let mut context = AnalysisContext::new(text, identifier);
    context.walk(parsed.root());

    let analysis = context.finish(map, options);
    log::debug!(
        "Analyzed '{identifier}': {} binding(s), {} unresolved reference(s)",
        analysis.bindings.len(),
        analysis.unresolved_references
    );
    Ok(analysis)
}

struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    node_id: usize,
    binding: Option<BindingId>,
}

struct Declaration {
    scope: ScopeId,
    kind: BindingKind,
    position: Position,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Definition(BindingId),
    Use(ScopeId),
}

struct Site {
    position: Position,
    role: Role,
}

/// Per-run traversal state: the scope tree built so far, declarations of the
/// target name and every occurrence of it.
struct AnalysisContext<'a> {
    source: &'a str,
    identifier: &'a str,
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
    declarations: Vec<Declaration>,
    sites: Vec<Site>,
    /// Identifier nodes already consumed as declarations or export aliases
    claimed: HashSet<usize>,
}

impl<'a> AnalysisContext<'a> {
    fn new(source: &'a str, identifier: &'a str) -> Self {
        Self {
            source,
            identifier,
            scopes: Vec::new(),
            stack: Vec::new(),
            declarations: Vec::new(),
            sites: Vec::new(),
            claimed: HashSet::new(),
        }
    }

    fn walk(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        loop {
            self.enter(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                self.leave(cursor.node());
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn enter(&mut self, node: Node<'_>) {
        let kind = classify(node);

        match kind {
            SyntaxKind::FunctionDeclaration => {
                self.declare_field(node, "name", BindingKind::Function, self.current());
            }
            SyntaxKind::ClassDeclaration => {
                self.declare_field(node, "name", BindingKind::Class, self.current());
            }
            _ => {}
        }

        let parent = node.parent().map(classify);
        if let Some(scope_kind) = kind.opens_scope(parent) {
            self.push_scope(scope_kind, node.id());
        }

        match kind {
            SyntaxKind::FunctionExpression => {
                self.declare_field(node, "name", BindingKind::Function, self.current());
                self.declare_parameters(node);
            }
            SyntaxKind::FunctionDeclaration | SyntaxKind::ArrowFunction | SyntaxKind::Method => {
                self.declare_parameters(node);
            }
            SyntaxKind::ClassExpression => {
                self.declare_field(node, "name", BindingKind::Class, self.current());
            }
            SyntaxKind::CatchClause => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.declare_pattern(param, BindingKind::CatchParam, self.current());
                }
            }
            SyntaxKind::ForInStatement => {
                let binding_kind = node
                    .child_by_field_name("kind")
                    .and_then(|k| declaration_kind(self.text(k)));
                if let (Some(binding_kind), Some(left)) =
                    (binding_kind, node.child_by_field_name("left"))
                {
                    let scope = self.scope_for(binding_kind);
                    self.declare_pattern(left, binding_kind, scope);
                }
            }
            SyntaxKind::VariableDeclaration => {
                self.declare_declarators(node, BindingKind::Var);
            }
            SyntaxKind::LexicalDeclaration => {
                let binding_kind = node
                    .child_by_field_name("kind")
                    .and_then(|k| declaration_kind(self.text(k)))
                    .unwrap_or(BindingKind::Let);
                self.declare_declarators(node, binding_kind);
            }
            SyntaxKind::ImportClause | SyntaxKind::NamespaceImport => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "identifier" {
                        self.declare(child, BindingKind::Import, self.current());
                    }
                }
            }
            SyntaxKind::ImportSpecifier => {
                let local = match node.child_by_field_name("alias") {
                    Some(alias) => {
                        if let Some(imported) = node.child_by_field_name("name") {
                            self.claimed.insert(imported.id());
                        }
                        Some(alias)
                    }
                    None => node.child_by_field_name("name"),
                };
                if let Some(local) = local {
                    self.declare(local, BindingKind::Import, self.current());
                }
            }
            SyntaxKind::ExportSpecifier => {
                if let Some(alias) = node.child_by_field_name("alias") {
                    self.claimed.insert(alias.id());
                }
            }
            SyntaxKind::Reference => {
                if !self.claimed.contains(&node.id()) && self.text(node) == self.identifier {
                    self.sites.push(Site {
                        position: position_of(node),
                        role: Role::Use(self.current()),
                    });
                }
            }
            _ => {}
        }
    }

    fn leave(&mut self, node: Node<'_>) {
        let top = self.stack.last().map(|&id| self.scopes[id as usize].node_id);
        if top == Some(node.id()) && self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn push_scope(&mut self, kind: ScopeKind, node_id: usize) {
        let id = self.scopes.len() as ScopeId;
        self.scopes.push(Scope {
            parent: self.stack.last().copied(),
            kind,
            node_id,
            binding: None,
        });
        self.stack.push(id);
    }

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(0)
    }

    /// `var` binds to the nearest closure; everything else to the current scope.
    fn scope_for(&self, kind: BindingKind) -> ScopeId {
        if kind != BindingKind::Var {
            return self.current();
        }
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|&id| self.scopes[id as usize].kind.is_closure())
            .unwrap_or(0)
    }

    fn declare_field(&mut self, node: Node<'_>, field: &str, kind: BindingKind, scope: ScopeId) {
        if let Some(name) = node.child_by_field_name(field) {
            self.declare(name, kind, scope);
        }
    }

    fn declare_parameters(&mut self, function: Node<'_>) {
        let scope = self.current();
        if let Some(param) = function.child_by_field_name("parameter") {
            self.declare_pattern(param, BindingKind::Param, scope);
        }
        if let Some(params) = function.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                self.declare_pattern(param, BindingKind::Param, scope);
            }
        }
    }

    fn declare_declarators(&mut self, declaration: Node<'_>, kind: BindingKind) {
        let scope = self.scope_for(kind);
        let mut cursor = declaration.walk();
        for declarator in declaration.named_children(&mut cursor) {
            if let Some(name) = declarator.child_by_field_name("name") {
                self.declare_pattern(name, kind, scope);
            }
        }
    }

    /// Declare every identifier bound by a (possibly destructuring) pattern.
    fn declare_pattern(&mut self, pattern: Node<'_>, kind: BindingKind, scope: ScopeId) {
        let mut pending = vec![pattern];
        while let Some(node) = pending.pop() {
            match node.kind() {
                "identifier" | "shorthand_property_identifier_pattern" => {
                    self.declare(node, kind, scope);
                }
                "pair_pattern" => pending.extend(node.child_by_field_name("value")),
                "assignment_pattern" | "object_assignment_pattern" => {
                    pending.extend(node.child_by_field_name("left"));
                }
                "required_parameter" | "optional_parameter" => {
                    pending.extend(node.child_by_field_name("pattern"));
                }
                "object_pattern" | "array_pattern" | "rest_pattern" => {
                    let mut cursor = node.walk();
                    pending.extend(node.named_children(&mut cursor));
                }
                _ => {}
            }
        }
    }

    fn declare(&mut self, name: Node<'_>, kind: BindingKind, scope: ScopeId) {
        if !self.claimed.insert(name.id()) || self.text(name) != self.identifier {
            return;
        }
        let position = position_of(name);
        let slot = &mut self.scopes[scope as usize].binding;
        let role = match *slot {
            // A repeated declaration in the same scope writes the existing binding.
            Some(_) => Role::Use(scope),
            None => {
                let id = self.declarations.len();
                self.declarations.push(Declaration {
                    scope,
                    kind,
                    position,
                });
                *slot = Some(id);
                Role::Definition(id)
            }
        };
        self.sites.push(Site { position, role });
    }

    fn resolve(&self, scope: ScopeId) -> Option<BindingId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id as usize];
            if let Some(binding) = scope.binding {
                return Some(binding);
            }
            current = scope.parent;
        }
        None
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or("")
    }

    fn finish(mut self, map: Option<&PositionMap>, options: &AnalyzeOptions) -> BindingAnalysis {
        self.sites.sort_by_key(|site| site.position);

        let mut references: Vec<Vec<Position>> = vec![Vec::new(); self.declarations.len()];
        let mut unresolved_references = 0;
        let mut resolved_sites = Vec::with_capacity(self.sites.len());
        for site in &self.sites {
            let resolved = match site.role {
                Role::Definition(id) => Some((id, true)),
                Role::Use(scope) => match self.resolve(scope) {
                    Some(id) => {
                        references[id].push(site.position);
                        Some((id, false))
                    }
                    None => {
                        unresolved_references += 1;
                        None
                    }
                },
            };
            resolved_sites.push((site.position, resolved));
        }

        let build = |id: BindingId, hit_location: Option<HitLocation>| {
            let declaration = &self.declarations[id];
            let refs = &references[id];
            Binding {
                scope_id: declaration.scope,
                name: self.identifier.to_string(),
                kind: declaration.kind,
                definition: mapped(map, declaration.position),
                references: refs
                    .iter()
                    .take(options.max_references)
                    .map(|&position| mapped(map, position))
                    .collect(),
                total_reference_count: refs.len(),
                hit_location,
            }
        };

        let bindings = match options.target_line {
            Some(line) => resolved_sites
                .iter()
                .find_map(|&(position, resolved)| {
                    let (id, is_definition) = resolved.filter(|_| position.line == line)?;
                    let location = mapped(map, position);
                    let hit = if is_definition {
                        HitLocation::Definition { location }
                    } else {
                        HitLocation::Reference { location }
                    };
                    Some(build(id, Some(hit)))
                })
                .into_iter()
                .collect(),
            None => {
                let mut order: Vec<BindingId> = (0..self.declarations.len()).collect();
                order.sort_by_key(|&id| self.declarations[id].position);
                order.into_iter().map(|id| build(id, None)).collect()
            }
        };

        BindingAnalysis {
            identifier: self.identifier.to_string(),
            bindings,
            unresolved_references,
        }
    }
}

/// Keyword tokens share kind names with some named nodes (`function`, `class`).
fn classify(node: Node<'_>) -> SyntaxKind {
    if node.is_named() {
        SyntaxKind::of(node.kind())
    } else {
        SyntaxKind::Other
    }
}

fn declaration_kind(keyword: &str) -> Option<BindingKind> {
    match keyword {
        "var" => Some(BindingKind::Var),
        "let" => Some(BindingKind::Let),
        "const" => Some(BindingKind::Const),
        _ => None,
    }
}

fn position_of(node: Node<'_>) -> Position {
    let point = node.start_position();
    Position::new(point.row as u32 + 1, point.column as u32)
}

fn mapped(map: Option<&PositionMap>, generated: Position) -> MappedPosition {
    MappedPosition {
        generated,
        original: map.and_then(|map| {
            map.resolve(generated)
                .or_else(|| map.resolve_line(generated.line))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str, identifier: &str) -> BindingAnalysis {
        analyze(text, Language::JavaScript, None, identifier, &AnalyzeOptions::default()).unwrap()
    }

    fn generated(positions: &[MappedPosition]) -> Vec<(u32, u32)> {
        positions
            .iter()
            .map(|p| (p.generated.line, p.generated.column))
            .collect()
    }

    #[test]
    fn const_binding_collects_its_reads() {
        let analysis = run("const x=1;console.log(x);const y=x+1;", "x");
        assert_eq!(analysis.bindings.len(), 1);

        let binding = &analysis.bindings[0];
        assert_eq!(binding.kind, BindingKind::Const);
        assert_eq!(binding.definition.generated, Position::new(1, 6));
        assert_eq!(generated(&binding.references), vec![(1, 22), (1, 33)]);
        assert_eq!(binding.total_reference_count, 2);
        assert_eq!(analysis.unresolved_references, 0);
    }

    #[test]
    fn function_declarations_are_hoisted() {
        let analysis = run("f(); function f(){}", "f");
        assert_eq!(analysis.bindings.len(), 1);
        assert_eq!(analysis.bindings[0].kind, BindingKind::Function);
        assert_eq!(analysis.bindings[0].definition.generated, Position::new(1, 14));
        assert_eq!(generated(&analysis.bindings[0].references), vec![(1, 0)]);
    }

    #[test]
    fn var_escapes_blocks_but_not_functions() {
        let text = "function g(c){ v = 2; if (c) { var v = 1 } return v }\nuse(v);";
        let analysis = run(text, "v");
        assert_eq!(analysis.bindings.len(), 1);
        assert_eq!(analysis.bindings[0].kind, BindingKind::Var);
        assert_eq!(analysis.bindings[0].total_reference_count, 2);
        assert_eq!(analysis.unresolved_references, 1);
    }

    #[test]
    fn loop_bindings_stay_in_the_loop() {
        let analysis = run("for (let i of xs) { use(i) } use(i)", "i");
        assert_eq!(analysis.bindings.len(), 1);
        assert_eq!(analysis.bindings[0].definition.generated, Position::new(1, 9));
        assert_eq!(generated(&analysis.bindings[0].references), vec![(1, 24)]);
        assert_eq!(analysis.unresolved_references, 1);
    }

    #[test]
    fn destructuring_imports_and_catch_params_declare() {
        let text = "import def, {a as b, c} from \"m\";\nconst {d, e: [f = g]} = o;\ntry {} catch ({h}) { h }\n";
        assert_eq!(run(text, "b").bindings[0].kind, BindingKind::Import);
        assert_eq!(run(text, "def").bindings[0].kind, BindingKind::Import);
        assert_eq!(run(text, "f").bindings[0].kind, BindingKind::Const);
        assert_eq!(run(text, "d").bindings[0].kind, BindingKind::Const);

        let h = run(text, "h");
        assert_eq!(h.bindings[0].kind, BindingKind::CatchParam);
        assert_eq!(h.bindings[0].total_reference_count, 1);

        let imported = run(text, "a");
        assert!(imported.bindings.is_empty());
        assert_eq!(imported.unresolved_references, 0);

        let default_value = run(text, "g");
        assert!(default_value.bindings.is_empty());
        assert_eq!(default_value.unresolved_references, 1);
    }

    #[test]
    fn named_function_expressions_bind_inside_only() {
        let analysis = run("const k = function fact(n){ return fact(n) }; fact(1);", "fact");
        assert_eq!(analysis.bindings.len(), 1);
        assert_eq!(analysis.bindings[0].total_reference_count, 1);
        assert_eq!(analysis.unresolved_references, 1);
    }

    #[test]
    fn references_are_capped_but_counted() {
        let options = AnalyzeOptions::default().with_max_references(2);
        let analysis = analyze(
            "let n=0;n++;n++;n++;n++;n++;",
            Language::JavaScript,
            None,
            "n",
            &options,
        )
        .unwrap();
        assert_eq!(analysis.bindings[0].references.len(), 2);
        assert_eq!(analysis.bindings[0].total_reference_count, 5);
    }

    #[test]
    fn unsupported_languages_have_no_map() {
        let err = analyze("x", Language::Unknown, None, "x", &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, ScopeError::MapUnavailable(_)));

        let options = AnalyzeOptions {
            require_map: true,
            ..Default::default()
        };
        let err = analyze("x", Language::JavaScript, None, "x", &options).unwrap_err();
        assert!(matches!(err, ScopeError::MapUnavailable(_)));
    }
}
