//! Token Graph - index-based reference graph
//!
//! Nodes are tokens keyed by identifier and stored densely in a `Vec`;
//! edges point from a consumer to every token its value references.
//! When an identifier is declared in several scopes, the base-scope
//! declaration backs the node and the others are kept as override
//! candidates for the resolver.

use std::collections::HashMap;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::scanner::{extract_references, Declaration, VarReference};
use crate::scope::{ScopeId, ScopeTable};
use crate::token::{Tier, Token};

/// Dense index of a token node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A token node and the declarations backing it
#[derive(Debug, Clone)]
pub struct TokenNode {
    pub id: NodeId,
    pub token: Token,
    /// Scope of the backing declaration
    pub scope: ScopeId,
    /// Index of the backing declaration
    pub declaration: usize,
    /// Live declarations of this identifier in other scopes, in scope order
    pub overrides: Vec<usize>,
}

/// Result of building a graph: the graph plus dangling-reference diagnostics
#[derive(Debug)]
pub struct GraphBuild {
    pub graph: TokenGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// In-memory reference graph over all scanned declarations.
#[derive(Debug, Default)]
pub struct TokenGraph {
    nodes: Vec<TokenNode>,
    /// Identifier → node
    index: HashMap<String, NodeId>,
    /// Outgoing edges per node (deduplicated, first-reference order)
    dependencies: Vec<Vec<NodeId>>,
    /// Incoming edges per node
    dependents: Vec<Vec<NodeId>>,
    declarations: Vec<Declaration>,
    declaration_scopes: Vec<ScopeId>,
    /// `var()` references per declaration
    references: Vec<Vec<VarReference>>,
    /// (scope, node) → live declaration; later declarations in a scope win
    scoped: HashMap<(ScopeId, NodeId), usize>,
    scopes: ScopeTable,
}

impl TokenGraph {
    /// Build the graph from scanner output
    pub fn build(declarations: Vec<Declaration>, base_selectors: &[String]) -> GraphBuild {
        let mut scopes = ScopeTable::new(base_selectors);
        let declaration_scopes: Vec<ScopeId> = declarations.iter().map(|d| scopes.intern(&d.scope)).collect();
        let references: Vec<Vec<VarReference>> = declarations.iter().map(|d| extract_references(&d.value)).collect();

        let mut index: HashMap<String, NodeId> = HashMap::new();
        let mut first_scope: Vec<ScopeId> = Vec::new();
        let mut scoped = HashMap::new();

        for (i, decl) in declarations.iter().enumerate() {
            let scope = declaration_scopes[i];
            let id = *index.entry(decl.name.clone()).or_insert_with(|| {
                first_scope.push(scope);
                NodeId(first_scope.len() as u32 - 1)
            });
            scoped.insert((scope, id), i);
        }

        let mut nodes = Vec::with_capacity(first_scope.len());
        for (n, first) in first_scope.iter().enumerate() {
            let id = NodeId(n as u32);
            let scope = if scoped.contains_key(&(ScopeId::base(), id)) { ScopeId::base() } else { *first };
            let declaration = scoped[&(scope, id)];
            let overrides = scopes
                .iter()
                .filter(|s| s.id != scope)
                .filter_map(|s| scoped.get(&(s.id, id)).copied())
                .collect();

            let decl = &declarations[declaration];
            nodes.push(TokenNode {
                id,
                token: Token::new(&decl.name, &decl.value, decl.location.clone()),
                scope,
                declaration,
                overrides,
            });
        }

        let mut dependencies = vec![Vec::new(); nodes.len()];
        let mut dependents = vec![Vec::new(); nodes.len()];
        for node in &nodes {
            for reference in &references[node.declaration] {
                if let Some(dep) = index.get(&reference.name).copied() {
                    if !dependencies[node.id.index()].contains(&dep) {
                        dependencies[node.id.index()].push(dep);
                        dependents[dep.index()].push(node.id);
                    }
                }
            }
        }

        let graph = Self {
            nodes,
            index,
            dependencies,
            dependents,
            declarations,
            declaration_scopes,
            references,
            scoped,
            scopes,
        };
        let diagnostics = graph.dangling_references();

        tracing::debug!(
            tokens = graph.len(),
            edges = graph.edge_count(),
            scopes = graph.scopes.len(),
            "built token graph"
        );

        GraphBuild { graph, diagnostics }
    }

    /// `var()` occurrences naming an identifier declared in no scope, without fallback
    fn dangling_references(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for i in self.live_declarations() {
            let decl = &self.declarations[i];
            for reference in &self.references[i] {
                if reference.has_fallback() || self.index.contains_key(&reference.name) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::UnresolvedReferenceError,
                        decl.location.clone(),
                        format!("`--{}` references undeclared token `--{}`", decl.name, reference.name),
                    )
                    .with_path(vec![decl.name.clone(), reference.name.clone()]),
                );
            }
        }
        diagnostics
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TokenNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[TokenNode] {
        &self.nodes
    }

    pub fn token(&self, id: NodeId) -> &Token {
        &self.nodes[id.index()].token
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].token.name
    }

    pub fn tier(&self, id: NodeId) -> Tier {
        self.nodes[id.index()].token.tier
    }

    pub fn set_tier(&mut self, id: NodeId, tier: Tier) {
        self.nodes[id.index()].token.tier = tier;
    }

    /// Look up a node by identifier (with or without the leading `--`)
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        let name = name.strip_prefix("--").unwrap_or(name);
        self.index.get(name).copied()
    }

    /// Tokens referenced by the node's backing declaration
    pub fn dependencies(&self, id: NodeId) -> &[NodeId] {
        &self.dependencies[id.index()]
    }

    /// Tokens whose backing declaration references this node
    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        &self.dependents[id.index()]
    }

    /// All edges as (consumer, dependency)
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(n, deps)| deps.iter().map(move |dep| (NodeId(n as u32), *dep)))
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(Vec::len).sum()
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declaration(&self, index: usize) -> &Declaration {
        &self.declarations[index]
    }

    pub fn declaration_scope(&self, index: usize) -> ScopeId {
        self.declaration_scopes[index]
    }

    pub fn references_of(&self, index: usize) -> &[VarReference] {
        &self.references[index]
    }

    /// Indices of declarations not shadowed by a later one in the same scope
    pub fn live_declarations(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.declarations.len()).filter(move |i| {
            let decl = &self.declarations[*i];
            self.index
                .get(&decl.name)
                .and_then(|id| self.scoped.get(&(self.declaration_scopes[*i], *id)))
                == Some(i)
        })
    }

    /// Live declaration of a token in exactly this scope
    pub fn declaration_in(&self, scope: ScopeId, id: NodeId) -> Option<usize> {
        self.scoped.get(&(scope, id)).copied()
    }

    /// Declaration in effect for a composed view of override scopes.
    ///
    /// `view` must be normalized (see [`normalize_view`]); the latest scope
    /// declaring the token wins, falling back to the base scope.
    pub fn effective_declaration(&self, view: &[ScopeId], id: NodeId) -> Option<usize> {
        view.iter()
            .rev()
            .find_map(|scope| self.declaration_in(*scope, id))
            .or_else(|| self.declaration_in(ScopeId::base(), id))
    }

    pub fn is_visible(&self, view: &[ScopeId], id: NodeId) -> bool {
        self.effective_declaration(view, id).is_some()
    }

    /// Dependencies of a token as seen through a composed view
    pub fn effective_dependencies(&self, view: &[ScopeId], id: NodeId) -> Vec<NodeId> {
        let mut deps = Vec::new();
        if let Some(decl) = self.effective_declaration(view, id) {
            for reference in &self.references[decl] {
                if let Some(dep) = self.index.get(&reference.name).copied() {
                    if !deps.contains(&dep) {
                        deps.push(dep);
                    }
                }
            }
        }
        deps
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut tiers = [0usize; 4];
        for node in &self.nodes {
            let slot = Tier::all().iter().position(|t| *t == node.token.tier).unwrap_or(3);
            tiers[slot] += 1;
        }

        GraphStats {
            tokens: self.nodes.len(),
            references: self.edge_count(),
            scopes: self.scopes.len(),
            overrides: self.nodes.iter().map(|n| n.overrides.len()).sum(),
            primitive: tiers[0],
            semantic: tiers[1],
            component: tiers[2],
            unknown: tiers[3],
        }
    }
}

/// Sort and deduplicate a scope list, dropping the base scope
pub fn normalize_view(scopes: &[ScopeId]) -> Vec<ScopeId> {
    let mut view: Vec<ScopeId> = scopes.iter().copied().filter(|s| !s.is_base()).collect();
    view.sort();
    view.dedup();
    view
}

/// Statistics about a token graph
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphStats {
    pub tokens: usize,
    pub references: usize,
    pub scopes: usize,
    pub overrides: usize,
    pub primitive: usize,
    pub semantic: usize,
    pub component: usize,
    pub unknown: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Token Graph Statistics:")?;
        writeln!(f, "  Tokens: {} (overrides: {})", self.tokens, self.overrides)?;
        writeln!(f, "  References: {}", self.references)?;
        writeln!(f, "  Scopes: {}", self.scopes)?;
        writeln!(
            f,
            "  Tiers: primitive {}, semantic {}, component {}, unknown {}",
            self.primitive, self.semantic, self.component, self.unknown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn build(source: &str) -> GraphBuild {
        let scanned = scan(source);
        assert!(scanned.diagnostics.is_empty(), "{:?}", scanned.diagnostics);
        TokenGraph::build(scanned.declarations, &[":root".to_string()])
    }

    #[test]
    fn test_nodes_and_edges() {
        let GraphBuild { graph, diagnostics } =
            build(":root { --a: 1px; --b: var(--a) var(--a); --c: calc(var(--b) + var(--a)); }");
        assert!(diagnostics.is_empty());
        assert_eq!(graph.len(), 3);

        let a = graph.lookup("a").unwrap();
        let b = graph.lookup("--b").unwrap();
        let c = graph.lookup("c").unwrap();
        assert_eq!(graph.dependencies(b), &[a]);
        assert_eq!(graph.dependencies(c), &[b, a]);
        assert_eq!(graph.dependents(a), &[b, c]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_base_declaration_backs_node() {
        let GraphBuild { graph, .. } = build(
            "[data-theme=\"dark\"] { --bg: black; }\n:root { --bg: white; }\n.brand { --bg: red; }",
        );
        let bg = graph.lookup("bg").unwrap();
        let node = graph.node(bg);
        assert!(node.scope.is_base());
        assert_eq!(node.token.value, "white");
        assert_eq!(node.token.location.line, 2);
        assert_eq!(node.overrides.len(), 2);
        assert_eq!(graph.scopes().len(), 3);
    }

    #[test]
    fn test_override_only_token_is_a_node() {
        let GraphBuild { graph, diagnostics } = build(":root { --a: var(--dark-only); }\n.dark { --dark-only: 1; }");
        assert!(diagnostics.is_empty());
        let node = graph.node(graph.lookup("dark-only").unwrap());
        assert!(!node.scope.is_base());
        assert!(node.overrides.is_empty());
    }

    #[test]
    fn test_later_declaration_in_scope_wins() {
        let GraphBuild { graph, diagnostics } = build(":root { --a: var(--gone); --a: 2px; }");
        let a = graph.lookup("a").unwrap();
        assert_eq!(graph.token(a).value, "2px");
        // the shadowed declaration is dead and not reported
        assert!(diagnostics.is_empty());
        assert_eq!(graph.live_declarations().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_unresolved_reference() {
        let GraphBuild { diagnostics, .. } = build(":root { --x: var(--y); }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReferenceError);
        assert_eq!(diagnostics[0].path, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_fallback_suppresses_unresolved() {
        let GraphBuild { diagnostics, .. } = build(":root { --x: var(--y, 4px); --z: var(--y, var(--w)); }");
        // --w has no fallback of its own
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("--w"));
    }

    #[test]
    fn test_effective_declaration_composition() {
        let GraphBuild { graph, .. } = build(
            ":root { --bg: white; }\n.dark { --bg: black; }\n.contrast { --bg: yellow; }",
        );
        let bg = graph.lookup("bg").unwrap();
        let dark = graph.scopes().find(".dark").unwrap();
        let contrast = graph.scopes().find(".contrast").unwrap();

        let value = |view: &[ScopeId]| graph.declaration(graph.effective_declaration(view, bg).unwrap()).value.clone();
        assert_eq!(value(&[]), "white");
        assert_eq!(value(&[dark]), "black");
        assert_eq!(value(&normalize_view(&[contrast, dark])), "yellow");
    }

    #[test]
    fn test_stats() {
        let GraphBuild { graph, .. } = build(":root { --a: 1; --b: var(--a); }\n.x { --a: 2; }");
        let stats = graph.stats();
        assert_eq!(stats.tokens, 2);
        assert_eq!(stats.references, 1);
        assert_eq!(stats.overrides, 1);
        assert_eq!(stats.unknown, 2);
    }
}
