//! Cycle & Hierarchy Validator
//!
//! Cycle detection is an iterative depth-first search with white/gray/black
//! coloring. A reference to a gray node (one still on the DFS stack) closes a
//! cycle; the reported path runs from that node along the stack back to it,
//! so it never repeats a node except for the closing edge.
//!
//! The base graph is checked first. Each override scope is then checked
//! through its effective view, reporting only cycles that use at least one
//! reference edge the base graph lacks.

use crate::classify::TierClassifier;
use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
use crate::graph::{NodeId, TokenGraph};
use crate::scope::ScopeId;
use crate::token::Tier;

/// Severities applied to non-structural findings
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    pub hierarchy_inversion: Severity,
    pub unknown_tier: Severity,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            hierarchy_inversion: Severity::Warning,
            unknown_tier: Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Find every cycle closed by a back edge, visiting roots and edges in order.
///
/// Each returned path starts and ends with the same node.
pub fn find_cycles(adjacency: &[Vec<NodeId>]) -> Vec<Vec<NodeId>> {
    let mut color = vec![Color::White; adjacency.len()];
    let mut cycles = Vec::new();

    for root in 0..adjacency.len() {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        let mut stack: Vec<(NodeId, usize)> = vec![(NodeId(root as u32), 0)];

        while let Some(&(node, next)) = stack.last() {
            let deps = &adjacency[node.index()];
            if next >= deps.len() {
                color[node.index()] = Color::Black;
                stack.pop();
                continue;
            }
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let dep = deps[next];
            match color[dep.index()] {
                Color::White => {
                    color[dep.index()] = Color::Gray;
                    stack.push((dep, 0));
                }
                Color::Gray => {
                    if let Some(start) = stack.iter().position(|(n, _)| *n == dep) {
                        let mut cycle: Vec<NodeId> = stack[start..].iter().map(|(n, _)| *n).collect();
                        cycle.push(dep);
                        cycles.push(cycle);
                    }
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

/// A reference that points up the tier order
#[derive(Debug, Clone)]
pub struct Inversion {
    pub declaration: usize,
    pub consumer: NodeId,
    /// Referenced name; it may be declared nowhere
    pub dependency: String,
    pub dependency_tier: Tier,
}

/// Validator over a classified token graph
pub struct Validator<'a> {
    graph: &'a TokenGraph,
    classifier: &'a TierClassifier,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(graph: &'a TokenGraph, classifier: &'a TierClassifier, options: ValidationOptions) -> Self {
        Self {
            graph,
            classifier,
            options,
        }
    }

    /// Run every check; diagnostics ordered cycles, inversions, unknown tiers
    pub fn run(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        diagnostics.extend(self.cycle_diagnostics());
        diagnostics.extend(self.hierarchy_diagnostics());
        diagnostics.extend(self.unknown_tier_diagnostics());
        diagnostics
    }

    fn base_adjacency(&self) -> Vec<Vec<NodeId>> {
        (0..self.graph.len())
            .map(|n| {
                let id = NodeId(n as u32);
                if self.graph.node(id).scope.is_base() {
                    self.graph.dependencies(id).to_vec()
                } else {
                    Vec::new()
                }
            })
            .collect()
    }

    /// Cycles in the base graph
    pub fn base_cycles(&self) -> Vec<Vec<NodeId>> {
        find_cycles(&self.base_adjacency())
    }

    /// Cycles in an override scope's effective view that use at least one
    /// edge the base graph does not have
    pub fn override_cycles(&self, scope: ScopeId) -> Vec<Vec<NodeId>> {
        let view = [scope];
        let base = self.base_adjacency();
        let adjacency: Vec<Vec<NodeId>> = (0..self.graph.len())
            .map(|n| self.graph.effective_dependencies(&view, NodeId(n as u32)))
            .collect();

        find_cycles(&adjacency)
            .into_iter()
            .filter(|cycle| cycle.windows(2).any(|edge| !base[edge[0].index()].contains(&edge[1])))
            .collect()
    }

    fn cycle_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .base_cycles()
            .into_iter()
            .map(|cycle| self.cycle_diagnostic(ScopeId::base(), &cycle))
            .collect();

        for scope in self.graph.scopes().overrides() {
            for cycle in self.override_cycles(scope.id) {
                diagnostics.push(self.cycle_diagnostic(scope.id, &cycle));
            }
        }
        diagnostics
    }

    fn cycle_diagnostic(&self, scope: ScopeId, cycle: &[NodeId]) -> Diagnostic {
        let path: Vec<String> = cycle.iter().map(|id| self.graph.name(*id).to_string()).collect();
        let rendered: Vec<String> = path.iter().map(|name| format!("--{}", name)).collect();

        let view = [scope];
        let location = cycle
            .iter()
            .find_map(|id| self.graph.declaration_in(scope, *id))
            .or_else(|| self.graph.effective_declaration(&view, cycle[0]))
            .map(|decl| self.graph.declaration(decl).location.clone())
            .unwrap_or_else(|| self.graph.token(cycle[0]).location.clone());

        Diagnostic::error(
            DiagnosticKind::CycleError,
            location,
            format!("reference cycle: {}", rendered.join(" → ")),
        )
        .with_path(path)
    }

    fn reference_tier(&self, name: &str) -> Tier {
        match self.graph.lookup(name) {
            Some(id) => self.graph.tier(id),
            None => self.classifier.classify(name),
        }
    }

    /// Every reference from a live declaration whose consumer sits below
    /// the referenced token in the tier order. Names declared nowhere are
    /// classified by name alone.
    pub fn hierarchy_inversions(&self) -> Vec<Inversion> {
        let mut inversions = Vec::new();
        for decl in self.graph.live_declarations() {
            let Some(consumer) = self.graph.lookup(&self.graph.declaration(decl).name) else {
                continue;
            };
            let mut seen: Vec<&str> = Vec::new();
            for reference in self.graph.references_of(decl) {
                if seen.contains(&reference.name.as_str()) {
                    continue;
                }
                seen.push(reference.name.as_str());
                let dependency_tier = self.reference_tier(&reference.name);
                if !self.graph.tier(consumer).may_reference(dependency_tier) {
                    inversions.push(Inversion {
                        declaration: decl,
                        consumer,
                        dependency: reference.name.clone(),
                        dependency_tier,
                    });
                }
            }
        }
        inversions
    }

    fn hierarchy_diagnostics(&self) -> Vec<Diagnostic> {
        self.hierarchy_inversions()
            .into_iter()
            .map(|inversion| {
                let consumer = self.graph.name(inversion.consumer);
                Diagnostic::new(
                    self.options.hierarchy_inversion,
                    DiagnosticKind::HierarchyInversion,
                    self.graph.declaration(inversion.declaration).location.clone(),
                    format!(
                        "{} token `--{}` depends on {} token `--{}`",
                        self.graph.tier(inversion.consumer),
                        consumer,
                        inversion.dependency_tier,
                        inversion.dependency
                    ),
                )
                .with_path(vec![consumer.to_string(), inversion.dependency])
            })
            .collect()
    }

    fn unknown_tier_diagnostics(&self) -> Vec<Diagnostic> {
        self.graph
            .nodes()
            .iter()
            .filter(|node| node.token.tier == Tier::Unknown)
            .map(|node| {
                Diagnostic::new(
                    self.options.unknown_tier,
                    DiagnosticKind::UnknownTier,
                    node.token.location.clone(),
                    format!("`--{}` matches no tier pattern", node.token.name),
                )
            })
            .collect()
    }
}
