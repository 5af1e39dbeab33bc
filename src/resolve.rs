//! Theme Override Resolver
//!
//! Computes the literal value of every token under every scope by
//! substituting `var()` chains. A scope "view" is a sorted list of override
//! scopes layered on the base scope; each identifier takes its declaration
//! from the latest scope in the view that declares it.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::graph::{normalize_view, NodeId, TokenGraph};
use crate::scanner::var_ref::{next_var_start, parse_var_call};
use crate::scanner::VarReference;
use crate::scope::ScopeId;
use crate::{Error, Result};

/// Outcome of resolving one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Resolution {
    /// Fully substituted literal value
    Value(String),
    /// The chain reached an identifier with no applicable declaration
    Unresolved { missing: String },
    /// The chain loops back on itself
    Cycle { path: Vec<String> },
}

impl Resolution {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Resolution::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Resolution::Value(_))
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Value(value) => write!(f, "{}", value),
            Resolution::Unresolved { missing } => write!(f, "<unresolved --{}>", missing),
            Resolution::Cycle { path } => {
                let names: Vec<String> = path.iter().map(|n| format!("--{}", n)).collect();
                write!(f, "<cycle {}>", names.join(" → "))
            }
        }
    }
}

/// One row of the resolution table
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedToken {
    /// Scope selector, or selectors joined with ` + ` for a composed view
    pub scope: String,
    pub name: String,
    pub resolution: Resolution,
}

/// Resolved values for every (scope, identifier) pair, in scope then node order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResolutionTable {
    entries: Vec<ResolvedToken>,
}

impl ResolutionTable {
    pub fn get(&self, scope: &str, name: &str) -> Option<&Resolution> {
        let name = name.strip_prefix("--").unwrap_or(name);
        self.entries
            .iter()
            .find(|entry| entry.scope == scope && entry.name == name)
            .map(|entry| &entry.resolution)
    }

    /// Literal value of a token in a scope, if it resolved
    pub fn value(&self, scope: &str, name: &str) -> Option<&str> {
        self.get(scope, name).and_then(Resolution::as_value)
    }

    pub fn for_scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a ResolvedToken> + 'a {
        self.entries.iter().filter(move |entry| entry.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ResolvedToken> for ResolutionTable {
    fn from_iter<I: IntoIterator<Item = ResolvedToken>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A `var()` call waiting on the value it names
struct Pending {
    reference: VarReference,
    end: usize,
    /// The result being awaited comes from the call's fallback
    in_fallback: bool,
}

/// Substitution in progress over one value text
struct Frame {
    /// Token whose declared value this is; `None` for a fallback text
    node: Option<NodeId>,
    /// Token whose value this text feeds
    owner: NodeId,
    text: String,
    pos: usize,
    out: String,
    pending: Option<Pending>,
}

enum Step {
    Continue,
    Push(Frame),
    Done(Resolution),
}

/// Memoized substitution over one scope view.
///
/// Chains are walked with an explicit frame stack, so their depth is bounded
/// by memory rather than the thread stack.
struct Walk<'g> {
    graph: &'g TokenGraph,
    view: &'g [ScopeId],
    memo: HashMap<NodeId, Resolution>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g TokenGraph, view: &'g [ScopeId]) -> Self {
        Self {
            graph,
            view,
            memo: HashMap::new(),
        }
    }

    fn node_frame(&self, id: NodeId) -> Option<Frame> {
        let decl = self.graph.effective_declaration(self.view, id)?;
        Some(Frame {
            node: Some(id),
            owner: id,
            text: self.graph.declaration(decl).value.clone(),
            pos: 0,
            out: String::new(),
            pending: None,
        })
    }

    fn resolve_node(&mut self, id: NodeId) -> Resolution {
        if let Some(done) = self.memo.get(&id) {
            return done.clone();
        }
        let Some(root) = self.node_frame(id) else {
            return Resolution::Unresolved {
                missing: self.graph.name(id).to_string(),
            };
        };

        let mut frames = vec![root];
        let mut incoming: Option<Resolution> = None;

        while !frames.is_empty() {
            let step = match incoming.take() {
                Some(result) => {
                    let top = frames.len() - 1;
                    self.accept(&mut frames[top], result)
                }
                None => self.advance(&mut frames),
            };

            match step {
                Step::Continue => {}
                Step::Push(frame) => frames.push(frame),
                Step::Done(result) => {
                    if let Some(Frame { node: Some(node), .. }) = frames.pop() {
                        self.memo.insert(node, result.clone());
                    }
                    if frames.is_empty() {
                        return result;
                    }
                    incoming = Some(result);
                }
            }
        }

        Resolution::Unresolved {
            missing: self.graph.name(id).to_string(),
        }
    }

    /// Scan the top frame up to its next `var()` call, or to the end
    fn advance(&self, frames: &mut [Frame]) -> Step {
        let top = frames.len() - 1;
        loop {
            let frame = &frames[top];
            let Some(start) = next_var_start(&frame.text, frame.pos) else {
                let frame = &mut frames[top];
                frame.out.push_str(&frame.text[frame.pos..]);
                return Step::Done(Resolution::Value(frame.out.trim().to_string()));
            };
            let call = match parse_var_call(&frame.text, start) {
                Ok(call) => call,
                Err(_) => {
                    // malformed calls were reported by the scanner; keep the text
                    let frame = &mut frames[top];
                    frame.out.push_str(&frame.text[frame.pos..start + 4]);
                    frame.pos = start + 4;
                    continue;
                }
            };

            let target = self
                .graph
                .lookup(&call.reference.name)
                .filter(|id| self.graph.is_visible(self.view, *id));
            let known = match target {
                None => Some(Resolution::Unresolved {
                    missing: call.reference.name.clone(),
                }),
                Some(id) => match frames.iter().position(|f| f.node == Some(id)) {
                    Some(pos) => {
                        let mut path: Vec<String> = frames[pos..]
                            .iter()
                            .filter_map(|f| f.node)
                            .map(|n| self.graph.name(n).to_string())
                            .collect();
                        path.push(self.graph.name(id).to_string());
                        Some(Resolution::Cycle { path })
                    }
                    None => self.memo.get(&id).cloned(),
                },
            };

            let frame = &mut frames[top];
            frame.out.push_str(&frame.text[frame.pos..call.start]);
            frame.pending = Some(Pending {
                reference: call.reference,
                end: call.end,
                in_fallback: false,
            });

            if let Some(result) = known {
                return self.accept(frame, result);
            }
            return match target.and_then(|id| self.node_frame(id)) {
                Some(child) => Step::Push(child),
                None => {
                    let missing = frame.pending.as_ref().map(|p| p.reference.name.clone()).unwrap_or_default();
                    self.accept(frame, Resolution::Unresolved { missing })
                }
            };
        }
    }

    /// Hand a finished result to the frame whose `var()` call asked for it.
    ///
    /// A failed reference falls back when the call has a fallback, unless
    /// the failure is a cycle the frame's owner belongs to.
    fn accept(&self, frame: &mut Frame, result: Resolution) -> Step {
        let Some(pending) = frame.pending.take() else {
            return Step::Done(result);
        };

        let failed = match result {
            Resolution::Value(value) => {
                frame.out.push_str(&value);
                frame.pos = pending.end;
                return Step::Continue;
            }
            failed => failed,
        };
        if pending.in_fallback {
            return Step::Done(failed);
        }

        let may_fall_back = match &failed {
            Resolution::Cycle { path } => {
                let owner = self.graph.name(frame.owner);
                !path.iter().any(|name| name == owner)
            }
            _ => true,
        };
        match pending.reference.fallback.clone().filter(|_| may_fall_back) {
            Some(fallback) => {
                let child = Frame {
                    node: None,
                    owner: frame.owner,
                    text: fallback,
                    pos: 0,
                    out: String::new(),
                    pending: None,
                };
                frame.pending = Some(Pending {
                    in_fallback: true,
                    ..pending
                });
                Step::Push(child)
            }
            _ => Step::Done(failed),
        }
    }
}

/// Resolver over a classified token graph
pub struct ThemeResolver<'a> {
    graph: &'a TokenGraph,
}

impl<'a> ThemeResolver<'a> {
    pub fn new(graph: &'a TokenGraph) -> Self {
        Self { graph }
    }

    /// Resolve every visible token in every scope.
    ///
    /// Returns the table plus one `UnresolvedReferenceError` per scope and
    /// missing identifier that is declared somewhere but not in that scope.
    pub fn resolve_all(&self) -> (ResolutionTable, Vec<Diagnostic>) {
        let mut entries = Vec::new();
        let mut diagnostics = Vec::new();

        for scope in self.graph.scopes().iter() {
            let view = normalize_view(&[scope.id]);
            let mut reported: HashSet<String> = HashSet::new();

            for (id, resolution) in self.resolve_view(&view) {
                if let Resolution::Unresolved { missing } = &resolution {
                    let declared_elsewhere = self.graph.lookup(missing).is_some();
                    if declared_elsewhere && reported.insert(missing.clone()) {
                        diagnostics.push(self.unresolved_diagnostic(&view, &scope.selector, id, missing));
                    }
                }
                entries.push(ResolvedToken {
                    scope: scope.selector.clone(),
                    name: self.graph.name(id).to_string(),
                    resolution,
                });
            }
        }

        tracing::debug!(entries = entries.len(), unresolved = diagnostics.len(), "resolved scopes");
        (entries.into_iter().collect(), diagnostics)
    }

    /// Resolve one token with several override scopes applied at once
    pub fn resolve_in(&self, scopes: &[ScopeId], name: &str) -> Resolution {
        let view = normalize_view(scopes);
        let missing = || Resolution::Unresolved {
            missing: name.strip_prefix("--").unwrap_or(name).to_string(),
        };

        match self.graph.lookup(name) {
            Some(id) if self.graph.is_visible(&view, id) => Walk::new(self.graph, &view).resolve_node(id),
            _ => missing(),
        }
    }

    /// Resolve every token visible in a composed view
    pub fn resolve_composed(&self, scopes: &[ScopeId]) -> ResolutionTable {
        let view = normalize_view(scopes);
        let label = if view.is_empty() {
            self.graph.scopes().selector(ScopeId::base()).to_string()
        } else {
            let selectors: Vec<&str> = view.iter().map(|s| self.graph.scopes().selector(*s)).collect();
            selectors.join(" + ")
        };

        self.resolve_view(&view)
            .into_iter()
            .map(|(id, resolution)| ResolvedToken {
                scope: label.clone(),
                name: self.graph.name(id).to_string(),
                resolution,
            })
            .collect()
    }

    /// Map selectors to scope ids
    pub fn scope_ids(&self, selectors: &[String]) -> Result<Vec<ScopeId>> {
        selectors
            .iter()
            .map(|selector| {
                self.graph
                    .scopes()
                    .find(selector.trim())
                    .ok_or_else(|| Error::UnknownScope(selector.clone()))
            })
            .collect()
    }

    fn resolve_view(&self, view: &[ScopeId]) -> Vec<(NodeId, Resolution)> {
        let mut walk = Walk::new(self.graph, view);
        (0..self.graph.len())
            .map(|n| NodeId(n as u32))
            .filter(|id| self.graph.is_visible(view, *id))
            .map(|id| (id, walk.resolve_node(id)))
            .collect()
    }

    fn unresolved_diagnostic(&self, view: &[ScopeId], selector: &str, id: NodeId, missing: &str) -> Diagnostic {
        let location = self
            .graph
            .effective_declaration(view, id)
            .map(|decl| self.graph.declaration(decl).location.clone())
            .unwrap_or_else(|| self.graph.token(id).location.clone());

        Diagnostic::error(
            DiagnosticKind::UnresolvedReferenceError,
            location,
            format!(
                "`--{}` cannot be resolved in `{}`: `--{}` has no declaration in that scope",
                self.graph.name(id),
                selector,
                missing
            ),
        )
        .with_path(vec![self.graph.name(id).to_string(), missing.to_string()])
    }
}
