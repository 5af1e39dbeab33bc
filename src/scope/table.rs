//! Scope table - selector contexts that own token declarations
//!
//! The base scope (`:root` by default) always has id 0. Every other
//! selector context is an override scope, numbered in order of first
//! appearance so that "later scope wins" can compare ids.

use std::collections::HashMap;

/// Dense identifier of a scope; also its declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The base scope
    pub fn base() -> Self {
        Self(0)
    }

    pub fn is_base(&self) -> bool {
        self.0 == 0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Unconditional token definitions
    Base,
    /// Conditional redefinition (theme attribute, media query, ...)
    Override,
}

/// A selector context
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub selector: String,
    pub kind: ScopeKind,
}

/// Interns scope keys into dense ids
#[derive(Debug)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    by_selector: HashMap<String, ScopeId>,
    base_selectors: Vec<String>,
}

impl ScopeTable {
    /// Create a table whose base scope is matched by any of `base_selectors`
    pub fn new(base_selectors: &[String]) -> Self {
        let base_selectors: Vec<String> = if base_selectors.is_empty() {
            vec![":root".to_string()]
        } else {
            base_selectors.to_vec()
        };
        let base = Scope {
            id: ScopeId::base(),
            selector: base_selectors[0].clone(),
            kind: ScopeKind::Base,
        };

        Self {
            scopes: vec![base],
            by_selector: HashMap::new(),
            base_selectors,
        }
    }

    /// Get or create the scope for a selector key
    pub fn intern(&mut self, selector: &str) -> ScopeId {
        if self.is_base_selector(selector) {
            return ScopeId::base();
        }
        if let Some(id) = self.by_selector.get(selector) {
            return *id;
        }

        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            selector: selector.to_string(),
            kind: ScopeKind::Override,
        });
        self.by_selector.insert(selector.to_string(), id);
        id
    }

    pub fn is_base_selector(&self, selector: &str) -> bool {
        self.base_selectors.iter().any(|s| s == selector)
    }

    /// Look up an existing scope by selector
    pub fn find(&self, selector: &str) -> Option<ScopeId> {
        if self.is_base_selector(selector) {
            return Some(ScopeId::base());
        }
        self.by_selector.get(selector).copied()
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn selector(&self, id: ScopeId) -> &str {
        &self.scopes[id.index()].selector
    }

    /// All scopes in declaration order, base first
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Override scopes in declaration order
    pub fn overrides(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().skip(1)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new(&[])
    }
}
