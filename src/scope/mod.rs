//! Scopes - selector contexts for token declarations
//!
//! Tokenlint treats the base selector (`:root`) as the unconditional
//! definition of every token and all other selector contexts as overrides
//! layered on top of it.

pub mod table;

pub use table::{Scope, ScopeId, ScopeKind, ScopeTable};
