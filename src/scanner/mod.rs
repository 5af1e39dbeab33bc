//! CSS Scanner - custom property extraction
//!
//! Turns stylesheet text into an ordered list of custom-property
//! [`Declaration`]s, one per selector scope, and reports malformed input
//! as recoverable `ParseError` diagnostics.

pub mod css;
pub mod var_ref;

pub use css::{scan, split_selector_list, Declaration, ScanResult};
pub use var_ref::{extract_references, VarCall, VarReference, VarSyntaxError};
