//! # Tokenlint - Design Token Linter
//!
//! Static analysis for CSS custom properties organised as design tokens.
//!
//! Tokenlint provides:
//! - A scanner for custom-property declarations and `var()` references
//! - An index-based reference graph keyed by token identifier
//! - Tier classification (primitive → semantic → component) from naming patterns
//! - Cycle and hierarchy validation with structured diagnostics
//! - Theme override resolution across selector scopes

pub mod token;
pub mod diagnostic;
pub mod scanner;
pub mod scope;
pub mod graph;
pub mod classify;
pub mod validate;
pub mod resolve;
pub mod pipeline;
pub mod config;
pub mod ignore;
pub mod output;
pub mod ui;
pub mod watcher;

// Re-exports for convenient access
pub use token::{Location, Tier, Token};
pub use diagnostic::{Diagnostic, DiagnosticKind, Report, Severity};
pub use graph::{NodeId, TokenGraph};
pub use scope::{ScopeId, ScopeKind};
pub use classify::TierClassifier;
pub use resolve::{Resolution, ResolutionTable, ThemeResolver};
pub use pipeline::{Analysis, Analyzer, SourceFile};
pub use config::TokenlintConfig;

/// Result type alias for Tokenlint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Tokenlint operations
///
/// Lint findings are never errors; they are collected as [`Diagnostic`]s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid tier pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message sent from parallel analysis workers to the coordinator
#[derive(Debug)]
pub enum AnalysisMessage {
    Analyzed {
        index: usize,
        path: String,
        analysis: Box<Analysis>,
    },
    Failed {
        index: usize,
        path: String,
        error: String,
    },
}

impl AnalysisMessage {
    /// Position of the file in the submitted batch
    pub fn index(&self) -> usize {
        match self {
            AnalysisMessage::Analyzed { index, .. } | AnalysisMessage::Failed { index, .. } => *index,
        }
    }

    /// Display path of the file this message refers to
    pub fn path(&self) -> &str {
        match self {
            AnalysisMessage::Analyzed { path, .. } | AnalysisMessage::Failed { path, .. } => path,
        }
    }
}
