//! Diagnostics - structured lint findings
//!
//! Every stage of the pipeline reports problems as [`Diagnostic`] records
//! instead of failing. A [`Report`] collects them in pipeline order so a run
//! always surfaces everything it found.

use crate::token::Location;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a diagnostic; config files may also spell these `warn`/`deny`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "deny" => Ok(Severity::Error),
            _ => Err(Error::UnknownSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of problem a diagnostic describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed declaration; scanning recovered and continued
    ParseError,
    /// `var()` names a token with no applicable declaration and no fallback
    UnresolvedReferenceError,
    /// Tokens reference each other in a loop
    CycleError,
    /// A lower-tier token depends on a higher-tier token
    HierarchyInversion,
    /// Token matched no tier pattern
    UnknownTier,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::UnresolvedReferenceError => "UnresolvedReferenceError",
            DiagnosticKind::CycleError => "CycleError",
            DiagnosticKind::HierarchyInversion => "HierarchyInversion",
            DiagnosticKind::UnknownTier => "UnknownTier",
        }
    }

    pub fn all() -> &'static [DiagnosticKind] {
        &[
            DiagnosticKind::ParseError,
            DiagnosticKind::UnresolvedReferenceError,
            DiagnosticKind::CycleError,
            DiagnosticKind::HierarchyInversion,
            DiagnosticKind::UnknownTier,
        ]
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
    /// Token identifiers involved, e.g. the full path of a cycle
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            location,
            message: message.into(),
            path: Vec::new(),
        }
    }

    pub fn error(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, location, message)
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}: {}", self.severity, self.kind, self.location, self.message)
    }
}

/// Ordered collection of diagnostics from one analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Append another report, keeping its order
    pub fn merge(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Process exit status: non-zero when any error-severity diagnostic exists
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() { 1 } else { 0 }
    }

    /// Number of diagnostics per kind, in [`DiagnosticKind::all`] order, skipping zeros
    pub fn counts(&self) -> Vec<(DiagnosticKind, usize)> {
        DiagnosticKind::all()
            .iter()
            .map(|kind| (*kind, self.diagnostics.iter().filter(|d| d.kind == *kind).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Stamp the source file onto diagnostics that do not carry one yet
    pub fn set_file(&mut self, file: &str) {
        for diagnostic in &mut self.diagnostics {
            if diagnostic.location.file.is_none() {
                diagnostic.location.file = Some(file.to_string());
            }
        }
    }
}

impl IntoIterator for Report {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(severity: Severity, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic::new(severity, kind, Location::new(1), "message")
    }

    #[test]
    fn test_exit_code_follows_errors() {
        let mut report = Report::new();
        report.push(sample(Severity::Warning, DiagnosticKind::UnknownTier));
        assert_eq!(report.exit_code(), 0);

        report.push(sample(Severity::Error, DiagnosticKind::CycleError));
        assert!(report.has_errors());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_counts_skip_empty_kinds() {
        let mut report = Report::new();
        report.push(sample(Severity::Error, DiagnosticKind::ParseError));
        report.push(sample(Severity::Error, DiagnosticKind::ParseError));
        report.push(sample(Severity::Warning, DiagnosticKind::HierarchyInversion));

        assert_eq!(
            report.counts(),
            vec![(DiagnosticKind::ParseError, 2), (DiagnosticKind::HierarchyInversion, 1)]
        );
    }

    #[test]
    fn test_set_file_keeps_existing() {
        let mut report = Report::new();
        report.push(sample(Severity::Error, DiagnosticKind::ParseError));
        report.push(Diagnostic::error(
            DiagnosticKind::ParseError,
            Location::new(3).with_file("other.css"),
            "x",
        ));
        report.set_file("tokens.css");

        assert_eq!(report.diagnostics()[0].location.file.as_deref(), Some("tokens.css"));
        assert_eq!(report.diagnostics()[1].location.file.as_deref(), Some("other.css"));
    }

    #[test]
    fn test_json_shape() {
        let diagnostic = Diagnostic::error(DiagnosticKind::CycleError, Location::new(1).with_scope(":root"), "cycle")
            .with_path(vec!["a".into(), "b".into(), "a".into()]);
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["kind"], "CycleError");
        assert_eq!(json["location"]["scope"], ":root");
        assert_eq!(json["path"][2], "a");
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("Error".parse::<Severity>().unwrap(), Severity::Error);
        assert!("fatal".parse::<Severity>().is_err());
    }
}
