//! Pipeline - scan, build, classify, validate, resolve
//!
//! An [`Analyzer`] runs every stage over one source (or several sources
//! combined into one token set) and collects the findings into a single
//! [`Report`], ordered by stage.

use std::path::{Path, PathBuf};

use crossbeam::channel;

use crate::classify::TierClassifier;
use crate::config::TokenlintConfig;
use crate::diagnostic::Report;
use crate::graph::{GraphBuild, GraphStats, TokenGraph};
use crate::resolve::{ResolutionTable, ThemeResolver};
use crate::scanner::{scan, Declaration};
use crate::validate::{ValidationOptions, Validator};
use crate::{AnalysisMessage, Result};

/// Stylesheet text with a display name
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Everything learned about one token set
#[derive(Debug)]
pub struct Analysis {
    /// Source name; `None` for a combined analysis
    pub file: Option<String>,
    pub graph: TokenGraph,
    pub report: Report,
    pub resolution: ResolutionTable,
}

impl Analysis {
    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}

/// Runs the full lint pipeline with a fixed configuration
#[derive(Debug, Clone)]
pub struct Analyzer {
    classifier: TierClassifier,
    options: ValidationOptions,
    base_selectors: Vec<String>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            classifier: TierClassifier::default(),
            options: ValidationOptions::default(),
            base_selectors: vec![":root".to_string()],
        }
    }
}

impl Analyzer {
    pub fn from_config(config: &TokenlintConfig) -> Result<Self> {
        Ok(Self {
            classifier: TierClassifier::from_patterns(&config.tiers)?,
            options: ValidationOptions {
                hierarchy_inversion: config.severity.hierarchy_inversion,
                unknown_tier: config.severity.unknown_tier,
            },
            base_selectors: config.base_selectors.clone(),
        })
    }

    pub fn classifier(&self) -> &TierClassifier {
        &self.classifier
    }

    /// Analyze a single stylesheet
    pub fn analyze_source(&self, source: &SourceFile) -> Analysis {
        let mut analysis = self.analyze_sources(std::slice::from_ref(source));
        analysis.file = Some(source.name.clone());
        analysis
    }

    /// Analyze several stylesheets as one token set
    pub fn analyze_sources(&self, sources: &[SourceFile]) -> Analysis {
        let mut report = Report::new();
        let mut declarations: Vec<Declaration> = Vec::new();

        for source in sources {
            let scanned = scan(&source.text);
            let mut parse = Report::new();
            parse.extend(scanned.diagnostics);
            parse.set_file(&source.name);
            report.merge(parse);

            declarations.extend(scanned.declarations.into_iter().map(|mut decl| {
                decl.location.file = Some(source.name.clone());
                decl
            }));
        }
        tracing::debug!(sources = sources.len(), declarations = declarations.len(), "scanned");

        let GraphBuild { mut graph, diagnostics } = TokenGraph::build(declarations, &self.base_selectors);
        report.extend(diagnostics);

        self.classifier.classify_graph(&mut graph);
        report.extend(Validator::new(&graph, &self.classifier, self.options).run());

        let (resolution, unresolved) = ThemeResolver::new(&graph).resolve_all();
        report.extend(unresolved);

        tracing::debug!(
            tokens = graph.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "analysis complete"
        );

        Analysis {
            file: None,
            graph,
            report,
            resolution,
        }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let source = SourceFile::read(path)?;
        Ok(self.analyze_source(&source))
    }

    /// Analyze files independently on `jobs` worker threads.
    ///
    /// `on_message` sees each result as it arrives; the returned messages
    /// are in input order.
    pub fn analyze_files<F>(&self, paths: &[PathBuf], jobs: usize, mut on_message: F) -> Vec<AnalysisMessage>
    where
        F: FnMut(&AnalysisMessage),
    {
        let jobs = jobs.max(1).min(paths.len().max(1));
        let (work_tx, work_rx) = channel::unbounded::<(usize, &PathBuf)>();
        let (result_tx, result_rx) = channel::unbounded::<AnalysisMessage>();

        for job in paths.iter().enumerate() {
            // receiver is alive until the scope below ends
            let _ = work_tx.send(job);
        }
        drop(work_tx);

        let mut results: Vec<Option<AnalysisMessage>> = Vec::new();
        results.resize_with(paths.len(), || None);

        std::thread::scope(|scope| {
            for _ in 0..jobs {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, path) in work_rx {
                        let shown = path.display().to_string();
                        let message = match self.analyze_file(path) {
                            Ok(analysis) => AnalysisMessage::Analyzed {
                                index,
                                path: shown,
                                analysis: Box::new(analysis),
                            },
                            Err(e) => {
                                tracing::warn!("failed to analyze {}: {}", shown, e);
                                AnalysisMessage::Failed {
                                    index,
                                    path: shown,
                                    error: e.to_string(),
                                }
                            }
                        };
                        if result_tx.send(message).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for message in result_rx.iter() {
                on_message(&message);
                let index = message.index();
                results[index] = Some(message);
            }
        });

        results.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticKind, Severity};
    use crate::token::Tier;

    #[test]
    fn test_stage_order() {
        let source = SourceFile::new(
            "tokens.css",
            ":root {\n  --bad value;\n  --x: var(--y);\n  --a: var(--b);\n  --b: var(--a);\n  --color-neutral-0: var(--color-bg-primary);\n  --color-bg-primary: #fff;\n}",
        );
        let analysis = Analyzer::default().analyze_source(&source);
        let kinds: Vec<DiagnosticKind> = analysis.report.iter().map(|d| d.kind).collect();

        assert_eq!(kinds[0], DiagnosticKind::ParseError);
        assert_eq!(kinds[1], DiagnosticKind::UnresolvedReferenceError);
        assert_eq!(kinds[2], DiagnosticKind::CycleError);
        assert_eq!(kinds[3], DiagnosticKind::HierarchyInversion);
        assert!(kinds[4..].iter().all(|k| *k == DiagnosticKind::UnknownTier));
        assert!(analysis.report.iter().all(|d| d.location.file.as_deref() == Some("tokens.css")));
        assert_eq!(analysis.report.exit_code(), 1);
    }

    #[test]
    fn test_idempotent() {
        let source = SourceFile::new(
            "t.css",
            ":root { --a: var(--b); --b: var(--a); --c: var(--missing); }\n.dark { --c: 1px; }",
        );
        let analyzer = Analyzer::default();
        let first = analyzer.analyze_source(&source);
        let second = analyzer.analyze_source(&source);
        assert_eq!(first.report, second.report);
        assert_eq!(
            serde_json::to_string(&first.resolution).unwrap(),
            serde_json::to_string(&second.resolution).unwrap()
        );
    }

    #[test]
    fn test_combined_sources_share_tokens() {
        let primitives = SourceFile::new("primitives.css", ":root { --color-neutral-0: #fff; }");
        let semantic = SourceFile::new("semantic.css", ":root { --color-bg-primary: var(--color-neutral-0); }");

        let analyzer = Analyzer::default();
        let alone = analyzer.analyze_source(&semantic);
        assert_eq!(alone.report.of_kind(DiagnosticKind::UnresolvedReferenceError).len(), 1);

        let combined = analyzer.analyze_sources(&[primitives, semantic]);
        assert!(combined.report.is_empty());
        assert_eq!(combined.resolution.value(":root", "color-bg-primary"), Some("#fff"));
        let bg = combined.graph.lookup("color-bg-primary").unwrap();
        assert_eq!(combined.graph.token(bg).location.file.as_deref(), Some("semantic.css"));
        assert_eq!(combined.graph.tier(bg), Tier::Semantic);
    }

    #[test]
    fn test_config_severity_and_base_selectors() {
        let config = TokenlintConfig::from_toml_str(
            "base_selectors = [\"html\"]\n[severity]\nunknown_tier = \"error\"\n",
        )
        .unwrap();
        let analyzer = Analyzer::from_config(&config).unwrap();
        let analysis = analyzer.analyze_source(&SourceFile::new("t.css", "html { --brand: red; }"));

        assert_eq!(analysis.report.len(), 1);
        assert_eq!(analysis.report.diagnostics()[0].severity, Severity::Error);
        assert!(analysis.graph.node(analysis.graph.lookup("brand").unwrap()).scope.is_base());
    }

    #[test]
    fn test_invalid_config_pattern() {
        let config = TokenlintConfig::from_toml_str("[tiers]\nprimitive = [\"re:(\"]\n").unwrap();
        assert!(Analyzer::from_config(&config).is_err());
    }

    #[test]
    fn test_analyze_files_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for i in 0..6 {
            let path = dir.path().join(format!("t{}.css", i));
            std::fs::write(&path, format!(":root {{ --spacing-{}: {}px; }}", i, i)).unwrap();
            paths.push(path);
        }
        paths.push(dir.path().join("missing.css"));

        let mut seen = 0;
        let messages = Analyzer::default().analyze_files(&paths, 3, |_| seen += 1);
        assert_eq!(seen, 7);
        assert_eq!(messages.len(), 7);
        for (i, message) in messages.iter().enumerate() {
            assert_eq!(message.index(), i);
        }
        assert!(matches!(messages[6], AnalysisMessage::Failed { .. }));
        match &messages[2] {
            AnalysisMessage::Analyzed { analysis, .. } => {
                assert_eq!(analysis.resolution.value(":root", "spacing-2"), Some("2px"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
