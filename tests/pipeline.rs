use std::path::PathBuf;

use tokenlint::config::{load_config, write_config};
use tokenlint::ignore::collect_css_files;
use tokenlint::{
    AnalysisMessage, Analyzer, DiagnosticKind, Resolution, Severity, SourceFile, ThemeResolver, Tier, TokenlintConfig,
};

const TOKENS: &str = r#"
:root {
  --color-neutral-0: #ffffff;
  --color-neutral-900: #111111;
  --spacing-2: 8px;

  --color-bg-primary: var(--color-neutral-0);
  --color-text-primary: var(--color-neutral-900);
  --space-md: var(--spacing-2);

  --button-bg: var(--color-bg-primary);
  --button-padding: var(--space-md) calc(var(--space-md) * 2);
}

[data-theme="dark"] {
  --color-bg-primary: var(--color-neutral-900);
  --color-text-primary: var(--color-neutral-0);
}

@media (prefers-contrast: more) {
  [data-theme="dark"] {
    --color-text-primary: #ffffff;
  }
}
"#;

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn clean_token_set_has_no_diagnostics() {
    let analysis = Analyzer::default().analyze_source(&SourceFile::new("tokens.css", TOKENS));
    assert!(analysis.report.is_empty(), "{:?}", analysis.report);

    let bg = analysis.graph.lookup("button-bg").unwrap();
    assert_eq!(analysis.graph.tier(bg), Tier::Component);
    assert_eq!(analysis.graph.stats().primitive, 3);
}

#[test]
fn themes_resolve_per_scope() {
    let analysis = Analyzer::default().analyze_source(&SourceFile::new("tokens.css", TOKENS));
    let table = &analysis.resolution;

    assert_eq!(table.value(":root", "button-bg"), Some("#ffffff"));
    assert_eq!(table.value("[data-theme=\"dark\"]", "button-bg"), Some("#111111"));
    assert_eq!(table.value(":root", "button-padding"), Some("8px calc(8px * 2)"));

    let media = analysis
        .graph
        .scopes()
        .overrides()
        .find(|scope| scope.selector.starts_with("@media"))
        .map(|scope| scope.selector.clone())
        .unwrap();
    assert_eq!(table.value(&media, "color-text-primary"), Some("#ffffff"));
    // the media scope alone does not carry the dark theme
    assert_eq!(table.value(&media, "color-bg-primary"), Some("#ffffff"));

    let resolver = ThemeResolver::new(&analysis.graph);
    let scopes = resolver.scope_ids(&["[data-theme=\"dark\"]".to_string(), media]).unwrap();
    assert_eq!(resolver.resolve_in(&scopes, "color-bg-primary"), Resolution::Value("#111111".into()));
    assert_eq!(resolver.resolve_in(&scopes, "color-text-primary"), Resolution::Value("#ffffff".into()));
}

#[test]
fn every_finding_reported_in_one_pass() {
    let source = SourceFile::new(
        "broken.css",
        ":root {\n  --a: var(--b);\n  --b: var(--a);\n  --x: var(--y);\n  --color-neutral-900: var(--color-bg-primary);\n  --color-bg-primary: #fff;\n  --oops: ;\n}",
    );
    let report = Analyzer::default().analyze_source(&source).report;

    assert_eq!(report.of_kind(DiagnosticKind::CycleError).len(), 1);
    assert_eq!(report.of_kind(DiagnosticKind::UnresolvedReferenceError).len(), 1);
    assert_eq!(report.of_kind(DiagnosticKind::HierarchyInversion).len(), 1);
    assert!(report.has_errors());
    assert_eq!(report.exit_code(), 1);

    let cycle = report.of_kind(DiagnosticKind::CycleError)[0];
    assert_eq!(cycle.path, vec!["a", "b", "a"]);
    assert_eq!(cycle.location.file.as_deref(), Some("broken.css"));
}

#[test]
fn inversion_reported_for_undeclared_dependency() {
    let source = SourceFile::new("t.css", ":root{--color-neutral-900: var(--color-bg-primary);}");
    let report = Analyzer::default().analyze_source(&source).report;

    assert_eq!(report.of_kind(DiagnosticKind::UnresolvedReferenceError).len(), 1);
    let inversions = report.of_kind(DiagnosticKind::HierarchyInversion);
    assert_eq!(inversions.len(), 1);
    assert_eq!(inversions[0].path, vec!["color-neutral-900", "color-bg-primary"]);
}

#[test]
fn deep_chain_resolves() {
    let mut text = String::from(":root {\n");
    for i in (1..=3000).rev() {
        text.push_str(&format!("  --spacing-{}: var(--spacing-{});\n", i, i - 1));
    }
    text.push_str("  --spacing-0: 2px;\n}");

    let analysis = Analyzer::default().analyze_source(&SourceFile::new("deep.css", &text));
    assert!(analysis.report.is_empty(), "{:?}", analysis.report);
    assert_eq!(analysis.resolution.value(":root", "spacing-3000"), Some("2px"));
}

#[test]
fn directory_run_matches_single_file_runs() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir, "styles/tokens.css", TOKENS);
    write(&dir, "styles/broken.css", ":root { --x: var(--y); }");
    write(&dir, "dist/bundle.css", ":root { --x: var(--x); }");

    let files = collect_css_files(&[dir.path().to_path_buf()], &[]).unwrap();
    assert_eq!(files.len(), 2);

    let analyzer = Analyzer::default();
    let messages = analyzer.analyze_files(&files, 4, |_| {});
    for (message, file) in messages.iter().zip(&files) {
        let AnalysisMessage::Analyzed { analysis, .. } = message else {
            panic!("analysis failed for {}", file.display());
        };
        let single = analyzer.analyze_file(file).unwrap();
        assert_eq!(analysis.report, single.report);
    }
}

#[test]
fn combined_files_resolve_across_sources() {
    let dir = tempfile::tempdir().unwrap();
    let primitives = write(&dir, "primitives.css", ":root { --color-neutral-0: #fafafa; }");
    let semantic = write(&dir, "semantic.css", ":root { --color-bg-primary: var(--color-neutral-0); }");

    let sources: Vec<SourceFile> = [primitives, semantic].iter().map(|p| SourceFile::read(p).unwrap()).collect();
    let analysis = Analyzer::default().analyze_sources(&sources);
    assert!(analysis.file.is_none());
    assert!(analysis.report.is_empty());
    assert_eq!(analysis.resolution.value(":root", "color-bg-primary"), Some("#fafafa"));
}

#[test]
fn config_drives_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokenlint.toml");
    write_config(&path, &TokenlintConfig::default(), false).unwrap();

    let mut config = load_config(Some(&path)).unwrap().unwrap();
    config.severity.hierarchy_inversion = Severity::Error;
    config.tiers.semantic.push("re:^brand-".to_string());

    let analyzer = Analyzer::from_config(&config).unwrap();
    let analysis = analyzer.analyze_source(&SourceFile::new(
        "t.css",
        ":root { --brand-primary: #f00; --color-red-500: var(--brand-primary); }",
    ));

    let inversions = analysis.report.of_kind(DiagnosticKind::HierarchyInversion);
    assert_eq!(inversions.len(), 1);
    assert_eq!(inversions[0].severity, Severity::Error);
}

#[test]
fn analysis_is_idempotent() {
    let analyzer = Analyzer::default();
    let source = SourceFile::new("tokens.css", TOKENS);
    let first = analyzer.analyze_source(&source);
    let second = analyzer.analyze_source(&source);

    assert_eq!(first.report, second.report);
    assert_eq!(
        serde_json::to_value(&first.resolution).unwrap(),
        serde_json::to_value(&second.resolution).unwrap()
    );
}
