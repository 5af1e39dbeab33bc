use crate::{emit_json, emit_success, OutputMode};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenlint::config::{default_config_path, write_config, TokenlintConfig};
use tokenlint::ignore::collect_css_files;
use tokenlint::resolve::ResolvedToken;
use tokenlint::ui::{self, Icons, ProgressManager, ProgressMessage, Spinner};
use tokenlint::watcher::{WatchEvent, Watcher};
use tokenlint::{Analysis, AnalysisMessage, Analyzer, Report, SourceFile, ThemeResolver};

pub struct Context {
    pub config: TokenlintConfig,
    pub output: OutputMode,
}

impl Context {
    pub fn new(config: TokenlintConfig, output: OutputMode) -> Self {
        Self { config, output }
    }

    fn decorate(&self) -> bool {
        self.output.is_human() && !tokenlint::output::is_quiet()
    }
}

fn label(analysis: &Analysis, files: usize) -> String {
    analysis
        .file
        .clone()
        .unwrap_or_else(|| format!("combined ({} files)", files))
}

fn read_sources(files: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
    Ok(files.iter().map(|f| SourceFile::read(f)).collect::<tokenlint::Result<Vec<_>>>()?)
}

/// One analysis per file, or one over all files when `combined`
fn analyze(analyzer: &Analyzer, files: &[PathBuf], combined: bool) -> anyhow::Result<Vec<Analysis>> {
    if combined {
        return Ok(vec![analyzer.analyze_sources(&read_sources(files)?)]);
    }
    files
        .iter()
        .map(|f| Ok(analyzer.analyze_file(f)?))
        .collect()
}

fn collect(ctx: &Context, paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let files = collect_css_files(paths, &ctx.config.exclude)?;
    if files.is_empty() && ctx.output.is_human() {
        ui::warn("No stylesheets found");
    }
    Ok(files)
}

fn print_analysis(analysis: &Analysis, files: usize) {
    if analysis.report.is_empty() {
        return;
    }
    ui::section(&label(analysis, files));
    for diagnostic in analysis.report.iter() {
        ui::diagnostic(diagnostic);
    }
}

fn analysis_json(analysis: &Analysis, files: usize) -> serde_json::Value {
    serde_json::json!({
        "file": label(analysis, files),
        "stats": analysis.stats(),
        "diagnostics": analysis.report.diagnostics(),
    })
}

pub fn run_check(ctx: &Context, paths: &[PathBuf], jobs: usize, combined: bool, watch: bool) -> anyhow::Result<i32> {
    let files = collect(ctx, paths)?;
    let analyzer = Analyzer::from_config(&ctx.config)?;
    let start = Instant::now();

    if ctx.decorate() {
        ui::header(&format!("Linting {} stylesheets", files.len()));
    }

    let mut analyses: Vec<Analysis> = Vec::new();
    let mut failed: Vec<(String, String)> = Vec::new();
    let mut progress: Option<ProgressManager> = None;

    if combined {
        if !files.is_empty() {
            analyses.push(analyzer.analyze_sources(&read_sources(&files)?));
        }
    } else {
        let (mut manager, tx) = ProgressManager::new(files.len());
        tx.send(ProgressMessage::Started { total: files.len() }).ok();

        let messages = analyzer.analyze_files(&files, jobs, |message| {
            let event = match message {
                AnalysisMessage::Analyzed { path, analysis, .. } => ProgressMessage::Analyzed {
                    file: path.clone(),
                    errors: analysis.report.error_count(),
                    warnings: analysis.report.warning_count(),
                },
                AnalysisMessage::Failed { path, .. } => ProgressMessage::Failed { file: path.clone() },
            };
            tx.send(event).ok();
        });
        tx.send(ProgressMessage::Finished).ok();
        manager.join();
        progress = Some(manager);

        for message in messages {
            match message {
                AnalysisMessage::Analyzed { analysis, .. } => analyses.push(*analysis),
                AnalysisMessage::Failed { path, error, .. } => failed.push((path, error)),
            }
        }
    }

    let mut total = Report::new();
    for analysis in &analyses {
        total.extend(analysis.report.iter().cloned());
    }
    let ok = !total.has_errors() && failed.is_empty();

    if ctx.output.is_human() {
        for analysis in &analyses {
            print_analysis(analysis, files.len());
        }
        for (path, error) in &failed {
            ui::error(&format!("{}: {}", path, error));
        }
        if !tokenlint::output::is_quiet() {
            println!();
            ui::report_summary(&total);
        }
        let tokens: usize = analyses.iter().map(|a| a.graph.len()).sum();
        match progress.as_mut() {
            Some(manager) => manager.finish_with_summary(start.elapsed(), files.len(), tokens),
            None if !tokenlint::output::is_quiet() => {
                ui::summary_row("Files", &files.len().to_string());
                ui::summary_row("Tokens", &tokens.to_string());
                ui::summary_row("Time", &format!("{:.2?}", start.elapsed()));
            }
            None => {}
        }
    } else {
        let failed_json: Vec<serde_json::Value> = failed
            .iter()
            .map(|(path, error)| serde_json::json!({ "file": path, "error": error }))
            .collect();
        emit_json(
            "check",
            ok,
            serde_json::json!({
                "files": analyses.iter().map(|a| analysis_json(a, files.len())).collect::<Vec<_>>(),
                "failed": failed_json,
                "errors": total.error_count(),
                "warnings": total.warning_count(),
            }),
        )?;
    }

    if watch {
        run_watch(ctx, &analyzer, paths, &files, combined)?;
    }

    Ok(if ok { 0 } else { 1 })
}

fn run_watch(
    ctx: &Context,
    analyzer: &Analyzer,
    paths: &[PathBuf],
    files: &[PathBuf],
    combined: bool,
) -> anyhow::Result<()> {
    let mut watcher = Watcher::new(paths, &ctx.config.exclude);
    watcher.prime(files);

    let spinner = Spinner::new(&format!("{} Watching for changes...", Icons::EYE));

    watcher.run(|event| {
        spinner.suspend(|| match event {
            WatchEvent::Removed(path) => {
                if ctx.output.is_human() {
                    ui::file_deleted(&path.display().to_string());
                }
            }
            WatchEvent::Changed(path) => {
                if ctx.output.is_human() {
                    ui::file_modified(&path.display().to_string());
                }
                if let Err(e) = relint(ctx, analyzer, paths, path, combined) {
                    ui::error(&format!("{}: {}", path.display(), e));
                }
            }
        });
    })?;

    spinner.finish_with_message("Stopped watching");
    Ok(())
}

fn relint(ctx: &Context, analyzer: &Analyzer, paths: &[PathBuf], changed: &Path, combined: bool) -> anyhow::Result<()> {
    let (analysis, files) = if combined {
        let files = collect_css_files(paths, &ctx.config.exclude)?;
        (analyzer.analyze_sources(&read_sources(&files)?), files.len())
    } else {
        (analyzer.analyze_file(changed)?, 1)
    };

    if ctx.output.is_human() {
        print_analysis(&analysis, files);
        ui::report_summary(&analysis.report);
    } else {
        emit_json("check", !analysis.report.has_errors(), serde_json::json!({
            "files": [analysis_json(&analysis, files)],
            "failed": [],
            "errors": analysis.report.error_count(),
            "warnings": analysis.report.warning_count(),
        }))?;
    }
    Ok(())
}

pub fn run_resolve(
    ctx: &Context,
    paths: &[PathBuf],
    scopes: &[String],
    token: Option<&str>,
    combined: bool,
) -> anyhow::Result<i32> {
    let files = collect(ctx, paths)?;
    let analyzer = Analyzer::from_config(&ctx.config)?;
    let analyses = analyze(&analyzer, &files, combined)?;
    let wanted = token.map(|t| t.strip_prefix("--").unwrap_or(t));

    let mut results = Vec::new();
    for analysis in &analyses {
        let resolver = ThemeResolver::new(&analysis.graph);
        let table = if scopes.is_empty() {
            analysis.resolution.clone()
        } else {
            match resolver.scope_ids(scopes) {
                Ok(ids) => resolver.resolve_composed(&ids),
                Err(e) if !combined => {
                    tracing::debug!("skipping {}: {}", label(analysis, files.len()), e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let rows: Vec<ResolvedToken> = table
            .iter()
            .filter(|entry| wanted.is_none_or(|t| entry.name == t))
            .cloned()
            .collect();
        if rows.is_empty() {
            continue;
        }
        results.push((label(analysis, files.len()), table, rows));
    }

    if let Some(name) = token {
        if results.is_empty() {
            anyhow::bail!("token {} not found", name);
        }
    } else if results.is_empty() && !scopes.is_empty() {
        anyhow::bail!("no stylesheet declares scope {}", scopes.join(" + "));
    }

    if ctx.output.is_human() {
        for (file, table, _) in &results {
            ui::section(file);
            println!("{}", ui::resolution_table(table, token));
        }
    } else {
        let data: Vec<serde_json::Value> = results
            .iter()
            .map(|(file, _, rows)| serde_json::json!({ "file": file, "tokens": rows }))
            .collect();
        emit_success(ctx.output, "resolve", serde_json::json!({ "results": data }))?;
    }
    Ok(0)
}

pub fn run_tiers(ctx: &Context, paths: &[PathBuf], combined: bool) -> anyhow::Result<i32> {
    let files = collect(ctx, paths)?;
    let analyzer = Analyzer::from_config(&ctx.config)?;
    let analyses = analyze(&analyzer, &files, combined)?;

    if ctx.output.is_human() {
        for analysis in &analyses {
            if analysis.graph.is_empty() {
                continue;
            }
            ui::section(&label(analysis, files.len()));
            println!("{}", ui::tier_table(&analysis.graph, analyzer.classifier()));
            let stats = analysis.stats();
            let rows = [
                ("primitive", stats.primitive.to_string()),
                ("semantic", stats.semantic.to_string()),
                ("component", stats.component.to_string()),
                ("unknown", stats.unknown.to_string()),
            ];
            let rows: Vec<(&str, &str)> = rows.iter().map(|(k, v)| (*k, v.as_str())).collect();
            println!("{}", ui::stats_table(&rows));
        }
    } else {
        let data: Vec<serde_json::Value> = analyses
            .iter()
            .map(|analysis| {
                let tokens: Vec<serde_json::Value> = analysis
                    .graph
                    .nodes()
                    .iter()
                    .map(|node| {
                        serde_json::json!({
                            "name": node.token.name,
                            "tier": node.token.tier,
                            "source": ui::table::tier_source(&analysis.graph, analyzer.classifier(), &node.token.name),
                            "location": node.token.location,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "file": label(analysis, files.len()),
                    "tokens": tokens,
                    "stats": analysis.stats(),
                })
            })
            .collect();
        emit_success(ctx.output, "tiers", serde_json::json!({ "results": data }))?;
    }
    Ok(0)
}

pub fn run_init(path: Option<&Path>, force: bool, output_mode: OutputMode) -> anyhow::Result<i32> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    write_config(&path, &TokenlintConfig::default(), force)?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "path": path.display().to_string() }))?;
    }
    Ok(0)
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<i32> {
    if output_mode.is_human() {
        println!(
            "{} {}",
            "tokenlint".bold().style(ui::theme().info),
            format!("Version {}", env!("CARGO_PKG_VERSION")).bold()
        );
    } else {
        emit_success(output_mode, "version", serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))?;
    }
    Ok(0)
}
