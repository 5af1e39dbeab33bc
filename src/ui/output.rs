use crate::diagnostic::{Diagnostic, Report};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim).to_string()
}

pub fn file_modified(path: &str) {
    println!("{} {}", Icons::MOD.style(theme().warn), path);
}

pub fn file_deleted(path: &str) {
    println!("{} {}", Icons::DEL.style(theme().error), path);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim), value);
}

/// Render one diagnostic as `severity[kind] location: message`
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = diagnostic.severity.to_string();
    let mut line = format!(
        "{}[{}] {}: {}",
        severity.style(theme().severity(diagnostic.severity)),
        diagnostic.kind,
        diagnostic.location.to_string().style(theme().muted),
        diagnostic.message
    );
    if diagnostic.path.len() > 2 {
        let path: Vec<String> = diagnostic.path.iter().map(|n| format!("--{}", n)).collect();
        line.push_str(&format!("\n    {} {}", Icons::LINK, dim(&path.join(" → "))));
    }
    line
}

pub fn diagnostic(diagnostic: &Diagnostic) {
    println!("{}", format_diagnostic(diagnostic));
}

/// Totals line plus a per-kind breakdown
pub fn report_summary(report: &Report) {
    if report.is_empty() {
        success("No problems found");
        return;
    }

    let totals = format!("{} errors, {} warnings", report.error_count(), report.warning_count());
    if report.has_errors() {
        error(&totals);
    } else {
        warn(&totals);
    }
    for (kind, count) in report.counts() {
        summary_row(kind.as_str(), &count.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::token::Location;

    #[test]
    fn test_format_cycle_diagnostic() {
        let diagnostic = Diagnostic::error(
            DiagnosticKind::CycleError,
            Location::new(3).with_file("t.css"),
            "reference cycle: --a → --b → --a",
        )
        .with_path(vec!["a".into(), "b".into(), "a".into()]);

        let rendered = format_diagnostic(&diagnostic);
        assert!(rendered.contains("CycleError"));
        assert!(rendered.contains("t.css:3"));
        assert!(rendered.contains("--a → --b → --a"));
        assert_eq!(rendered.lines().count(), 2);
    }
}
