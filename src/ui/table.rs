use crate::classify::TierClassifier;
use crate::graph::TokenGraph;
use crate::resolve::ResolutionTable;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct ResolutionRow {
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render resolved values, optionally limited to one token
pub fn resolution_table(table: &ResolutionTable, token: Option<&str>) -> String {
    let token = token.map(|t| t.strip_prefix("--").unwrap_or(t));
    let rows: Vec<ResolutionRow> = table
        .iter()
        .filter(|entry| token.is_none_or(|t| entry.name == t))
        .map(|entry| ResolutionRow {
            scope: entry.scope.clone(),
            token: format!("--{}", entry.name),
            value: entry.resolution.to_string(),
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Declared")]
    declared: String,
}

/// What decided a token's tier: an annotation, a pattern, or nothing
pub fn tier_source(graph: &TokenGraph, classifier: &TierClassifier, name: &str) -> String {
    let annotated = graph
        .lookup(name)
        .and_then(|id| graph.declaration(graph.node(id).declaration).annotation)
        .is_some();
    if annotated {
        return "@tier annotation".to_string();
    }
    classifier
        .matching_rule(name)
        .map(|rule| rule.source.clone())
        .unwrap_or_else(|| "-".to_string())
}

/// Render each token's tier and where it came from
pub fn tier_table(graph: &TokenGraph, classifier: &TierClassifier) -> String {
    let rows: Vec<TierRow> = graph
        .nodes()
        .iter()
        .map(|node| TierRow {
            token: format!("--{}", node.token.name),
            tier: node.token.tier.to_string(),
            source: tier_source(graph, classifier, &node.token.name),
            declared: node.token.location.to_string(),
        })
        .collect();

    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Analyzer, SourceFile};

    #[test]
    fn test_resolution_table_filters_token() {
        let analysis = Analyzer::default().analyze_source(&SourceFile::new(
            "t.css",
            ":root { --spacing-1: 4px; --space-sm: var(--spacing-1); }",
        ));
        let rendered = resolution_table(&analysis.resolution, Some("--space-sm"));
        assert!(rendered.contains("--space-sm"));
        assert!(rendered.contains("4px"));
        assert!(!rendered.contains("--spacing-1 "));
        assert!(resolution_table(&analysis.resolution, Some("nope")).is_empty());
    }

    #[test]
    fn test_tier_table_sources() {
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze_source(&SourceFile::new(
            "t.css",
            ":root {\n  /* @tier semantic */\n  --brand: red;\n  --button-bg: var(--brand);\n  --misc: 1;\n}",
        ));
        let classifier = analyzer.classifier();
        assert_eq!(tier_source(&analysis.graph, classifier, "brand"), "@tier annotation");
        assert_eq!(tier_source(&analysis.graph, classifier, "button-bg"), "button-*");
        assert_eq!(tier_source(&analysis.graph, classifier, "misc"), "-");

        let rendered = tier_table(&analysis.graph, classifier);
        assert!(rendered.contains("--button-bg"));
        assert!(rendered.contains("component"));
    }

    #[test]
    fn test_stats_table() {
        let rendered = stats_table(&[("Tokens", "3")]);
        assert!(rendered.contains("Metric"));
        assert!(rendered.contains("Tokens"));
        assert!(stats_table(&[]).is_empty());
    }
}
