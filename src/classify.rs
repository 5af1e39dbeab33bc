//! Tier Classifier - naming conventions to tiers
//!
//! Each tier owns an ordered list of patterns. Tiers are tried in rank
//! order (primitive, semantic, component) and the first matching pattern
//! wins; identifiers matching nothing are `Unknown`. An explicit
//! `/* @tier ... */` annotation on the backing declaration takes precedence.
//!
//! Patterns are globs (`color-*-[0-9]*`) unless prefixed with `re:`, in
//! which case the remainder is a regular expression.

use crate::config::TierPatterns;
use crate::graph::{NodeId, TokenGraph};
use crate::token::Tier;
use crate::{Error, Result};

/// A compiled identifier pattern
#[derive(Debug, Clone)]
pub enum TierMatcher {
    Glob(glob::Pattern),
    Regex(regex::Regex),
}

impl TierMatcher {
    /// Compile a pattern string; a leading `--` is ignored
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if let Some(expr) = pattern.strip_prefix("re:") {
            let expr = expr.trim();
            let expr = expr.strip_prefix("^--").map(|rest| format!("^{}", rest)).unwrap_or_else(|| expr.to_string());
            return regex::Regex::new(&expr)
                .map(TierMatcher::Regex)
                .map_err(|e| invalid(e.to_string()));
        }

        let glob = pattern.trim();
        let glob = glob.strip_prefix("--").unwrap_or(glob);
        if glob.is_empty() {
            return Err(invalid("empty pattern".to_string()));
        }
        glob::Pattern::new(glob)
            .map(TierMatcher::Glob)
            .map_err(|e| invalid(e.to_string()))
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            TierMatcher::Glob(pattern) => pattern.matches(name),
            TierMatcher::Regex(regex) => regex.is_match(name),
        }
    }
}

/// One classification rule
#[derive(Debug, Clone)]
pub struct TierRule {
    pub tier: Tier,
    pub matcher: TierMatcher,
    /// Pattern as written in the configuration
    pub source: String,
}

/// Ordered, first-match-wins tier classifier
#[derive(Debug, Clone)]
pub struct TierClassifier {
    rules: Vec<TierRule>,
}

impl TierClassifier {
    pub fn new(rules: Vec<TierRule>) -> Self {
        Self { rules }
    }

    /// Compile the per-tier pattern lists from configuration
    pub fn from_patterns(patterns: &TierPatterns) -> Result<Self> {
        let mut rules = Vec::new();
        for tier in Tier::ranked() {
            for source in patterns.for_tier(*tier) {
                rules.push(TierRule {
                    tier: *tier,
                    matcher: TierMatcher::parse(source)?,
                    source: source.clone(),
                });
            }
        }
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.rules
    }

    /// The rule that classifies `name`, if any
    pub fn matching_rule(&self, name: &str) -> Option<&TierRule> {
        let name = name.strip_prefix("--").unwrap_or(name);
        self.rules.iter().find(|rule| rule.matcher.is_match(name))
    }

    /// Classify an identifier by naming pattern alone
    pub fn classify(&self, name: &str) -> Tier {
        self.matching_rule(name).map(|rule| rule.tier).unwrap_or(Tier::Unknown)
    }

    /// Assign a tier to every node, preferring explicit annotations
    pub fn classify_graph(&self, graph: &mut TokenGraph) {
        for n in 0..graph.len() {
            let id = NodeId(n as u32);
            let declaration = graph.node(id).declaration;
            let tier = graph
                .declaration(declaration)
                .annotation
                .unwrap_or_else(|| self.classify(graph.name(id)));
            graph.set_tier(id, tier);
        }
    }
}

impl Default for TierClassifier {
    fn default() -> Self {
        let compiled = Self::from_patterns(&TierPatterns::default());
        debug_assert!(compiled.is_ok(), "built-in tier patterns failed to compile: {:?}", compiled.as_ref().err());
        compiled.unwrap_or_else(|e| {
            tracing::error!("built-in tier patterns failed to compile: {}", e);
            Self::new(Vec::new())
        })
    }
}
