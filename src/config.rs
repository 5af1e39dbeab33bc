use crate::diagnostic::Severity;
use crate::token::Tier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenlintConfig {
    /// Selectors treated as the unconditional base scope
    pub base_selectors: Vec<String>,
    /// Extra gitignore-style patterns excluded from directory walks
    pub exclude: Vec<String>,
    pub tiers: TierPatterns,
    pub severity: SeverityConfig,
}

impl Default for TokenlintConfig {
    fn default() -> Self {
        Self {
            base_selectors: vec![":root".to_string()],
            exclude: Vec::new(),
            tiers: TierPatterns::default(),
            severity: SeverityConfig::default(),
        }
    }
}

impl TokenlintConfig {
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Ordered naming patterns per tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPatterns {
    pub primitive: Vec<String>,
    pub semantic: Vec<String>,
    pub component: Vec<String>,
}

impl TierPatterns {
    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Primitive => &self.primitive,
            Tier::Semantic => &self.semantic,
            Tier::Component => &self.component,
            Tier::Unknown => &[],
        }
    }
}

fn strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

impl Default for TierPatterns {
    fn default() -> Self {
        Self {
            primitive: strings(&[
                "color-*-[0-9]*",
                "color-white",
                "color-black",
                "spacing-*",
                "size-*",
                "font-family-*",
                "font-size-*",
                "font-weight-*",
                "line-height-*",
                "radius-*",
                "shadow-[0-9]*",
                "duration-*",
                "easing-*",
            ]),
            semantic: strings(&[
                "color-bg-*",
                "color-text-*",
                "color-border-*",
                "color-surface-*",
                "color-accent-*",
                "color-status-*",
                "space-*",
                "text-*",
                "elevation-*",
                "motion-*",
            ]),
            component: strings(&[
                "button-*",
                "card-*",
                "input-*",
                "modal-*",
                "badge-*",
                "nav-*",
                "tooltip-*",
                "table-*",
            ]),
        }
    }
}

/// Configurable severities for lint findings that default to warnings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub hierarchy_inversion: Severity,
    pub unknown_tier: Severity,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            hierarchy_inversion: Severity::Warning,
            unknown_tier: Severity::Warning,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tokenlint.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TokenlintConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config = TokenlintConfig::from_toml_str(&contents)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TokenlintConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
