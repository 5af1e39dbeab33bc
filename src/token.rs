//! Token types - tiered design tokens
//!
//! Every custom property is assigned one of four tiers:
//! - `Primitive`: raw design value with no context (`--color-neutral-900: #111`)
//! - `Semantic`: meaning assigned by reference (`--color-bg-primary`)
//! - `Component`: usage scoped to one UI component (`--button-bg`)
//! - `Unknown`: matched no tier pattern and carries no annotation
//!
//! References must flow downward: component → semantic → primitive.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token tiers, ordered primitive < semantic < component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Raw palette, scale and font values
    Primitive,
    /// Purpose-named aliases of primitives
    Semantic,
    /// Values consumed by a single component
    Component,
    /// Not classified
    Unknown,
}

impl Tier {
    /// Get the string representation of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primitive => "primitive",
            Tier::Semantic => "semantic",
            Tier::Component => "component",
            Tier::Unknown => "unknown",
        }
    }

    /// Get all tiers
    pub fn all() -> &'static [Tier] {
        &[Tier::Primitive, Tier::Semantic, Tier::Component, Tier::Unknown]
    }

    /// Tiers that take part in hierarchy checks, lowest first
    pub fn ranked() -> &'static [Tier] {
        &[Tier::Primitive, Tier::Semantic, Tier::Component]
    }

    /// Position in the hierarchy; `None` for `Unknown`
    pub fn rank(&self) -> Option<u8> {
        match self {
            Tier::Primitive => Some(0),
            Tier::Semantic => Some(1),
            Tier::Component => Some(2),
            Tier::Unknown => None,
        }
    }

    /// Check whether a token of this tier may reference a token of `dependency`'s tier.
    ///
    /// `Unknown` on either side is exempt and always allowed.
    pub fn may_reference(&self, dependency: Tier) -> bool {
        match (self.rank(), dependency.rank()) {
            (Some(consumer), Some(dependency)) => consumer >= dependency,
            _ => true,
        }
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "primitive" | "base" | "core" | "global" => Ok(Tier::Primitive),
            "semantic" | "alias" | "system" => Ok(Tier::Semantic),
            "component" | "comp" => Ok(Tier::Component),
            "unknown" => Ok(Tier::Unknown),
            _ => Err(Error::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a declaration or diagnostic originates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Source file, when the input came from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Selector context of the declaration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// 1-indexed line number
    pub line: usize,
}

impl Location {
    pub fn new(line: usize) -> Self {
        Self {
            file: None,
            scope: None,
            line,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line)?,
            None => write!(f, "line {}", self.line)?,
        }
        if let Some(scope) = &self.scope {
            write!(f, " ({})", scope)?;
        }
        Ok(())
    }
}

/// A design token: the node payload of the reference graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Identifier without the leading `--`
    pub name: String,
    /// Raw declared value, may contain `var()` references
    pub value: String,
    /// Assigned tier
    pub tier: Tier,
    /// Location of the declaration backing this token
    pub location: Location,
}

impl Token {
    pub fn new(name: impl Into<String>, value: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            tier: Tier::Unknown,
            location,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Token {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for tier in Tier::all() {
            let parsed: Tier = tier.as_str().parse().unwrap();
            assert_eq!(*tier, parsed);
        }
    }

    #[test]
    fn test_tier_aliases() {
        assert_eq!(Tier::from_str("core").unwrap(), Tier::Primitive);
        assert_eq!(Tier::from_str("Alias").unwrap(), Tier::Semantic);
        assert_eq!(Tier::from_str("comp").unwrap(), Tier::Component);
        assert!(Tier::from_str("decorative").is_err());
    }

    #[test]
    fn test_may_reference() {
        assert!(Tier::Semantic.may_reference(Tier::Primitive));
        assert!(Tier::Component.may_reference(Tier::Semantic));
        assert!(Tier::Primitive.may_reference(Tier::Primitive));
        assert!(!Tier::Primitive.may_reference(Tier::Semantic));
        assert!(!Tier::Semantic.may_reference(Tier::Component));
        assert!(Tier::Unknown.may_reference(Tier::Component));
        assert!(Tier::Primitive.may_reference(Tier::Unknown));
    }

    #[test]
    fn test_location_display() {
        let location = Location::new(4).with_file("tokens.css").with_scope(":root");
        assert_eq!(location.to_string(), "tokens.css:4 (:root)");
        assert_eq!(Location::new(2).to_string(), "line 2");
    }
}
