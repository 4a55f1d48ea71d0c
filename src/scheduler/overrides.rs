//! Priority override rules
//!
//! Overrides scale a topic's pass count by matching keywords in its title.
//! Rules are plain data (pattern, multiplier, scope) so they can be loaded
//! from configuration and tested without running the scheduler.
//!
//! Multipliers above 1.0 amplify high-yield recurring topics; multipliers
//! below 1.0 suppress low-yield or near-duplicate ones. When several rules
//! match, their multipliers are applied in declaration order.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};
use crate::models::ComplexityTier;
use crate::utils::normalize_title;

// ============================================================================
// Rule Definitions
// ============================================================================

/// How a rule pattern is compared with a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Pattern appears anywhere in the normalized title
    #[default]
    Substring,
    /// Pattern appears as whole words
    Keyword,
}

/// Which topics a rule may apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideScope {
    #[default]
    All,
    Tier(ComplexityTier),
}

impl OverrideScope {
    fn includes(&self, tier: ComplexityTier) -> bool {
        match self {
            Self::All => true,
            Self::Tier(t) => *t == tier,
        }
    }
}

/// A single (pattern, multiplier, scope) override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub pattern: String,
    pub multiplier: f64,

    #[serde(default)]
    pub scope: OverrideScope,

    #[serde(default)]
    pub match_mode: MatchMode,
}

impl OverrideRule {
    pub fn new(pattern: impl Into<String>, multiplier: f64) -> Self {
        Self {
            pattern: pattern.into(),
            multiplier,
            scope: OverrideScope::All,
            match_mode: MatchMode::Substring,
        }
    }

    pub fn with_scope(mut self, scope: OverrideScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }
}

// ============================================================================
// Override Table
// ============================================================================

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: OverrideRule,
    needle: String,
    keyword_re: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: OverrideRule) -> SchedulerResult<Self> {
        if !rule.multiplier.is_finite() || rule.multiplier <= 0.0 {
            return Err(SchedulerError::invalid_override(
                &rule.pattern,
                format!("multiplier must be a positive number, got {}", rule.multiplier),
            ));
        }

        let needle = normalize_title(&rule.pattern);
        if needle.is_empty() {
            return Err(SchedulerError::invalid_override(&rule.pattern, "pattern is empty"));
        }

        let keyword_re = match rule.match_mode {
            MatchMode::Substring => None,
            MatchMode::Keyword => {
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(&needle)))
                    .map_err(|e| SchedulerError::invalid_override(&rule.pattern, e.to_string()))?;
                Some(re)
            }
        };

        Ok(Self {
            rule,
            needle,
            keyword_re,
        })
    }

    fn matches(&self, normalized_title: &str, tier: ComplexityTier) -> bool {
        if !self.rule.scope.includes(tier) {
            return false;
        }
        match &self.keyword_re {
            Some(re) => re.is_match(normalized_title),
            None => normalized_title.contains(&self.needle),
        }
    }
}

/// Validated, ordered set of override rules
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    rules: Vec<CompiledRule>,
}

impl OverrideTable {
    /// Compile rules, keeping declaration order
    pub fn new(rules: impl IntoIterator<Item = OverrideRule>) -> SchedulerResult<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<SchedulerResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules matching a title, in declaration order
    pub fn matching_rules(&self, title: &str, tier: ComplexityTier) -> Vec<&OverrideRule> {
        let normalized = normalize_title(title);
        self.rules
            .iter()
            .filter(|r| r.matches(&normalized, tier))
            .map(|r| &r.rule)
            .collect()
    }

    /// Combined multiplier for a title, 1.0 when nothing matches
    pub fn multiplier_for(&self, title: &str, tier: ComplexityTier) -> f64 {
        self.matching_rules(title, tier)
            .iter()
            .fold(1.0, |acc, rule| acc * rule.multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rules_gives_unit_multiplier() {
        let table = OverrideTable::default();
        assert!(table.is_empty());
        assert_eq!(table.multiplier_for("Anything", ComplexityTier::Low), 1.0);
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let table = OverrideTable::new(vec![OverrideRule::new("Thermo", 2.0)]).unwrap();
        assert_eq!(table.multiplier_for("THERMODYNAMICS basics", ComplexityTier::High), 2.0);
        assert_eq!(table.multiplier_for("Kinetics", ComplexityTier::High), 1.0);
    }

    #[test]
    fn test_keyword_requires_whole_word() {
        let table = OverrideTable::new(vec![
            OverrideRule::new("acid", 3.0).with_match_mode(MatchMode::Keyword)
        ])
        .unwrap();
        assert_eq!(table.multiplier_for("Acid-Base Equilibria", ComplexityTier::Medium), 3.0);
        assert_eq!(table.multiplier_for("Amino acids", ComplexityTier::Medium), 1.0);
    }

    #[test]
    fn test_multipliers_compose() {
        let table = OverrideTable::new(vec![
            OverrideRule::new("review", 0.5),
            OverrideRule::new("cardiology", 3.0),
        ])
        .unwrap();
        let title = "Cardiology review";
        assert_eq!(table.matching_rules(title, ComplexityTier::High).len(), 2);
        assert!((table.multiplier_for(title, ComplexityTier::High) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_scope_limits_tier() {
        let table = OverrideTable::new(vec![OverrideRule::new("essay", 2.0)
            .with_scope(OverrideScope::Tier(ComplexityTier::High))])
        .unwrap();
        assert_eq!(table.multiplier_for("Essay writing", ComplexityTier::High), 2.0);
        assert_eq!(table.multiplier_for("Essay writing", ComplexityTier::Low), 1.0);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let zero = OverrideTable::new(vec![OverrideRule::new("x", 0.0)]).unwrap_err();
        assert!(matches!(zero, SchedulerError::InvalidOverride { .. }));

        let nan = OverrideTable::new(vec![OverrideRule::new("x", f64::NAN)]);
        assert!(nan.is_err());

        let empty = OverrideTable::new(vec![OverrideRule::new("  ?! ", 2.0)]);
        assert!(empty.is_err());
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: OverrideRule = toml::from_str("pattern = \"anatomy\"\nmultiplier = 2.5").unwrap();
        assert_eq!(rule.scope, OverrideScope::All);
        assert_eq!(rule.match_mode, MatchMode::Substring);
        assert_eq!(rule.multiplier, 2.5);

        let scoped: OverrideRule = toml::from_str(
            "pattern = \"duplicate\"\nmultiplier = 0.5\nmatch_mode = \"keyword\"\nscope = { tier = \"low\" }",
        )
        .unwrap();
        assert_eq!(scoped.scope, OverrideScope::Tier(ComplexityTier::Low));
        assert_eq!(scoped.match_mode, MatchMode::Keyword);
    }
}
