//! Topic normalization
//!
//! Expands multi-part topics into ordered sub-units, resolves effort
//! weights and session hours, and applies override multipliers to the
//! tier-derived pass counts.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{SchedulerError, SchedulerResult};
use super::overrides::OverrideTable;
use crate::models::{ComplexityTier, Topic};

// ============================================================================
// Pass Policy
// ============================================================================

/// Base pass counts per tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassPolicy {
    pub low: u32,
    pub medium: u32,
    pub high: u32,

    /// Tiers whose final pass is a TEST session
    pub test_tiers: Vec<ComplexityTier>,
}

impl Default for PassPolicy {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 3,
            high: 5,
            test_tiers: vec![ComplexityTier::Medium, ComplexityTier::High],
        }
    }
}

impl PassPolicy {
    pub fn base_passes(&self, tier: ComplexityTier) -> u32 {
        match tier {
            ComplexityTier::Low => self.low,
            ComplexityTier::Medium => self.medium,
            ComplexityTier::High => self.high,
        }
    }

    pub fn requires_test(&self, tier: ComplexityTier) -> bool {
        self.test_tiers.contains(&tier)
    }
}

/// Apply an override multiplier to a base pass count
///
/// Rounds to the nearest whole pass and never goes below one, so a
/// suppressed topic still appears once.
pub fn adjust_passes(base: u32, multiplier: f64) -> u32 {
    ((f64::from(base) * multiplier).round() as u32).max(1)
}

// ============================================================================
// Session Cost
// ============================================================================

/// Converts effort weight into session hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCost {
    /// Hours for one session of weight 1.0
    pub session_hours: f64,

    /// Every session length is a multiple of this
    pub granularity_hours: f64,
}

impl Default for SessionCost {
    fn default() -> Self {
        Self {
            session_hours: 1.0,
            granularity_hours: 0.5,
        }
    }
}

impl SessionCost {
    /// Hours for one session of a unit with the given effort weight
    pub fn hours_for(&self, weight: f64) -> f64 {
        let steps = (weight * self.session_hours / self.granularity_hours).ceil().max(1.0);
        steps * self.granularity_hours
    }
}

// ============================================================================
// Normalized Units
// ============================================================================

/// A schedulable unit: a whole topic or one part of a multi-part topic
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUnit {
    pub topic_id: u64,
    pub topic_title: String,

    /// Sub-unit label, `None` for whole topics
    pub part: Option<String>,

    /// Position of the part within its topic
    pub part_index: usize,

    /// Position of the parent topic in the catalog
    pub catalog_order: usize,

    pub tier: ComplexityTier,
    pub priority: u32,
    pub effort_weight: f64,
    pub session_hours: f64,
    pub base_passes: u32,
    pub multiplier: f64,
    pub adjusted_passes: u32,
    pub requires_test: bool,
}

impl NormalizedUnit {
    /// Hours this unit needs across all of its passes
    pub fn required_hours(&self) -> f64 {
        f64::from(self.adjusted_passes) * self.session_hours
    }
}

/// Expands and weights topics ahead of rotation
#[derive(Debug, Clone, Default)]
pub struct TopicNormalizer {
    policy: PassPolicy,
    cost: SessionCost,
    overrides: OverrideTable,
}

impl TopicNormalizer {
    pub fn new(policy: PassPolicy, cost: SessionCost) -> Self {
        Self {
            policy,
            cost,
            overrides: OverrideTable::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Normalize a topic catalog
    ///
    /// Output keeps catalog order; parts follow their declaration order.
    ///
    /// # Errors
    /// - `EmptyTopicSet` when `topics` is empty
    /// - `InvalidTopic` for duplicate ids, zero passes or bad weights
    pub fn normalize(&self, topics: &[Topic]) -> SchedulerResult<Vec<NormalizedUnit>> {
        if topics.is_empty() {
            return Err(SchedulerError::EmptyTopicSet);
        }

        let mut seen = HashSet::with_capacity(topics.len());
        let mut units = Vec::with_capacity(topics.len());

        for (catalog_order, topic) in topics.iter().enumerate() {
            if !seen.insert(topic.id) {
                return Err(SchedulerError::invalid_topic(topic.id, "duplicate topic id"));
            }
            validate_topic(topic)?;

            let base_passes = topic
                .passes
                .unwrap_or_else(|| self.policy.base_passes(topic.tier));
            let multiplier = self.overrides.multiplier_for(&topic.title, topic.tier);
            let adjusted_passes = adjust_passes(base_passes, multiplier);

            if (multiplier - 1.0).abs() > f64::EPSILON {
                tracing::debug!(
                    "Override on topic {} '{}': {} -> {} passes (x{:.2})",
                    topic.id,
                    topic.title,
                    base_passes,
                    adjusted_passes,
                    multiplier
                );
            }

            let make_unit = |part: Option<String>, part_index: usize, effort_weight: f64| NormalizedUnit {
                topic_id: topic.id,
                topic_title: topic.title.clone(),
                part,
                part_index,
                catalog_order,
                tier: topic.tier,
                priority: topic.priority,
                effort_weight,
                session_hours: self.cost.hours_for(effort_weight),
                base_passes,
                multiplier,
                adjusted_passes,
                requires_test: self.policy.requires_test(topic.tier),
            };

            if topic.has_sub_units() {
                for (index, sub) in topic.sub_units.iter().enumerate() {
                    units.push(make_unit(Some(sub.label.clone()), index, sub.weight));
                }
            } else {
                units.push(make_unit(None, 0, topic.effort_weight()));
            }
        }

        tracing::debug!("Normalized {} topics into {} units", topics.len(), units.len());
        Ok(units)
    }
}

fn validate_topic(topic: &Topic) -> SchedulerResult<()> {
    if topic.passes == Some(0) {
        return Err(SchedulerError::invalid_topic(topic.id, "passes must be at least 1"));
    }
    if let Some(weight) = topic.weight {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(SchedulerError::invalid_topic(
                topic.id,
                format!("weight must be positive, got {}", weight),
            ));
        }
    }
    for sub in &topic.sub_units {
        if !sub.weight.is_finite() || sub.weight <= 0.0 {
            return Err(SchedulerError::invalid_topic(
                topic.id,
                format!("sub-unit '{}' weight must be positive, got {}", sub.label, sub.weight),
            ));
        }
    }
    Ok(())
}
