//! Round-robin rotation over normalized units
//!
//! This module implements the multi-pass sweep that ensures:
//! - Every unit gets its first exposure before any unit is reviewed
//! - Higher priority units come first within each cycle
//! - Deterministic ordering (identical inputs always produce the same queue)

use serde::{Deserialize, Serialize};

use super::normalizer::NormalizedUnit;
use crate::models::SessionType;

// ============================================================================
// Session Unit
// ============================================================================

/// An undated unit of work produced by the rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUnit {
    pub topic_id: u64,
    pub topic_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,

    /// Pass index, equal to the rotation cycle that emitted it
    pub pass: u32,

    pub session_type: SessionType,
    pub hours: f64,
}

// ============================================================================
// Rotation Scheduler
// ============================================================================

/// Scheduler for multi-pass topic rotation
///
/// Each cycle emits one session unit for every unit that still has passes
/// left, in priority order. Ties are broken by catalog order and then by
/// part order, so parts of one topic stay in label order within a cycle
/// without having to be adjacent across cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationScheduler;

impl RotationScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Units sorted into rotation order
    pub fn rotation_order<'a>(&self, units: &'a [NormalizedUnit]) -> Vec<&'a NormalizedUnit> {
        let mut order: Vec<_> = units.iter().collect();
        order.sort_by_key(|u| (u.priority, u.catalog_order, u.part_index));
        order
    }

    /// Number of cycles needed to exhaust every unit
    pub fn cycle_count(&self, units: &[NormalizedUnit]) -> u32 {
        units.iter().map(|u| u.adjusted_passes).max().unwrap_or(0)
    }

    /// Produce the full session queue
    ///
    /// The queue length always equals the sum of adjusted pass counts.
    pub fn schedule(&self, units: &[NormalizedUnit]) -> Vec<SessionUnit> {
        let order = self.rotation_order(units);
        let cycles = self.cycle_count(units);
        let total: u32 = units.iter().map(|u| u.adjusted_passes).sum();
        let mut queue = Vec::with_capacity(total as usize);

        for cycle in 1..=cycles {
            for unit in order.iter().filter(|u| u.adjusted_passes >= cycle) {
                queue.push(SessionUnit {
                    topic_id: unit.topic_id,
                    topic_title: unit.topic_title.clone(),
                    part: unit.part.clone(),
                    pass: cycle,
                    session_type: session_type_for(unit, cycle),
                    hours: unit.session_hours,
                });
            }
        }

        tracing::debug!(
            "Rotation produced {} session units over {} cycles",
            queue.len(),
            cycles
        );
        queue
    }
}

/// Tag a pass: first exposure is STUDY, the last pass of a tested tier is
/// TEST, everything in between is REVIEW
fn session_type_for(unit: &NormalizedUnit, pass: u32) -> SessionType {
    if pass == 1 {
        SessionType::Study
    } else if pass == unit.adjusted_passes && unit.requires_test {
        SessionType::Test
    } else {
        SessionType::Review
    }
}

/// Total hours required by a queue
pub fn required_hours(queue: &[SessionUnit]) -> f64 {
    queue.iter().map(|u| u.hours).sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComplexityTier, Topic};
    use crate::scheduler::normalizer::{PassPolicy, SessionCost, TopicNormalizer};

    fn units(topics: &[Topic]) -> Vec<NormalizedUnit> {
        TopicNormalizer::new(PassPolicy::default(), SessionCost::default())
            .normalize(topics)
            .unwrap()
    }

    #[test]
    fn test_queue_length_is_sum_of_passes() {
        let units = units(&[
            Topic::new(1, "A", ComplexityTier::Low),
            Topic::new(2, "B", ComplexityTier::Medium),
            Topic::new(3, "C", ComplexityTier::High),
        ]);
        let queue = RotationScheduler::new().schedule(&units);
        assert_eq!(queue.len(), 1 + 3 + 5);
    }

    #[test]
    fn test_first_cycle_is_all_study() {
        let units = units(&[
            Topic::new(1, "A", ComplexityTier::High),
            Topic::new(2, "B", ComplexityTier::High),
        ]);
        let queue = RotationScheduler::new().schedule(&units);

        assert!(queue[..2].iter().all(|u| u.session_type == SessionType::Study));
        assert!(queue[2..].iter().all(|u| u.session_type != SessionType::Study));
    }

    #[test]
    fn test_priority_then_catalog_order() {
        let units = units(&[
            Topic::new(1, "A", ComplexityTier::Low).with_priority(2),
            Topic::new(2, "B", ComplexityTier::Low).with_priority(1),
            Topic::new(3, "C", ComplexityTier::Low).with_priority(2),
        ]);
        let queue = RotationScheduler::new().schedule(&units);
        let ids: Vec<_> = queue.iter().map(|u| u.topic_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_exhausted_units_drop_out() {
        let units = units(&[
            Topic::new(1, "A", ComplexityTier::Low),
            Topic::new(2, "B", ComplexityTier::Medium),
        ]);
        let queue = RotationScheduler::new().schedule(&units);
        let ids: Vec<_> = queue.iter().map(|u| (u.topic_id, u.pass)).collect();
        assert_eq!(ids, vec![(1, 1), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_session_type_tagging() {
        let units = units(&[
            Topic::new(1, "Tested", ComplexityTier::Medium),
            Topic::new(2, "Untested", ComplexityTier::Low).with_passes(3),
        ]);
        let queue = RotationScheduler::new().schedule(&units);

        let tested: Vec<_> = queue
            .iter()
            .filter(|u| u.topic_id == 1)
            .map(|u| u.session_type)
            .collect();
        assert_eq!(
            tested,
            vec![SessionType::Study, SessionType::Review, SessionType::Test]
        );

        let untested: Vec<_> = queue
            .iter()
            .filter(|u| u.topic_id == 2)
            .map(|u| u.session_type)
            .collect();
        assert_eq!(
            untested,
            vec![SessionType::Study, SessionType::Review, SessionType::Review]
        );
    }

    #[test]
    fn test_single_pass_tested_tier_is_study() {
        let units = units(&[Topic::new(1, "A", ComplexityTier::High).with_passes(1)]);
        let queue = RotationScheduler::new().schedule(&units);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].session_type, SessionType::Study);
    }

    #[test]
    fn test_parts_stay_in_label_order_each_cycle() {
        let units = units(&[
            Topic::new(1, "Anatomy", ComplexityTier::Medium)
                .with_sub_unit("Part 1", 1.0)
                .with_sub_unit("Part 2", 1.0),
            Topic::new(2, "Physiology", ComplexityTier::Medium),
        ]);
        let queue = RotationScheduler::new().schedule(&units);

        for cycle in 1..=3 {
            let parts: Vec<_> = queue
                .iter()
                .filter(|u| u.pass == cycle && u.topic_id == 1)
                .map(|u| u.part.as_deref().unwrap())
                .collect();
            assert_eq!(parts, vec!["Part 1", "Part 2"]);
        }
    }

    #[test]
    fn test_deterministic() {
        let topics = vec![
            Topic::new(1, "A", ComplexityTier::High).with_priority(3),
            Topic::new(2, "B", ComplexityTier::Medium).with_priority(1),
            Topic::new(3, "C", ComplexityTier::Low).with_priority(1),
        ];
        let first = RotationScheduler::new().schedule(&units(&topics));
        let second = RotationScheduler::new().schedule(&units(&topics));
        assert_eq!(first, second);
    }

    #[test]
    fn test_required_hours() {
        let units = units(&[Topic::new(1, "A", ComplexityTier::Medium).with_weight(1.5)]);
        let queue = RotationScheduler::new().schedule(&units);
        assert_eq!(required_hours(&queue), 4.5);
    }
}
