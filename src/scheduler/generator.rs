//! Plan generation pipeline
//!
//! Runs the phases in order: availability, normalization, rotation,
//! viability check, materialization. The whole pipeline is a pure function
//! of the request and the configured constants; persistence is the
//! caller's concern.

use serde::{Deserialize, Serialize};

use super::availability::{total_hours, AvailabilityBuilder};
use super::error::{SchedulerError, SchedulerResult};
use super::materializer::{DeficitWarning, DensityCap, SessionMaterializer};
use super::normalizer::{PassPolicy, SessionCost, TopicNormalizer};
use super::overrides::{OverrideRule, OverrideTable};
use super::rotation::{required_hours, RotationScheduler};
use crate::config::Config;
use crate::models::{session_fingerprint, PlanRequest, StudySession};

/// Slack allowed when comparing required and available hours
const VIABILITY_EPSILON: f64 = 1e-9;

/// Result of one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub sessions: Vec<StudySession>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deficit_warning: Option<DeficitWarning>,

    pub required_hours: f64,
    pub available_hours: f64,
    pub eligible_days: usize,

    /// Normalized units (topics plus expanded parts)
    pub unit_count: usize,

    /// Digest of the session sequence
    pub fingerprint: String,
}

impl GeneratedPlan {
    pub fn has_deficit(&self) -> bool {
        self.deficit_warning.is_some()
    }
}

/// Configured study plan generator
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    policy: PassPolicy,
    cost: SessionCost,
    density: DensityCap,

    /// Rules applied to every request, ahead of request-level rules
    base_overrides: Vec<OverrideRule>,
}

impl PlanGenerator {
    pub fn new(policy: PassPolicy, cost: SessionCost, density: DensityCap) -> Self {
        Self {
            policy,
            cost,
            density,
            base_overrides: Vec::new(),
        }
    }

    /// Build a generator from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.planner.passes.clone(),
            config.planner.cost,
            config.density.to_cap(),
        )
        .with_overrides(config.overrides.clone())
    }

    pub fn with_overrides(mut self, rules: Vec<OverrideRule>) -> Self {
        self.base_overrides = rules;
        self
    }

    pub fn density(&self) -> &DensityCap {
        &self.density
    }

    /// Generate dated sessions for a request
    ///
    /// # Errors
    /// Any hard validation failure from availability, override or topic
    /// validation, and `PlanNotViable` when the rotation needs more hours
    /// than the window offers. No session is produced on error.
    pub fn generate(&self, request: &PlanRequest) -> SchedulerResult<GeneratedPlan> {
        tracing::info!(
            "Generating plan: {} topics, {} through {} (buffer {} days)",
            request.topics.len(),
            request.window.start,
            request.window.exam,
            request.window.buffer()
        );

        let days = AvailabilityBuilder::new().build(&request.window, &request.template)?;

        let overrides = OverrideTable::new(
            self.base_overrides
                .iter()
                .chain(request.overrides.iter())
                .cloned(),
        )?;
        let units = TopicNormalizer::new(self.policy.clone(), self.cost)
            .with_overrides(overrides)
            .normalize(&request.topics)?;

        let queue = RotationScheduler::new().schedule(&units);

        let required = required_hours(&queue);
        let available = total_hours(&days);
        if required > available + VIABILITY_EPSILON {
            tracing::warn!(
                "Plan not viable: {:.1}h required, {:.1}h available",
                required,
                available
            );
            return Err(SchedulerError::not_viable(required, available));
        }

        let materialized = SessionMaterializer::new(self.density.clone()).materialize(&days, queue);
        let fingerprint = session_fingerprint(&materialized.sessions);

        tracing::info!(
            "Generated {} sessions over {} days ({:.1}h of {:.1}h){}",
            materialized.sessions.len(),
            days.len(),
            required,
            available,
            if materialized.deficit_warning.is_some() {
                ", with coverage deficit"
            } else {
                ""
            }
        );

        Ok(GeneratedPlan {
            sessions: materialized.sessions,
            deficit_warning: materialized.deficit_warning,
            required_hours: required,
            available_hours: available,
            eligible_days: days.len(),
            unit_count: units.len(),
            fingerprint,
        })
    }
}

/// Generate with default constants
pub fn generate(request: &PlanRequest) -> SchedulerResult<GeneratedPlan> {
    PlanGenerator::default().generate(request)
}
