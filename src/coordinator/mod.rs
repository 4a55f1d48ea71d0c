//! Plan lifecycle coordination
//!
//! This module drives a stored plan through generation while keeping the
//! engine itself free of persistence.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          PlanCoordinator            │
//! │                                     │
//! │  ┌──────────────────────────────┐  │
//! │  │      Lifecycle gate          │  │
//! │  │  DRAFT/ACTIVE/FAILED         │  │
//! │  │        -> GENERATING         │  │
//! │  │        -> ACTIVE | FAILED    │  │
//! │  └──────────────────────────────┘  │
//! │                                     │
//! │  ┌──────────────────────────────┐  │
//! │  │      PlanGenerator           │  │
//! │  │  (pure, no storage access)   │  │
//! │  └──────────────────────────────┘  │
//! │                                     │
//! │  ┌──────────────────────────────┐  │
//! │  │      PlanRepository          │  │
//! │  └──────────────────────────────┘  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use studyplan::coordinator::PlanCoordinator;
//! use studyplan::storage::create_memory_repository;
//!
//! let coordinator = PlanCoordinator::new(create_memory_repository(), PlanGenerator::default());
//! let plan_id = coordinator.create_plan("alice", request)?;
//! let report = coordinator.generate(plan_id)?;
//! ```

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::metrics;
use crate::models::{PlanRequest, PlanStatus, StudyPlan};
use crate::scheduler::distribution::{DistributionAnalyzer, DistributionReport};
use crate::scheduler::generator::PlanGenerator;
use crate::scheduler::materializer::DeficitWarning;
use crate::storage::repository::SharedPlanRepository;

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub plan_id: Uuid,
    pub status: PlanStatus,
    pub session_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficit_warning: Option<DeficitWarning>,

    pub fingerprint: String,

    /// True when the new session set is identical to the previous one
    pub unchanged: bool,
}

/// Drives plans through the generation lifecycle
///
/// Generation for one plan id is serialized by the repository: claiming
/// GENERATING fails while another generation holds it. On success the whole
/// session set is replaced in one `save_sessions` call. On failure a plan
/// that was ACTIVE keeps its previous sessions and returns to ACTIVE; any
/// other plan is marked FAILED.
pub struct PlanCoordinator {
    repo: SharedPlanRepository,
    generator: PlanGenerator,
}

impl PlanCoordinator {
    pub fn new(repo: SharedPlanRepository, generator: PlanGenerator) -> Self {
        Self { repo, generator }
    }

    pub fn repository(&self) -> &SharedPlanRepository {
        &self.repo
    }

    /// Store a DRAFT plan for a user
    pub fn create_plan(&self, user_id: &str, request: PlanRequest) -> Result<Uuid> {
        let plan = StudyPlan::new(user_id, request);
        let plan_id = self.repo.create_plan(plan)?;
        tracing::info!(%plan_id, user_id, "Plan created");
        Ok(plan_id)
    }

    /// Replace a plan's inputs; takes effect on the next generation
    ///
    /// An ACTIVE plan keeps serving its current request and sessions until
    /// that generation succeeds.
    pub fn update_request(&self, plan_id: Uuid, request: PlanRequest) -> Result<()> {
        self.repo.update_request(plan_id, request)?;
        tracing::debug!(%plan_id, "Plan request updated");
        Ok(())
    }

    /// Generate (or regenerate) a plan's sessions
    ///
    /// # Errors
    /// - Storage conflicts when the plan is already generating
    /// - Any scheduler error from the generator; the plan's prior sessions
    ///   are left untouched
    pub fn generate(&self, plan_id: Uuid) -> Result<GenerationReport> {
        let previous = self.repo.set_plan_status(plan_id, PlanStatus::Generating)?;
        let _timer = metrics::start_generation_timer();

        let plan = match self.repo.get_plan(plan_id) {
            Ok(plan) => plan,
            Err(e) => {
                self.settle_failure(plan_id, previous);
                return Err(e.into());
            }
        };

        let generated = match self.generator.generate(plan.effective_request()) {
            Ok(generated) => generated,
            Err(e) => {
                tracing::warn!(%plan_id, error = %e, "Generation failed");
                metrics::record_generation_failure(e.kind());
                self.settle_failure(plan_id, previous);
                return Err(e.into());
            }
        };

        let unchanged = plan.fingerprint.as_deref() == Some(generated.fingerprint.as_str());
        let session_count = generated.sessions.len();
        let hours: f64 = generated.sessions.iter().map(|s| s.hours).sum();
        let deficit_hours = generated.deficit_warning.as_ref().map(|w| w.overflow_hours);

        if let Err(e) = self.repo.save_sessions(
            plan_id,
            generated.sessions,
            generated.deficit_warning.clone(),
        ) {
            metrics::record_generation_failure("storage");
            self.settle_failure(plan_id, previous);
            return Err(e.into());
        }
        if let Err(e) = self.repo.set_plan_status(plan_id, PlanStatus::Active) {
            tracing::warn!(%plan_id, error = %e, "Could not activate plan");
            metrics::record_generation_failure("storage");
            self.settle_failure(plan_id, previous);
            return Err(e.into());
        }

        metrics::record_generation(session_count, hours, deficit_hours);
        if let Some(warning) = &generated.deficit_warning {
            tracing::warn!(%plan_id, "{}", warning.message());
        }
        tracing::info!(%plan_id, session_count, unchanged, "Plan generated");

        Ok(GenerationReport {
            plan_id,
            status: PlanStatus::Active,
            session_count,
            deficit_warning: generated.deficit_warning,
            fingerprint: generated.fingerprint,
            unchanged,
        })
    }

    /// Distribution report over a plan's stored sessions
    pub fn analyze(&self, plan_id: Uuid) -> Result<DistributionReport> {
        let plan = self.repo.get_plan(plan_id)?;
        Ok(DistributionAnalyzer::new().analyze(&plan.sessions, &plan.request.topics)?)
    }

    /// The user's current ACTIVE plan, if any
    pub fn active_plan(&self, user_id: &str) -> Result<Option<StudyPlan>> {
        Ok(self.repo.load_active_plan(user_id)?)
    }

    /// Release the GENERATING claim after a failure
    fn settle_failure(&self, plan_id: Uuid, previous: PlanStatus) {
        let status = if previous == PlanStatus::Active {
            PlanStatus::Active
        } else {
            PlanStatus::Failed
        };

        if let Err(e) = self.repo.set_plan_status(plan_id, status) {
            tracing::warn!(%plan_id, error = %e, "Could not release generation claim");
        } else {
            tracing::debug!(%plan_id, %status, "Generation claim released");
        }
    }
}
