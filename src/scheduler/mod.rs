//! Study plan scheduling engine
//!
//! This module turns a topic catalog and a weekly time budget into a dated,
//! ordered sequence of study sessions, and reports how that sequence is
//! spread across complexity tiers.
//!
//! # Overview
//!
//! Generation is a synchronous pipeline. Every phase consumes the full
//! output of the one before it, and identical inputs always produce
//! byte-identical session sequences.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │  WeeklyTemplate  │        │  Topic catalog   │
//! │  + PlanWindow    │        │  + OverrideRules │
//! └────────┬─────────┘        └────────┬─────────┘
//!          │                           │
//!   ┌──────▼───────┐           ┌───────▼───────┐
//!   │ Availability │           │  Normalizer   │
//!   │   Builder    │           └───────┬───────┘
//!   └──────┬───────┘                   │
//!          │                   ┌───────▼───────┐
//!          │                   │   Rotation    │
//!          │                   │   Scheduler   │
//!          │                   └───────┬───────┘
//!          │      viability check      │
//!          └────────────┬──────────────┘
//!                ┌──────▼───────┐
//!                │ Materializer │ ──▶ StudySession[] (+ deficit warning)
//!                └──────────────┘              │
//!                                      ┌───────▼───────┐
//!                                      │ Distribution  │
//!                                      │   Analyzer    │
//!                                      └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`availability`] - Study-eligible days with hour budgets and progress
//! - [`overrides`] - Title-pattern multiplier rules
//! - [`normalizer`] - Sub-unit expansion, session hours and pass counts
//! - [`rotation`] - Round-robin multi-pass sweep
//! - [`materializer`] - Day assignment under hour budgets and a density cap
//! - [`generator`] - The full pipeline, including the viability check
//! - [`distribution`] - Per-tier distribution report
//!
//! # Quick Start
//!
//! ```ignore
//! use studyplan::models::{ComplexityTier, PlanRequest, PlanWindow, Topic, WeeklyTemplate};
//! use studyplan::scheduler::{analyze_distribution, PlanGenerator};
//!
//! let request = PlanRequest::new(
//!     vec![Topic::new(1, "Thermodynamics", ComplexityTier::High)],
//!     WeeklyTemplate::uniform(2.0),
//!     PlanWindow::new(start, exam).with_buffer(2),
//! );
//!
//! let plan = PlanGenerator::default().generate(&request)?;
//! if let Some(warning) = &plan.deficit_warning {
//!     println!("warning: {}", warning.message());
//! }
//!
//! let report = analyze_distribution(&plan.sessions, &request.topics)?;
//! println!("{}", report.display());
//! ```
//!
//! # Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `passes.low/medium/high` | 1 / 3 / 5 | Base passes per tier |
//! | `passes.test_tiers` | medium, high | Tiers whose final pass is a TEST |
//! | `cost.session_hours` | 1.0 | Hours per unit of effort weight |
//! | `cost.granularity_hours` | 0.5 | Session length step |
//! | `density.steps` | 0.0:2, 0.5:3, 0.85:4 | Sessions per day by progress |

pub mod availability;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod materializer;
pub mod normalizer;
pub mod overrides;
pub mod rotation;

// Re-export main types
pub use availability::AvailabilityBuilder;
pub use distribution::{analyze_distribution, ComplexityBucketStats, DistributionAnalyzer, DistributionReport};
pub use error::{SchedulerError, SchedulerResult};
pub use generator::{generate, GeneratedPlan, PlanGenerator};
pub use materializer::{DeficitWarning, DensityCap, DensityStep, MaterializedPlan, SessionMaterializer};
pub use normalizer::{adjust_passes, NormalizedUnit, PassPolicy, SessionCost, TopicNormalizer};
pub use overrides::{MatchMode, OverrideRule, OverrideScope, OverrideTable};
pub use rotation::{RotationScheduler, SessionUnit};
