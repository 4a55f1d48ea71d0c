//! studyplan - Study plan scheduling and distribution engine
//!
//! Turns a catalog of weighted study topics and a weekly time budget into a
//! dated, ordered sequence of study sessions, and reports how evenly that
//! effort is spread across complexity tiers.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Core data structures and types
//! - [`scheduler`] - Availability, rotation, materialization and distribution analysis
//! - [`storage`] - Plan persistence behind a repository trait (SQLite, in-memory)
//! - [`coordinator`] - Plan lifecycle around generation
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics for generation outcomes
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use studyplan::models::{ComplexityTier, PlanRequest, PlanWindow, Topic, WeeklyTemplate};
//! use studyplan::scheduler::PlanGenerator;
//!
//! fn main() -> anyhow::Result<()> {
//!     let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//!     let exam = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!     let request = PlanRequest::new(
//!         vec![Topic::new(1, "Thermodynamics", ComplexityTier::High)],
//!         WeeklyTemplate::uniform(2.0),
//!         PlanWindow::new(start, exam).with_buffer(3),
//!     );
//!
//!     let plan = PlanGenerator::default().generate(&request)?;
//!     println!("{} sessions", plan.sessions.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::coordinator::{GenerationReport, PlanCoordinator};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        ComplexityTier, PlanRequest, PlanStatus, PlanWindow, SessionType, StudyPlan, StudySession,
        SubUnit, Topic, WeeklyTemplate,
    };
    pub use crate::scheduler::{
        analyze_distribution, DeficitWarning, DistributionReport, GeneratedPlan, OverrideRule,
        PlanGenerator, SchedulerError,
    };
    pub use crate::storage::{InMemoryPlanRepository, PlanRepository, SqlitePlanRepository};
}

// Direct re-exports for convenience
pub use models::{ComplexityTier, PlanRequest, StudySession, Topic};
pub use scheduler::{analyze_distribution, generate};
