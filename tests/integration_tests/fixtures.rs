//! Test fixtures for integration tests
//!
//! Provides sample requests and helper functions for lifecycle testing

use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use studyplan::coordinator::PlanCoordinator;
use studyplan::models::{ComplexityTier, PlanRequest, PlanWindow, Topic, WeeklyTemplate};
use studyplan::scheduler::PlanGenerator;
use studyplan::storage::SqlitePlanRepository;
use tempfile::TempDir;

/// Sample request in the JSON form accepted by the CLI
pub const SAMPLE_REQUEST_JSON: &str = r#"{
    "window": { "start": "2024-03-04", "exam": "2024-03-31", "buffer_days": 1 },
    "template": { "mon": 2.0, "tue": 2.0, "wed": 2.0, "thu": 2.0, "fri": 2.0, "sat": 4.0, "sun": 0.0 },
    "topics": [
        { "id": 10, "title": "Cardiac Cycle", "tier": "high" },
        { "id": 11, "title": "Acid-Base Disorders", "tier": 4, "priority": 1 },
        { "id": 12, "title": "Enzyme Kinetics", "tier": "medium", "priority": 2 },
        { "id": 13, "title": "Lab Safety", "tier": 1, "priority": 3 }
    ],
    "overrides": [
        { "pattern": "safety", "multiplier": 0.5 }
    ]
}"#;

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

/// A request that always fits: two topics over three weeks
pub fn viable_request() -> PlanRequest {
    PlanRequest::new(
        vec![
            Topic::new(1, "Cardiac Cycle", ComplexityTier::High),
            Topic::new(2, "Cell Signalling", ComplexityTier::Medium).with_priority(2),
        ],
        WeeklyTemplate::uniform(2.0).with_day(Weekday::Sun, 0.0),
        PlanWindow::new(date(1, 15), date(2, 5)),
    )
}

/// A request that can never fit: fifteen hours into one two-hour Monday
pub fn unviable_request() -> PlanRequest {
    PlanRequest::new(
        (1..=3)
            .map(|id| Topic::new(id, format!("Topic {id}"), ComplexityTier::High))
            .collect(),
        WeeklyTemplate::new().with_day(Weekday::Mon, 2.0),
        PlanWindow::new(date(1, 15), date(1, 21)),
    )
}

/// Coordinator over an on-disk database in a fresh temp dir
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn sqlite_coordinator() -> (TempDir, Arc<SqlitePlanRepository>, PlanCoordinator) {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(SqlitePlanRepository::new(dir.path().join("plans.db")).unwrap());
    let coordinator = PlanCoordinator::new(repo.clone(), PlanGenerator::default());
    (dir, repo, coordinator)
}
