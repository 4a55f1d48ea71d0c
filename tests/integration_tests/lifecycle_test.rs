//! Plan lifecycle integration tests
//!
//! Tests the full create -> generate -> regenerate flow against an on-disk
//! SQLite database:
//! 1. First generation activates a DRAFT plan
//! 2. Regeneration replaces the whole session set
//! 3. Plans survive reopening the database
//! 4. Concurrent generation requests are serialized

use std::sync::Arc;
use std::thread;

use studyplan::coordinator::PlanCoordinator;
use studyplan::error::Error;
use studyplan::models::{ComplexityTier, PlanRequest, PlanStatus, Topic};
use studyplan::scheduler::PlanGenerator;
use studyplan::storage::{PlanRepository, SqlitePlanRepository, StorageError};

use super::fixtures::{sqlite_coordinator, viable_request, SAMPLE_REQUEST_JSON};

// ============================================================================
// Generation Flow
// ============================================================================

#[test]
fn test_create_generate_activate() {
    let (_dir, repo, coordinator) = sqlite_coordinator();

    let plan_id = coordinator.create_plan("alice", viable_request()).unwrap();
    assert_eq!(repo.get_plan(plan_id).unwrap().status, PlanStatus::Draft);
    assert!(coordinator.active_plan("alice").unwrap().is_none());

    let report = coordinator.generate(plan_id).unwrap();
    assert_eq!(report.status, PlanStatus::Active);
    assert_eq!(report.session_count, 8);
    assert!(!report.unchanged);

    let active = coordinator.active_plan("alice").unwrap().unwrap();
    assert_eq!(active.id, plan_id);
    assert_eq!(active.sessions.len(), 8);
    assert_eq!(active.fingerprint.as_deref(), Some(report.fingerprint.as_str()));
}

#[test]
fn test_regeneration_replaces_sessions() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("bob", viable_request()).unwrap();
    coordinator.generate(plan_id).unwrap();

    let again = coordinator.generate(plan_id).unwrap();
    assert!(again.unchanged);

    let mut request = viable_request();
    request
        .topics
        .push(Topic::new(3, "Histology", ComplexityTier::Low).with_priority(3));
    coordinator.update_request(plan_id, request).unwrap();

    let report = coordinator.generate(plan_id).unwrap();
    assert!(!report.unchanged);
    assert_eq!(report.session_count, 9);

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.sessions.len(), 9);
    assert_eq!(plan.sessions.iter().filter(|s| s.topic_id == 3).count(), 1);
}

#[test]
fn test_plan_survives_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("plans.db");

    let plan_id = {
        let repo = Arc::new(SqlitePlanRepository::new(&path).unwrap());
        let coordinator = PlanCoordinator::new(repo, PlanGenerator::default());
        let plan_id = coordinator.create_plan("carol", viable_request()).unwrap();
        coordinator.generate(plan_id).unwrap();
        plan_id
    };

    let repo = SqlitePlanRepository::new(&path).unwrap();
    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Active);
    assert_eq!(plan.sessions.len(), 8);
    assert_eq!(repo.plans_for_user("carol").unwrap().len(), 1);
}

#[test]
fn test_sample_json_request_generates() {
    let request: PlanRequest = serde_json::from_str(SAMPLE_REQUEST_JSON).unwrap();
    let (_dir, _repo, coordinator) = sqlite_coordinator();

    let plan_id = coordinator.create_plan("dave", request).unwrap();
    let report = coordinator.generate(plan_id).unwrap();

    // 5 + 5 + 3 passes, safety suppressed to a single pass
    assert_eq!(report.session_count, 14);

    let analysis = coordinator.analyze(plan_id).unwrap();
    assert_eq!(analysis.total_topics, 4);
    assert_eq!(analysis.total_sessions, 14);
}

#[test]
fn test_users_are_isolated() {
    let (_dir, _repo, coordinator) = sqlite_coordinator();
    let a = coordinator.create_plan("erin", viable_request()).unwrap();
    coordinator.create_plan("frank", viable_request()).unwrap();
    coordinator.generate(a).unwrap();

    assert!(coordinator.active_plan("erin").unwrap().is_some());
    assert!(coordinator.active_plan("frank").unwrap().is_none());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_generation_is_serialized() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("grace", viable_request()).unwrap();
    let coordinator = Arc::new(coordinator);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || coordinator.generate(plan_id))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().any(|r| r.is_ok()));
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, Error::Storage(StorageError::GenerationInProgress(_))),
                "unexpected error: {e}"
            );
        }
    }

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Active);
    assert_eq!(plan.sessions.len(), 8);
}

#[test]
fn test_claimed_plan_rejects_second_claim() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("heidi", viable_request()).unwrap();

    repo.set_plan_status(plan_id, PlanStatus::Generating).unwrap();

    let err = coordinator.generate(plan_id).unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::GenerationInProgress(_))));
    assert!(err.is_recoverable());

    let err = coordinator.update_request(plan_id, viable_request()).unwrap_err();
    assert!(matches!(err, Error::Storage(ref e) if e.is_conflict()));
}
