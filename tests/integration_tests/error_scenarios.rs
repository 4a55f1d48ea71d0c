//! Error scenario integration tests
//!
//! Tests various failure modes and error handling:
//! 1. Unviable requests
//! 2. Failed regeneration of an ACTIVE plan, pending inputs
//! 3. Malformed inputs
//! 4. Unknown plans
//! 5. Analyzer input errors

use studyplan::error::{Error, ErrorCategory};
use chrono::Weekday;
use studyplan::models::{
    ComplexityTier, PlanRequest, PlanStatus, PlanWindow, Topic, WeeklyTemplate,
};
use studyplan::scheduler::{analyze_distribution, generate, OverrideRule, SchedulerError};
use studyplan::storage::{PlanRepository, StorageError};
use uuid::Uuid;

use super::fixtures::{date, sqlite_coordinator, unviable_request, viable_request};

// ============================================================================
// Capacity Errors
// ============================================================================

#[test]
fn test_unviable_draft_becomes_failed() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("ivan", unviable_request()).unwrap();

    let err = coordinator.generate(plan_id).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Capacity);
    match err {
        Error::Scheduler(e) => assert_eq!(e.deficit_hours(), 13.0),
        other => panic!("expected scheduler error, got {other}"),
    }

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Failed);
    assert!(plan.sessions.is_empty());
}

#[test]
fn test_failed_regeneration_keeps_active_sessions() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("judy", viable_request()).unwrap();
    let first = coordinator.generate(plan_id).unwrap();

    coordinator.update_request(plan_id, unviable_request()).unwrap();
    assert!(coordinator.generate(plan_id).is_err());

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Active);
    assert_eq!(plan.sessions.len(), first.session_count);
    assert_eq!(plan.fingerprint.as_deref(), Some(first.fingerprint.as_str()));
}

#[test]
fn test_failed_regeneration_keeps_analyzable_plan() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("oscar", viable_request()).unwrap();
    let first = coordinator.generate(plan_id).unwrap();

    // Drops topic 2 and cannot fit in one hour a week
    let narrowed = PlanRequest::new(
        vec![Topic::new(1, "Cardiac Cycle", ComplexityTier::High)],
        WeeklyTemplate::new().with_day(Weekday::Mon, 1.0),
        PlanWindow::new(date(1, 15), date(1, 21)),
    );
    coordinator.update_request(plan_id, narrowed.clone()).unwrap();
    assert!(coordinator.generate(plan_id).is_err());

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.status, PlanStatus::Active);
    assert_eq!(plan.sessions.len(), first.session_count);
    assert_eq!(plan.request, viable_request());
    assert_eq!(plan.pending_request, Some(narrowed));

    let analysis = coordinator.analyze(plan_id).unwrap();
    assert_eq!(analysis.total_topics, 2);
    assert_eq!(analysis.total_sessions, first.session_count);

    // A viable replacement is committed together with its sessions
    let mut extended = viable_request();
    extended
        .topics
        .push(Topic::new(3, "Histology", ComplexityTier::Low).with_priority(3));
    coordinator.update_request(plan_id, extended.clone()).unwrap();
    let report = coordinator.generate(plan_id).unwrap();

    let plan = repo.get_plan(plan_id).unwrap();
    assert_eq!(plan.request, extended);
    assert!(plan.pending_request.is_none());
    assert_eq!(coordinator.analyze(plan_id).unwrap().total_sessions, report.session_count);
}

#[test]
fn test_failed_plan_can_retry() {
    let (_dir, _repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("mallory", unviable_request()).unwrap();
    assert!(coordinator.generate(plan_id).is_err());

    coordinator.update_request(plan_id, viable_request()).unwrap();
    let report = coordinator.generate(plan_id).unwrap();
    assert_eq!(report.status, PlanStatus::Active);
}

// ============================================================================
// Malformed Inputs
// ============================================================================

#[test]
fn test_inverted_window_rejected() {
    let mut request = viable_request();
    request.window = PlanWindow::new(date(2, 5), date(1, 15));

    let err = generate(&request).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidWindow { .. }));
    assert!(err.is_capacity_error());
    assert_eq!(err.deficit_hours(), 0.0);
}

#[test]
fn test_buffer_swallowing_window_rejected() {
    let mut request = viable_request();
    request.window = PlanWindow::new(date(1, 15), date(1, 20)).with_buffer(5);

    assert!(matches!(
        generate(&request).unwrap_err(),
        SchedulerError::InvalidWindow { .. }
    ));
}

#[test]
fn test_empty_catalog_rejected() {
    let mut request = viable_request();
    request.topics.clear();
    assert_eq!(generate(&request).unwrap_err(), SchedulerError::EmptyTopicSet);
}

#[test]
fn test_duplicate_topic_ids_rejected() {
    let mut request = viable_request();
    request
        .topics
        .push(Topic::new(1, "Duplicate", ComplexityTier::Low));

    assert!(matches!(
        generate(&request).unwrap_err(),
        SchedulerError::InvalidTopic { topic_id: 1, .. }
    ));
}

#[test]
fn test_bad_override_rejected() {
    let request = viable_request().with_override(OverrideRule::new("cardiac", 0.0));
    let err = generate(&request).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidOverride { .. }));
    assert_eq!(Error::from(err).category(), ErrorCategory::Validation);
}

#[test]
fn test_unknown_tier_level_rejected() {
    let json = r#"{ "id": 1, "title": "Mystery", "tier": 7 }"#;
    assert!(serde_json::from_str::<Topic>(json).is_err());
}

#[test]
fn test_missing_window_is_parse_error() {
    let json = r#"{ "topics": [], "template": {} }"#;
    assert!(serde_json::from_str::<PlanRequest>(json).is_err());
}

// ============================================================================
// Storage Errors
// ============================================================================

#[test]
fn test_unknown_plan_id() {
    let (_dir, _repo, coordinator) = sqlite_coordinator();
    let missing = Uuid::new_v4();

    let err = coordinator.generate(missing).unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::PlanNotFound(id)) if id == missing));
    assert_eq!(err.category(), ErrorCategory::Storage);
}

#[test]
fn test_sessions_rejected_outside_generation() {
    let (_dir, repo, coordinator) = sqlite_coordinator();
    let plan_id = coordinator.create_plan("niaj", viable_request()).unwrap();

    let err = repo.save_sessions(plan_id, Vec::new(), None).unwrap_err();
    assert!(matches!(err, StorageError::NotGenerating(_)));
    assert!(err.is_conflict());
}

// ============================================================================
// Analyzer Errors
// ============================================================================

#[test]
fn test_analyze_empty_catalog() {
    assert_eq!(
        analyze_distribution(&[], &[]).unwrap_err(),
        SchedulerError::EmptyDistribution
    );
}

#[test]
fn test_analyze_unknown_topic() {
    let plan = generate(&viable_request()).unwrap();
    let topics = vec![Topic::new(1, "Cardiac Cycle", ComplexityTier::High)];

    assert!(matches!(
        analyze_distribution(&plan.sessions, &topics).unwrap_err(),
        SchedulerError::UnknownTopic { topic_id: 2 }
    ));
}
