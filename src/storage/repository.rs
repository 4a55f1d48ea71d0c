//! Repository Pattern for Plan Persistence
//!
//! The scheduler never touches storage. Plans, their status and their
//! session sets live behind the [`PlanRepository`] trait, which the
//! coordinator drives through the plan lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PlanCoordinator                         │
//! │          (lifecycle, generation, analysis)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PlanRepository                           │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                           │
//!                  ▼                           ▼
//!        ┌─────────────────┐         ┌─────────────────┐
//!        │     SQLite      │         │    In-Memory    │
//!        │  Implementation │         │ Implementation  │
//!        └─────────────────┘         └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use studyplan::storage::repository::{InMemoryPlanRepository, SqlitePlanRepository};
//!
//! // Production: use SQLite
//! let repo = SqlitePlanRepository::new("data/plans.db")?;
//!
//! // Testing: use in-memory
//! let repo = InMemoryPlanRepository::new();
//! ```
//!
//! Both backends enforce the same rules: status changes must be allowed by
//! [`PlanStatus::can_transition_to`], a plan already GENERATING cannot be
//! claimed again, and sessions are only accepted while GENERATING.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{session_fingerprint, PlanRequest, PlanStatus, StudyPlan, StudySession};
use crate::scheduler::materializer::DeficitWarning;

// ============================================================================
// Errors
// ============================================================================

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Plan not found: {0}")]
    PlanNotFound(Uuid),

    #[error("Plan {0} already has a generation in progress")]
    GenerationInProgress(Uuid),

    #[error("Plan {plan_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        plan_id: Uuid,
        from: PlanStatus,
        to: PlanStatus,
    },

    #[error("Plan {0} is not generating; sessions rejected")]
    NotGenerating(Uuid),

    #[error("Plan already exists: {0}")]
    DuplicatePlan(Uuid),

    #[error("Repository lock poisoned")]
    LockPoisoned,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Check if the error reflects the plan's current state rather than a
    /// storage failure
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::GenerationInProgress(_) | Self::InvalidTransition { .. } | Self::NotGenerating(_)
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Persistence collaborator for study plans
pub trait PlanRepository: Send + Sync {
    /// Store a new plan
    fn create_plan(&self, plan: StudyPlan) -> StorageResult<Uuid>;

    /// Get a plan by id
    fn get_plan(&self, plan_id: Uuid) -> StorageResult<StudyPlan>;

    /// Most recently updated ACTIVE plan of a user
    fn load_active_plan(&self, user_id: &str) -> StorageResult<Option<StudyPlan>>;

    /// All plans of a user, oldest first
    fn plans_for_user(&self, user_id: &str) -> StorageResult<Vec<StudyPlan>>;

    /// Replace a plan's generation inputs
    ///
    /// Rejected while a generation is in progress. For an ACTIVE plan the
    /// request is held as pending until a generation succeeds, so the stored
    /// request keeps matching the stored sessions.
    fn update_request(&self, plan_id: Uuid, request: PlanRequest) -> StorageResult<()>;

    /// Replace the whole session set of a GENERATING plan
    fn save_sessions(
        &self,
        plan_id: Uuid,
        sessions: Vec<StudySession>,
        deficit_warning: Option<DeficitWarning>,
    ) -> StorageResult<()>;

    /// Move a plan to a new status, returning the previous one
    fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> StorageResult<PlanStatus>;
}

/// Thread-safe shared repository wrapper
pub type SharedPlanRepository = Arc<dyn PlanRepository>;

// ============================================================================
// Shared Mutation Rules
// ============================================================================

fn apply_status(plan: &mut StudyPlan, status: PlanStatus) -> StorageResult<PlanStatus> {
    let previous = plan.status;
    if previous == PlanStatus::Generating && status == PlanStatus::Generating {
        return Err(StorageError::GenerationInProgress(plan.id));
    }
    if !previous.can_transition_to(status) {
        return Err(StorageError::InvalidTransition {
            plan_id: plan.id,
            from: previous,
            to: status,
        });
    }
    plan.status = status;
    plan.updated_at = Utc::now();
    Ok(previous)
}

fn apply_sessions(
    plan: &mut StudyPlan,
    sessions: Vec<StudySession>,
    deficit_warning: Option<DeficitWarning>,
) -> StorageResult<()> {
    if plan.status != PlanStatus::Generating {
        return Err(StorageError::NotGenerating(plan.id));
    }
    if let Some(request) = plan.pending_request.take() {
        plan.request = request;
    }
    plan.fingerprint = Some(session_fingerprint(&sessions));
    plan.sessions = sessions;
    plan.deficit_warning = deficit_warning;
    plan.updated_at = Utc::now();
    Ok(())
}

fn apply_request(plan: &mut StudyPlan, request: PlanRequest) -> StorageResult<()> {
    if plan.status == PlanStatus::Generating {
        return Err(StorageError::GenerationInProgress(plan.id));
    }
    if plan.status == PlanStatus::Active {
        plan.pending_request = Some(request);
    } else {
        plan.request = request;
        plan.pending_request = None;
    }
    plan.updated_at = Utc::now();
    Ok(())
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of PlanRepository
///
/// Plans are stored as JSON with status and owner in indexed columns.
/// Every read-modify-write runs under the connection `Mutex`, which makes
/// the GENERATING claim atomic.
pub struct SqlitePlanRepository {
    conn: Mutex<Connection>,
}

impl SqlitePlanRepository {
    /// Create a new SQLite repository
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite plan repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let repo = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn create_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS study_plans (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    plan_json TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_study_plans_user_status
                    ON study_plans(user_id, status);
                "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn read(conn: &Connection, plan_id: Uuid) -> StorageResult<StudyPlan> {
        let json: Option<String> = conn
            .query_row(
                "SELECT plan_json FROM study_plans WHERE id = ?1",
                params![plan_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let json = json.ok_or(StorageError::PlanNotFound(plan_id))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(conn: &Connection, plan: &StudyPlan) -> StorageResult<()> {
        conn.execute(
            "UPDATE study_plans SET status = ?1, plan_json = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                plan.status.as_str(),
                serde_json::to_string(plan)?,
                timestamp(plan.updated_at),
                plan.id.to_string()
            ],
        )?;
        Ok(())
    }

    /// Load, mutate and store a plan under one lock
    fn modify<T>(
        &self,
        plan_id: Uuid,
        f: impl FnOnce(&mut StudyPlan) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let conn = self.lock()?;
        let mut plan = Self::read(&conn, plan_id)?;
        let out = f(&mut plan)?;
        Self::write(&conn, &plan)?;
        Ok(out)
    }

    fn query_plans(conn: &Connection, sql: &str, user_id: &str) -> StorageResult<Vec<StudyPlan>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

        let mut plans = Vec::new();
        for json in rows {
            plans.push(serde_json::from_str(&json?)?);
        }
        Ok(plans)
    }
}

fn timestamp(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl PlanRepository for SqlitePlanRepository {
    fn create_plan(&self, plan: StudyPlan) -> StorageResult<Uuid> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO study_plans (id, user_id, status, plan_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                plan.id.to_string(),
                plan.user_id,
                plan.status.as_str(),
                serde_json::to_string(&plan)?,
                timestamp(plan.created_at),
                timestamp(plan.updated_at)
            ],
        )?;

        if inserted == 0 {
            return Err(StorageError::DuplicatePlan(plan.id));
        }
        Ok(plan.id)
    }

    fn get_plan(&self, plan_id: Uuid) -> StorageResult<StudyPlan> {
        let conn = self.lock()?;
        Self::read(&conn, plan_id)
    }

    fn load_active_plan(&self, user_id: &str) -> StorageResult<Option<StudyPlan>> {
        let conn = self.lock()?;
        let plans = Self::query_plans(
            &conn,
            "SELECT plan_json FROM study_plans WHERE user_id = ?1 AND status = 'ACTIVE'
             ORDER BY updated_at DESC, rowid DESC LIMIT 1",
            user_id,
        )?;
        Ok(plans.into_iter().next())
    }

    fn plans_for_user(&self, user_id: &str) -> StorageResult<Vec<StudyPlan>> {
        let conn = self.lock()?;
        Self::query_plans(
            &conn,
            "SELECT plan_json FROM study_plans WHERE user_id = ?1 ORDER BY created_at, rowid",
            user_id,
        )
    }

    fn update_request(&self, plan_id: Uuid, request: PlanRequest) -> StorageResult<()> {
        self.modify(plan_id, |plan| apply_request(plan, request))
    }

    fn save_sessions(
        &self,
        plan_id: Uuid,
        sessions: Vec<StudySession>,
        deficit_warning: Option<DeficitWarning>,
    ) -> StorageResult<()> {
        self.modify(plan_id, |plan| apply_sessions(plan, sessions, deficit_warning))
    }

    fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> StorageResult<PlanStatus> {
        self.modify(plan_id, |plan| apply_status(plan, status))
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// In-memory implementation of PlanRepository
///
/// Useful for tests and for embedding the planner without a database.
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<Uuid, StudyPlan>>,
}

impl InMemoryPlanRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of plans
    pub fn len(&self) -> usize {
        self.plans.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn modify<T>(
        &self,
        plan_id: Uuid,
        f: impl FnOnce(&mut StudyPlan) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut plans = self.plans.write().map_err(|_| StorageError::LockPoisoned)?;
        let plan = plans.get_mut(&plan_id).ok_or(StorageError::PlanNotFound(plan_id))?;
        f(plan)
    }

    fn sorted_for_user(&self, user_id: &str) -> StorageResult<Vec<StudyPlan>> {
        let plans = self.plans.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut owned: Vec<_> = plans.values().filter(|p| p.user_id == user_id).cloned().collect();
        owned.sort_by_key(|p| (p.created_at, p.id));
        Ok(owned)
    }
}

impl Default for InMemoryPlanRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanRepository for InMemoryPlanRepository {
    fn create_plan(&self, plan: StudyPlan) -> StorageResult<Uuid> {
        let mut plans = self.plans.write().map_err(|_| StorageError::LockPoisoned)?;
        if plans.contains_key(&plan.id) {
            return Err(StorageError::DuplicatePlan(plan.id));
        }
        let id = plan.id;
        plans.insert(id, plan);
        Ok(id)
    }

    fn get_plan(&self, plan_id: Uuid) -> StorageResult<StudyPlan> {
        let plans = self.plans.read().map_err(|_| StorageError::LockPoisoned)?;
        plans
            .get(&plan_id)
            .cloned()
            .ok_or(StorageError::PlanNotFound(plan_id))
    }

    fn load_active_plan(&self, user_id: &str) -> StorageResult<Option<StudyPlan>> {
        Ok(self
            .sorted_for_user(user_id)?
            .into_iter()
            .filter(|p| p.status == PlanStatus::Active)
            .max_by_key(|p| p.updated_at))
    }

    fn plans_for_user(&self, user_id: &str) -> StorageResult<Vec<StudyPlan>> {
        self.sorted_for_user(user_id)
    }

    fn update_request(&self, plan_id: Uuid, request: PlanRequest) -> StorageResult<()> {
        self.modify(plan_id, |plan| apply_request(plan, request))
    }

    fn save_sessions(
        &self,
        plan_id: Uuid,
        sessions: Vec<StudySession>,
        deficit_warning: Option<DeficitWarning>,
    ) -> StorageResult<()> {
        self.modify(plan_id, |plan| apply_sessions(plan, sessions, deficit_warning))
    }

    fn set_plan_status(&self, plan_id: Uuid, status: PlanStatus) -> StorageResult<PlanStatus> {
        self.modify(plan_id, |plan| apply_status(plan, status))
    }
}

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> anyhow::Result<SharedPlanRepository> {
    Ok(Arc::new(SqlitePlanRepository::new(path)?))
}

/// Create a shared in-memory repository
pub fn create_memory_repository() -> SharedPlanRepository {
    Arc::new(InMemoryPlanRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
