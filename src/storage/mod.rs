//! Plan persistence
//!
//! Generation is pure; this module holds the collaborator that stores plans
//! and enforces the lifecycle gate around them.

pub mod repository;

pub use repository::{
    create_memory_repository, create_sqlite_repository, InMemoryPlanRepository, PlanRepository,
    SharedPlanRepository, SqlitePlanRepository, StorageError, StorageResult,
};
