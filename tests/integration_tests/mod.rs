//! Integration tests module
//!
//! This module provides end-to-end integration tests for the plan lifecycle,
//! including:
//! - Create -> generate -> regenerate against on-disk SQLite
//! - Concurrent generation claims
//! - Error handling and recovery scenarios

pub mod error_scenarios;
pub mod fixtures;
pub mod lifecycle_test;
