//! Unified error handling for the studyplan crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use studyplan::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Capacity => eprintln!("Adjust the plan: {}", err),
//!         _ if err.is_recoverable() => eprintln!("Try again: {}", err),
//!         _ => eprintln!("Fatal error: {}", err),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::repository::StorageError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Not enough time in the window for the requested topics
    Capacity,
    /// Malformed request: topics, template, window or override rules
    Validation,
    /// Plan state conflicts (generation in progress, bad transition)
    Conflict,
    /// Storage and I/O errors
    Storage,
    /// Parsing and serialization errors
    Parsing,
    /// Configuration errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the studyplan crate
#[derive(Error, Debug)]
pub enum Error {
    /// Generation and analysis errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Plan storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if retrying the same call may succeed
    ///
    /// Scheduler errors never are: the inputs must change first.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(_) => false,
            Self::Storage(e) => matches!(
                e,
                StorageError::GenerationInProgress(_) | StorageError::Database(_)
            ),
            Self::Io(_) => true,
            Self::Json(_) | Self::Toml(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(e) if e.is_capacity_error() => ErrorCategory::Capacity,
            Self::Scheduler(_) => ErrorCategory::Validation,
            Self::Storage(e) if e.is_conflict() => ErrorCategory::Conflict,
            Self::Storage(StorageError::Serialization(_)) => ErrorCategory::Parsing,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) | Self::Toml(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
