//! Error types for the scheduler module

use chrono::NaiveDate;
use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
///
/// Every variant is a hard failure: nothing is retried automatically and
/// no session is produced. A capacity shortfall discovered while placing
/// sessions is not an error, it is reported as a deficit warning.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Start date is not before `exam - buffer`
    InvalidWindow {
        start: NaiveDate,
        exam: NaiveDate,
        buffer_days: u32,
    },

    /// No day in the window has study hours
    NoAvailability {
        reason: String,
    },

    /// Weekly template carries a negative or non-finite value
    InvalidTemplate {
        weekday: String,
        hours: f64,
    },

    /// Topic list is empty
    EmptyTopicSet,

    /// Topic fails validation
    InvalidTopic {
        topic_id: u64,
        reason: String,
    },

    /// Unrecognized complexity tier
    InvalidTier {
        value: String,
    },

    /// Override rule fails validation
    InvalidOverride {
        pattern: String,
        reason: String,
    },

    /// Required hours exceed available hours
    PlanNotViable {
        required_hours: f64,
        available_hours: f64,
    },

    /// Topic catalog given to the analyzer is empty
    EmptyDistribution,

    /// Session references a topic missing from the catalog
    UnknownTopic {
        topic_id: u64,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWindow {
                start,
                exam,
                buffer_days,
            } => {
                write!(
                    f,
                    "Invalid plan window: start {} must be before exam {} minus {} buffer day(s)",
                    start, exam, buffer_days
                )
            }
            Self::NoAvailability { reason } => {
                write!(f, "No study availability: {}", reason)
            }
            Self::InvalidTemplate { weekday, hours } => {
                write!(f, "Invalid weekly template: {} has {} hours", weekday, hours)
            }
            Self::EmptyTopicSet => write!(f, "Topic set is empty"),
            Self::InvalidTopic { topic_id, reason } => {
                write!(f, "Invalid topic {}: {}", topic_id, reason)
            }
            Self::InvalidTier { value } => {
                write!(f, "Invalid complexity tier '{}'. Use low, medium, high or 1-5", value)
            }
            Self::InvalidOverride { pattern, reason } => {
                write!(f, "Invalid override rule '{}': {}", pattern, reason)
            }
            Self::PlanNotViable {
                required_hours,
                available_hours,
            } => {
                write!(
                    f,
                    "Plan not viable: requires {:.1}h but only {:.1}h available (deficit {:.1}h)",
                    required_hours,
                    available_hours,
                    required_hours - available_hours
                )
            }
            Self::EmptyDistribution => write!(f, "Cannot analyze distribution of an empty topic catalog"),
            Self::UnknownTopic { topic_id } => {
                write!(f, "Session references unknown topic {}", topic_id)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid window error
    pub fn invalid_window(start: NaiveDate, exam: NaiveDate, buffer_days: u32) -> Self {
        Self::InvalidWindow {
            start,
            exam,
            buffer_days,
        }
    }

    /// Create a no availability error
    pub fn no_availability(reason: impl Into<String>) -> Self {
        Self::NoAvailability {
            reason: reason.into(),
        }
    }

    /// Create an invalid topic error
    pub fn invalid_topic(topic_id: u64, reason: impl Into<String>) -> Self {
        Self::InvalidTopic {
            topic_id,
            reason: reason.into(),
        }
    }

    /// Create an invalid tier error
    pub fn invalid_tier(value: impl Into<String>) -> Self {
        Self::InvalidTier {
            value: value.into(),
        }
    }

    /// Create an invalid override error
    pub fn invalid_override(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOverride {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a plan not viable error
    pub fn not_viable(required_hours: f64, available_hours: f64) -> Self {
        Self::PlanNotViable {
            required_hours,
            available_hours,
        }
    }

    /// Hour shortfall for `PlanNotViable`, zero otherwise
    pub fn deficit_hours(&self) -> f64 {
        match self {
            Self::PlanNotViable {
                required_hours,
                available_hours,
            } => (required_hours - available_hours).max(0.0),
            _ => 0.0,
        }
    }

    /// Short machine-readable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidWindow { .. } => "invalid_window",
            Self::NoAvailability { .. } => "no_availability",
            Self::InvalidTemplate { .. } => "invalid_template",
            Self::EmptyTopicSet => "empty_topic_set",
            Self::InvalidTopic { .. } => "invalid_topic",
            Self::InvalidTier { .. } => "invalid_tier",
            Self::InvalidOverride { .. } => "invalid_override",
            Self::PlanNotViable { .. } => "plan_not_viable",
            Self::EmptyDistribution => "empty_distribution",
            Self::UnknownTopic { .. } => "unknown_topic",
        }
    }

    /// Check if the error is a capacity problem rather than malformed input
    ///
    /// Capacity errors are fixed by shrinking scope, raising weekly hours
    /// or extending the window.
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            Self::PlanNotViable { .. } | Self::NoAvailability { .. } | Self::InvalidWindow { .. }
        )
    }
}
