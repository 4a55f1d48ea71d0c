//! Session materialization
//!
//! Walks the available days and the rotation queue together, stamping each
//! session unit with a date and a sequence number within that day.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::rotation::{required_hours, SessionUnit};
use crate::models::{AvailableDay, StudySession};

/// Tolerance for hour comparisons
const HOURS_EPSILON: f64 = 1e-9;

// ============================================================================
// Density Cap
// ============================================================================

/// One step of the density table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityStep {
    /// Progress fraction at which this step takes effect
    pub from_progress: f64,

    /// Sessions allowed per day from that point on
    pub max_sessions: usize,
}

impl DensityStep {
    pub fn new(from_progress: f64, max_sessions: usize) -> Self {
        Self {
            from_progress,
            max_sessions,
        }
    }
}

/// Progress-scaled cap on sessions per day
///
/// Tight early in the window to spread first exposures, looser as the exam
/// nears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCap {
    steps: Vec<DensityStep>,
}

impl Default for DensityCap {
    fn default() -> Self {
        Self::new(vec![
            DensityStep::new(0.0, 2),
            DensityStep::new(0.5, 3),
            DensityStep::new(0.85, 4),
        ])
    }
}

impl DensityCap {
    /// Build a cap from steps in any order
    pub fn new(mut steps: Vec<DensityStep>) -> Self {
        steps.sort_by(|a, b| a.from_progress.total_cmp(&b.from_progress));
        Self { steps }
    }

    /// Cap that never limits the session count
    pub fn unlimited() -> Self {
        Self::new(vec![DensityStep::new(0.0, usize::MAX)])
    }

    pub fn steps(&self) -> &[DensityStep] {
        &self.steps
    }

    /// Sessions allowed on a day with the given progress
    ///
    /// Uses the last step whose threshold is at or below `progress`, or the
    /// first step when progress precedes every threshold.
    pub fn max_sessions(&self, progress: f64) -> usize {
        self.steps
            .iter()
            .rev()
            .find(|s| s.from_progress <= progress)
            .or_else(|| self.steps.first())
            .map(|s| s.max_sessions)
            .unwrap_or(usize::MAX)
    }
}

// ============================================================================
// Deficit Warning
// ============================================================================

/// Capacity shortfall found while placing sessions
///
/// Attached to an otherwise successful plan: every session is still placed,
/// but the overflow is compressed onto the final available day. The hour
/// fields always satisfy `required_hours == available_hours + overflow_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitWarning {
    /// Hours of the whole session queue
    pub required_hours: f64,

    /// Hours that could be placed under the daily budgets and density cap
    ///
    /// Lower than the raw template total when whole-unit deferral or the
    /// density cap leaves part of a day unused.
    pub available_hours: f64,

    /// Sessions that did not fit and were drained onto the last day
    pub overflow_sessions: usize,
    pub overflow_hours: f64,
}

impl DeficitWarning {
    /// Hours the usable capacity falls short by
    pub fn shortfall_hours(&self) -> f64 {
        (self.required_hours - self.available_hours).max(0.0)
    }

    pub fn message(&self) -> String {
        format!(
            "{:.1}h required but only {:.1}h could be placed: {} session(s) ({:.1}h) were put on the final study day",
            self.required_hours, self.available_hours, self.overflow_sessions, self.overflow_hours
        )
    }
}

/// Output of materialization
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedPlan {
    pub sessions: Vec<StudySession>,
    pub deficit_warning: Option<DeficitWarning>,
}

// ============================================================================
// Session Materializer
// ============================================================================

/// Assigns queued session units to calendar days
#[derive(Debug, Clone, Default)]
pub struct SessionMaterializer {
    cap: DensityCap,
}

impl SessionMaterializer {
    pub fn new(cap: DensityCap) -> Self {
        Self { cap }
    }

    /// Place every queued unit on a day
    ///
    /// Each day takes units from the front of the queue until its hour
    /// budget or density cap is reached. A unit that does not fit whole is
    /// deferred to the next day. A unit longer than every daily budget can
    /// never fit, so it takes the next empty day on its own. Units left over
    /// after the last day are drained onto that day and reported through a
    /// deficit warning.
    pub fn materialize(&self, days: &[AvailableDay], queue: Vec<SessionUnit>) -> MaterializedPlan {
        let required = required_hours(&queue);
        let largest_day = days.iter().map(|d| d.hours).fold(0.0, f64::max);
        let mut queue: VecDeque<SessionUnit> = queue.into();
        let mut sessions = Vec::with_capacity(queue.len());

        for day in days {
            if queue.is_empty() {
                break;
            }

            let cap = self.cap.max_sessions(day.progress);
            let mut used = 0.0;
            let mut sequence = 0;

            while sequence < cap {
                let Some(front) = queue.front() else {
                    break;
                };
                let oversized = front.hours > largest_day + HOURS_EPSILON;
                let fits = used + front.hours <= day.hours + HOURS_EPSILON;
                if !fits && !(oversized && sequence == 0) {
                    break;
                }
                let Some(unit) = queue.pop_front() else {
                    break;
                };
                if oversized {
                    tracing::warn!(
                        "Session of topic {} ({:.1}h) exceeds every daily budget ({:.1}h), placed alone on {}",
                        unit.topic_id,
                        unit.hours,
                        largest_day,
                        day.date
                    );
                }
                used += unit.hours;
                sessions.push(stamp(day, sequence, unit));
                sequence += 1;
                if oversized {
                    break;
                }
            }
        }

        let deficit_warning = if queue.is_empty() {
            None
        } else {
            Some(self.drain(days, queue, &mut sessions, required))
        };

        MaterializedPlan {
            sessions,
            deficit_warning,
        }
    }

    fn drain(
        &self,
        days: &[AvailableDay],
        queue: VecDeque<SessionUnit>,
        sessions: &mut Vec<StudySession>,
        required: f64,
    ) -> DeficitWarning {
        let placed: f64 = sessions.iter().map(|s| s.hours).sum();
        let overflow_sessions = queue.len();
        let overflow_hours: f64 = queue.iter().map(|u| u.hours).sum();

        match days.last() {
            Some(last) => {
                let mut sequence = sessions.iter().filter(|s| s.date == last.date).count();
                for unit in queue {
                    sessions.push(stamp(last, sequence, unit));
                    sequence += 1;
                }
                tracing::warn!(
                    "Coverage deficit: {} unit(s) ({:.1}h) drained onto {}, {:.1}h of {:.1}h placed within budget",
                    overflow_sessions,
                    overflow_hours,
                    last.date,
                    placed,
                    required
                );
            }
            None => {
                tracing::warn!(
                    "Coverage deficit: no available days for {} unit(s)",
                    overflow_sessions
                );
            }
        }

        DeficitWarning {
            required_hours: required,
            available_hours: placed,
            overflow_sessions,
            overflow_hours,
        }
    }
}

fn stamp(day: &AvailableDay, sequence: usize, unit: SessionUnit) -> StudySession {
    StudySession {
        date: day.date,
        topic_id: unit.topic_id,
        topic_title: unit.topic_title,
        part: unit.part,
        session_type: unit.session_type,
        pass: unit.pass,
        hours: unit.hours,
        sequence,
    }
}
