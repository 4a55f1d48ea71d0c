//! Availability builder
//!
//! Turns a weekly hour template and a plan window into the ordered list of
//! days that can carry study sessions.

use chrono::Datelike;

use super::error::{SchedulerError, SchedulerResult};
use crate::models::{AvailableDay, PlanWindow, WeeklyTemplate};

/// Builds the study-eligible day list for a plan window
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityBuilder;

impl AvailabilityBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build available days from `window.start` through `exam - buffer`
    ///
    /// Weekdays with zero template hours are skipped. Each day carries its
    /// hour budget and a progress fraction measured from the window start
    /// to the last eligible day.
    ///
    /// # Errors
    /// - `InvalidTemplate` for negative or non-finite hours
    /// - `InvalidWindow` when start is not before `exam - buffer`
    /// - `NoAvailability` when no day in the window has hours
    pub fn build(&self, window: &PlanWindow, template: &WeeklyTemplate) -> SchedulerResult<Vec<AvailableDay>> {
        validate_template(template)?;

        let last = window
            .last_eligible_date()
            .filter(|last| window.start < *last)
            .ok_or_else(|| SchedulerError::invalid_window(window.start, window.exam, window.buffer()))?;

        if template.weekly_total() <= 0.0 {
            return Err(SchedulerError::no_availability(
                "every weekday in the template has zero hours",
            ));
        }

        let eligible: Vec<_> = window
            .start
            .iter_days()
            .take_while(|date| *date <= last)
            .filter_map(|date| {
                let hours = template.hours_for(date.weekday());
                (hours > 0.0).then_some((date, hours))
            })
            .collect();

        let Some(&(last_day, _)) = eligible.last() else {
            return Err(SchedulerError::no_availability(format!(
                "no weekday with hours falls between {} and {}",
                window.start, last
            )));
        };

        let span = (last_day - window.start).num_days();
        let days: Vec<_> = eligible
            .into_iter()
            .map(|(date, hours)| {
                let progress = if span == 0 {
                    1.0
                } else {
                    (date - window.start).num_days() as f64 / span as f64
                };
                AvailableDay::new(date, hours, progress)
            })
            .collect();

        tracing::debug!(
            "Built {} available days ({} through {}, {:.1}h total)",
            days.len(),
            window.start,
            last,
            total_hours(&days)
        );

        Ok(days)
    }
}

/// Total hour budget across days
pub fn total_hours(days: &[AvailableDay]) -> f64 {
    days.iter().map(|d| d.hours).sum()
}

fn validate_template(template: &WeeklyTemplate) -> SchedulerResult<()> {
    for (weekday, hours) in template.entries() {
        if !hours.is_finite() || hours < 0.0 {
            return Err(SchedulerError::InvalidTemplate {
                weekday: weekday.to_string(),
                hours,
            });
        }
    }
    Ok(())
}
