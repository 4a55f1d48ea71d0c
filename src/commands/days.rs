use anyhow::{Context, Result};
use std::path::Path;

use studyplan::config::Config;
use studyplan::scheduler::availability::total_hours;
use studyplan::scheduler::{AvailabilityBuilder, PlanGenerator};
use studyplan::utils::format_hours;

use super::load_request;

pub fn days(config: &Config, request: &Path) -> Result<()> {
    let request = load_request(request, config)?;
    let days = AvailabilityBuilder::new()
        .build(&request.window, &request.template)
        .context("Failed to build availability")?;
    let density = PlanGenerator::from_config(config).density().clone();

    println!(
        "Available days: {} through {} (exam {}, buffer {} days)",
        request.window.start,
        days.last().map(|d| d.date).unwrap_or(request.window.start),
        request.window.exam,
        request.window.buffer()
    );
    println!("================================");

    for day in &days {
        println!(
            "  {} {}  {:>5}  progress {:>4.0}%  max {} sessions",
            day.date,
            day.weekday,
            format_hours(day.hours),
            day.progress * 100.0,
            density.max_sessions(day.progress)
        );
    }

    println!();
    println!(
        "{} days, {} total",
        days.len(),
        format_hours(total_hours(&days))
    );
    Ok(())
}
