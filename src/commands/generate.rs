use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use studyplan::config::Config;
use studyplan::coordinator::PlanCoordinator;
use studyplan::metrics;
use studyplan::models::{PlanRequest, StudySession};
use studyplan::scheduler::{DeficitWarning, PlanGenerator};
use studyplan::storage::{PlanRepository, SqlitePlanRepository};
use studyplan::utils::{format_hours, truncate_text};

use super::load_request;

/// Parameters for the generate command
pub struct GenerateParams {
    pub request: PathBuf,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub db: Option<PathBuf>,
    pub user: String,
    pub metrics: bool,
}

pub fn generate(config: &Config, params: GenerateParams) -> Result<()> {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed: {}", e);
    }

    let request = load_request(&params.request, config)?;
    let generator = PlanGenerator::from_config(config);

    let (sessions, deficit_warning, summary) = match &params.db {
        Some(db) => generate_stored(db, &params.user, generator, request)?,
        None => generate_once(&generator, &request)?,
    };

    if let Some(path) = &params.output {
        let json = serde_json::to_string_pretty(&sessions)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write sessions: {}", path.display()))?;
        tracing::info!(path = %path.display(), count = sessions.len(), "Sessions written");
    }

    if params.json {
        let body = serde_json::json!({
            "summary": summary,
            "deficit_warning": deficit_warning,
            "sessions": sessions,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_calendar(&sessions);
        println!();
        println!("{}", summary);
        if let Some(warning) = &deficit_warning {
            println!("WARNING: {}", warning.message());
        }
    }

    if params.metrics {
        let text = metrics::encode_metrics().map_err(|e| anyhow::anyhow!("{e}"))?;
        println!("{text}");
    }

    Ok(())
}

fn generate_once(
    generator: &PlanGenerator,
    request: &PlanRequest,
) -> Result<(Vec<StudySession>, Option<DeficitWarning>, String)> {
    let _timer = metrics::start_generation_timer();

    let plan = match generator.generate(request) {
        Ok(plan) => plan,
        Err(e) => {
            metrics::record_generation_failure(e.kind());
            return Err(e).context("Plan generation failed");
        }
    };

    let hours: f64 = plan.sessions.iter().map(|s| s.hours).sum();
    metrics::record_generation(
        plan.sessions.len(),
        hours,
        plan.deficit_warning.as_ref().map(|w| w.overflow_hours),
    );

    let summary = format!(
        "{} sessions, {} of {} available over {} days ({} units)",
        plan.sessions.len(),
        format_hours(plan.required_hours),
        format_hours(plan.available_hours),
        plan.eligible_days,
        plan.unit_count
    );
    Ok((plan.sessions, plan.deficit_warning, summary))
}

fn generate_stored(
    db: &Path,
    user: &str,
    generator: PlanGenerator,
    request: PlanRequest,
) -> Result<(Vec<StudySession>, Option<DeficitWarning>, String)> {
    let repo = Arc::new(SqlitePlanRepository::new(db)?);
    let coordinator = PlanCoordinator::new(repo.clone(), generator);

    let existing = repo.plans_for_user(user)?.pop();
    let plan_id = match existing {
        Some(plan) => {
            coordinator.update_request(plan.id, request)?;
            plan.id
        }
        None => coordinator.create_plan(user, request)?,
    };

    let report = coordinator
        .generate(plan_id)
        .with_context(|| format!("Generation failed for plan {plan_id}"))?;
    let plan = repo.get_plan(plan_id)?;

    let summary = format!(
        "Plan {} ({}): {} sessions{}",
        plan_id,
        report.status,
        report.session_count,
        if report.unchanged { ", unchanged" } else { "" }
    );
    Ok((plan.sessions, report.deficit_warning, summary))
}

fn print_calendar(sessions: &[StudySession]) {
    let mut current = None;
    for session in sessions {
        if current != Some(session.date) {
            current = Some(session.date);
            println!();
            println!("{} ({})", session.date, session.date.format("%a"));
            println!("{:-<56}", "");
        }
        println!(
            "  {}. [{:<6}] {:<36} {:>5}",
            session.sequence + 1,
            session.session_type.label(),
            truncate_text(&session.unit_label(), 36),
            format_hours(session.hours)
        );
    }
}
