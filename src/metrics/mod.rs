//! Prometheus metrics for plan generation
//!
//! This module provides metrics tracking for:
//! - Generation outcomes (active, deficit, failed by error kind)
//! - Sessions emitted and hours scheduled
//! - Generation duration
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all generation metrics
struct GenerationMetrics {
    generations: CounterVec,
    sessions_emitted: Counter,
    hours_scheduled: Counter,
    deficit_hours: Counter,
    duration: Histogram,
}

/// Global storage for generation metrics
static GENERATION_METRICS: OnceLock<GenerationMetrics> = OnceLock::new();

/// Serializes registration against the global registry
static INIT_LOCK: Mutex<()> = Mutex::new(());

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once. If metric registration fails, subsequent
/// metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = studyplan::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
///     // Application can continue without metrics
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if GENERATION_METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = GenerationMetrics {
        generations: register_counter_vec!(
            "studyplan_generations_total",
            "Plan generations by outcome",
            &["outcome"]
        )?,
        sessions_emitted: register_counter!(
            "studyplan_sessions_emitted_total",
            "Study sessions produced by successful generations"
        )?,
        hours_scheduled: register_counter!(
            "studyplan_hours_scheduled_total",
            "Study hours placed by successful generations"
        )?,
        deficit_hours: register_counter!(
            "studyplan_deficit_hours_total",
            "Hours drained onto the final day because of coverage deficits"
        )?,
        duration: register_histogram!(
            "studyplan_generation_duration_seconds",
            "Time spent generating a plan in seconds",
            vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
        )?,
    };

    GENERATION_METRICS
        .set(metrics)
        .map_err(|_| "Generation metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    GENERATION_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a successful generation
///
/// `deficit_hours` is the overflow drained onto the last day, if any.
pub fn record_generation(sessions: usize, hours: f64, deficit_hours: Option<f64>) {
    let Some(m) = GENERATION_METRICS.get() else {
        return;
    };

    let outcome = if deficit_hours.is_some() { "deficit" } else { "active" };
    m.generations.with_label_values(&[outcome]).inc();
    m.sessions_emitted.inc_by(sessions as f64);
    m.hours_scheduled.inc_by(hours);

    if let Some(deficit) = deficit_hours {
        m.deficit_hours.inc_by(deficit);
    }
}

/// Record a failed generation by error kind
pub fn record_generation_failure(kind: &str) {
    if let Some(m) = GENERATION_METRICS.get() {
        let outcome = format!("failed:{kind}");
        m.generations.with_label_values(&[outcome.as_str()]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a generation timer (returns a timer handle)
pub fn start_generation_timer() -> MetricsTimer {
    match GENERATION_METRICS.get() {
        Some(m) => MetricsTimer::new(m.duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
