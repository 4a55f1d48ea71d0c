//! Configuration management for studyplan
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files. Every section has defaults, so a config file only needs the
//! values it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::PlanRequest;
use crate::scheduler::materializer::{DensityCap, DensityStep};
use crate::scheduler::normalizer::{PassPolicy, SessionCost};
use crate::scheduler::overrides::OverrideRule;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pass counts and session sizing
    pub planner: PlannerConfig,

    /// Sessions-per-day cap by window progress
    pub density: DensityConfig,

    /// Override rules applied to every request, before request-level rules
    pub overrides: Vec<OverrideRule>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Planner constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Base passes per tier and tested tiers
    pub passes: PassPolicy,

    /// Effort weight to hours conversion
    pub cost: SessionCost,

    /// Buffer applied by the CLI when a request omits one
    pub default_buffer_days: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            passes: PassPolicy::default(),
            cost: SessionCost::default(),
            default_buffer_days: 0,
        }
    }
}

/// Density cap table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub steps: Vec<DensityStep>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            steps: DensityCap::default().steps().to_vec(),
        }
    }
}

impl DensityConfig {
    pub fn to_cap(&self) -> DensityCap {
        DensityCap::new(self.steps.clone())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Overlay environment variables on top of this configuration
    pub fn apply_env(&mut self) {
        if let Some(hours) = env_parse::<f64>("STUDYPLAN_SESSION_HOURS") {
            self.planner.cost.session_hours = hours;
        }

        if let Some(granularity) = env_parse::<f64>("STUDYPLAN_GRANULARITY_HOURS") {
            self.planner.cost.granularity_hours = granularity;
        }

        if let Some(buffer) = env_parse::<u32>("STUDYPLAN_BUFFER_DAYS") {
            self.planner.default_buffer_days = buffer;
        }

        if let Ok(level) = std::env::var("STUDYPLAN_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("STUDYPLAN_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Fill request fields the caller left unset
    ///
    /// Only a missing buffer takes the default; an explicit `0` is kept.
    pub fn apply_request_defaults(&self, request: &mut PlanRequest) {
        if request.window.buffer_days.is_none() {
            request.window.buffer_days = Some(self.planner.default_buffer_days);
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let cost = &self.planner.cost;
        if !(cost.session_hours.is_finite() && cost.session_hours > 0.0) {
            anyhow::bail!("session_hours must be positive");
        }

        if !(cost.granularity_hours.is_finite() && cost.granularity_hours > 0.0) {
            anyhow::bail!("granularity_hours must be positive");
        }

        let passes = &self.planner.passes;
        if passes.low == 0 || passes.medium == 0 || passes.high == 0 {
            anyhow::bail!("base passes must be at least 1 for every tier");
        }

        if self.density.steps.is_empty() {
            anyhow::bail!("density table must have at least one step");
        }

        for step in &self.density.steps {
            if !(0.0..=1.0).contains(&step.from_progress) {
                anyhow::bail!(
                    "density step threshold {} is outside 0.0..=1.0",
                    step.from_progress
                );
            }
            if step.max_sessions == 0 {
                anyhow::bail!("density step at {} allows zero sessions", step.from_progress);
            }
        }

        let monotonic = self.density.steps.windows(2).all(|w| {
            w[0].from_progress < w[1].from_progress && w[0].max_sessions <= w[1].max_sessions
        });
        if !monotonic {
            anyhow::bail!("density steps must be listed by increasing progress and never tighten");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
