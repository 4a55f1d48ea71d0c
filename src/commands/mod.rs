pub mod analyze;
pub mod days;
pub mod generate;

use anyhow::{Context, Result};
use std::path::Path;

use studyplan::config::Config;
use studyplan::models::{PlanRequest, StudySession};

// Re-export command functions for convenience
pub use analyze::{analyze, AnalyzeParams};
pub use days::days;
pub use generate::{generate, GenerateParams};

/// Load configuration: file (or defaults), then environment, then validate
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load a plan request from TOML or JSON, chosen by file extension
///
/// A request without a buffer picks up the configured default.
pub fn load_request(path: &Path, config: &Config) -> Result<PlanRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;

    let mut request: PlanRequest = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON request: {}", path.display()))?,
        _ => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML request: {}", path.display()))?,
    };

    config.apply_request_defaults(&mut request);

    tracing::debug!(
        topics = request.topics.len(),
        overrides = request.overrides.len(),
        "Request loaded"
    );
    Ok(request)
}

/// Load a JSON session list written by `generate --output`
pub fn load_sessions(path: &Path) -> Result<Vec<StudySession>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sessions file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sessions file: {}", path.display()))
}
