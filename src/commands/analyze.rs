use anyhow::{Context, Result};
use std::path::PathBuf;

use studyplan::config::Config;
use studyplan::scheduler::{DistributionAnalyzer, PlanGenerator};

use super::{load_request, load_sessions};

/// Parameters for the analyze command
pub struct AnalyzeParams {
    pub request: PathBuf,
    pub sessions: Option<PathBuf>,
    pub json: bool,
}

pub fn analyze(config: &Config, params: AnalyzeParams) -> Result<()> {
    let request = load_request(&params.request, config)?;

    let sessions = match &params.sessions {
        Some(path) => load_sessions(path)?,
        None => {
            PlanGenerator::from_config(config)
                .generate(&request)
                .context("Plan generation failed")?
                .sessions
        }
    };

    let report = DistributionAnalyzer::new()
        .analyze(&sessions, &request.topics)
        .context("Distribution analysis failed")?;

    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.display());
    }

    Ok(())
}
