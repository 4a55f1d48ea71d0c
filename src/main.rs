use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{AnalyzeParams, GenerateParams};

#[derive(Parser)]
#[command(
    name = "studyplan",
    version,
    about = "Study plan generator with rotation scheduling and distribution analysis",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a study calendar from a request file
    Generate {
        /// Request file (TOML or JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Write the generated sessions to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON instead of a calendar
        #[arg(long, default_value = "false")]
        json: bool,

        /// Store and regenerate the plan in this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Plan owner when using --db
        #[arg(long, default_value = "local")]
        user: String,

        /// Print Prometheus metrics after generating
        #[arg(long, default_value = "false")]
        metrics: bool,
    },

    /// Report how sessions are distributed across complexity tiers
    Analyze {
        /// Request file (TOML or JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Previously generated sessions (JSON); generated fresh when omitted
        #[arg(short, long)]
        sessions: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List study-eligible days with hour budgets and progress
    Days {
        /// Request file (TOML or JSON)
        #[arg(short, long)]
        request: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!("studyplan starting");

    match cli.command {
        Commands::Generate {
            request,
            output,
            json,
            db,
            user,
            metrics,
        } => {
            tracing::info!(
                request = %request.display(),
                output = ?output,
                db = ?db,
                "Starting generate command"
            );
            commands::generate(
                &config,
                GenerateParams {
                    request,
                    output,
                    json,
                    db,
                    user,
                    metrics,
                },
            )?;
        }

        Commands::Analyze {
            request,
            sessions,
            json,
        } => {
            tracing::info!(
                request = %request.display(),
                sessions = ?sessions,
                "Starting analyze command"
            );
            commands::analyze(
                &config,
                AnalyzeParams {
                    request,
                    sessions,
                    json,
                },
            )?;
        }

        Commands::Days { request } => {
            tracing::info!(request = %request.display(), "Starting days command");
            commands::days(&config, &request)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("studyplan=debug,warn")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("studyplan={level},warn"))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studyplan=info,warn"))
    };

    // Logs go to stderr so calendar and JSON output stay clean on stdout
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
