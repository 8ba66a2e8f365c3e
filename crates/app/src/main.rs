//! Headless driver for Antipas production sessions.
//!
//! Runs a session through the same commands a view would call and prints the
//! resulting snapshot, using the simulated job backend.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use antipas_core::{AudioSource, AudioVariant, JobStatus, SessionDraft, Stage};
use antipas_runtime::commands::{
    session_get_state, session_start, stage_refine, stage_select, variant_select,
};
use antipas_runtime::{AppState, JobRunner, SimulatedBackend, stage_catalog};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "antipas")]
#[command(about = "Drive an Antipas production session from the command line")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true, env = "ANTIPAS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the production stages and their producer prompts
    Stages,
    /// Start a session and refine stages with the simulated backend
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long)]
    genre: Option<String>,

    #[arg(long)]
    platform: Option<String>,

    #[arg(long)]
    style: Option<String>,

    /// Uploaded vocal file name
    #[arg(long, default_value = "vocal.wav", conflicts_with = "recorded")]
    file: String,

    /// Treat the vocal as recorded in-app rather than uploaded
    #[arg(long)]
    recorded: bool,

    /// Stages to refine, in order (default: all)
    #[arg(long, value_delimiter = ',')]
    stages: Option<Vec<Stage>>,

    /// Probability that a simulated job fails (0.0 - 1.0)
    #[arg(long)]
    fail_rate: Option<f64>,

    /// A/B variant to leave selected at the end
    #[arg(long)]
    variant: Option<AudioVariant>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "antipas=info,antipas_runtime=info,antipas_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Stages => print_stages(),
        Command::Simulate(args) => simulate(args, &config).await?,
    }
    Ok(())
}

fn print_stages() {
    for info in stage_catalog() {
        println!("{} ({})", info.title, info.key);
        println!("  {}", info.description);
        println!("  {} [{}]", info.prompt, info.options.join(", "));
    }
}

async fn simulate(args: SimulateArgs, config: &Config) -> Result<()> {
    let mut simulation = config.simulation();
    if let Some(rate) = args.fail_rate {
        simulation.failure_rate = rate.clamp(0.0, 1.0);
    }

    let source = if args.recorded {
        AudioSource::Recording { reference: None }
    } else {
        AudioSource::Upload { file_name: args.file }
    };
    let source_name = source.display_name().to_string();
    let draft = SessionDraft::new()
        .genre(args.genre.unwrap_or_else(|| config.session.genre.clone()))
        .platform(args.platform.unwrap_or_else(|| config.session.platform.clone()))
        .style(args.style.unwrap_or_else(|| config.session.style.clone()))
        .source(source);

    let state = Arc::new(AppState::new());
    state.lock()?.subscribe(|session| {
        debug!(
            stage = %session.stage(),
            status = %session.job_status(session.stage()),
            versions = session.versions().len(),
            "session updated"
        );
    });
    let runner = JobRunner::new(state.clone(), Arc::new(SimulatedBackend::new(simulation)));

    let started = session_start(draft, &state).context("failed to start session")?;
    if let Some(meta) = &started.meta {
        info!(
            session = %meta.id,
            details = %meta.subtitle(),
            source = %source_name,
            "session started"
        );
    }

    let stages = args.stages.unwrap_or_else(|| Stage::ALL.to_vec());
    for stage in stages {
        stage_select(stage, &state)?;
        let ticket = stage_refine(&runner).with_context(|| format!("failed to refine {stage}"))?;
        ticket.wait().await;

        let snapshot = session_get_state(&state)?;
        match snapshot.job_status_by_stage.get(&stage) {
            Some(JobStatus::Failed) => warn!(
                %stage,
                error = snapshot.error_by_stage.get(&stage).map(String::as_str).unwrap_or(""),
                "stage failed"
            ),
            _ => {
                let version = snapshot
                    .active_version_id_by_stage
                    .get(&stage)
                    .map(String::as_str)
                    .unwrap_or("");
                info!(%stage, version, "stage refined")
            }
        }
    }

    if let Some(variant) = args.variant {
        variant_select(variant, &state)?;
    }

    let snapshot = session_get_state(&state)?;
    let json = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{json}");
    Ok(())
}
