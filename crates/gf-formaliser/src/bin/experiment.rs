//! CLI for running formalisation experiments over a directory of games.
//!
//! # Usage
//!
//! ```bash
//! # Run with a config file
//! cargo run -p gf-formaliser --bin gf-experiment -- --config CONFIG/params.toml
//!
//! # Quick mode (3 attempts, 1 repetition)
//! cargo run -p gf-formaliser --bin gf-experiment -- --quick --game-dir DATA/INPUT
//!
//! # More output
//! RUST_LOG=debug cargo run -p gf-formaliser --bin gf-experiment
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use gf_formaliser::{
    ArtifactStore, BatchSummary, ExperimentConfig, FormalizationLoop, OpenAiClient, SessionId,
};
use gf_solver::SwiplGateway;

/// Config file used when `--config` is not given and the file exists.
const DEFAULT_CONFIG_PATH: &str = "CONFIG/params.toml";

#[derive(Debug, Parser)]
#[command(
    name = "gf-experiment",
    about = "Formalise natural-language game descriptions into Prolog with a solver in the loop"
)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of game descriptions (*.txt)
    #[arg(short, long)]
    game_dir: Option<PathBuf>,

    /// Output root for prompts, axioms and logs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Base Prolog program
    #[arg(short, long)]
    solver: Option<PathBuf>,

    /// Prompt template file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Sessions per game
    #[arg(short, long)]
    repetitions: Option<u32>,

    /// Attempt budget per session
    #[arg(short = 'n', long)]
    max_attempts: Option<u32>,

    /// Generator model
    #[arg(short, long)]
    model: Option<String>,

    /// Quick mode (fewer attempts)
    #[arg(long, conflicts_with = "thorough")]
    quick: bool,

    /// Thorough mode (more repetitions, longer solver timeout)
    #[arg(long)]
    thorough: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            println!();
            println!("{}", summary.format_report());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<BatchSummary> {
    let config = build_config(&args)?;

    let client = OpenAiClient::from_env(config.generator.clone())
        .context("Error creating generator (is OPENAI_API_KEY set?)")?;
    let gateway = SwiplGateway::new(config.gateway_config());
    let store = ArtifactStore::new(&config.paths.out_dir);
    store
        .ensure_layout()
        .await
        .with_context(|| format!("Failed to create {}", store.root().display()))?;

    let mut formaliser = FormalizationLoop::new(
        client,
        gateway,
        store,
        &config.paths.template_path,
        config.loop_config(),
    );

    let games = list_games(&config.paths.game_dir)?;
    tracing::info!(
        games = games.len(),
        repetitions = config.general.repetitions,
        max_attempts = config.general.max_attempts,
        model = %config.generator.model,
        "Experiment starting"
    );

    let mut summary = BatchSummary::new();
    for game in &games {
        let description = match tokio::fs::read_to_string(game).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(game = %game.display(), "Failed to read game description: {e}");
                summary.record_error();
                continue;
            }
        };

        let started = Local::now();
        for repetition in 0..config.general.repetitions {
            let session = SessionId::for_game_file(game, started, repetition);

            // One failing session must not stop the batch.
            match formaliser.run_session(&session, &description).await {
                Ok(report) => {
                    print!("{}", report.format_summary());
                    summary.record(report.outcome);
                }
                Err(e) => {
                    tracing::error!(%session, "Session failed: {e}");
                    summary.record_error();
                }
            }
        }
    }

    Ok(summary)
}

fn build_config(args: &Args) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            ExperimentConfig::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => ExperimentConfig::default(),
    };

    // Presets apply on top of a config file; explicit flags below win.
    if args.quick {
        let quick = ExperimentConfig::quick();
        config.general.repetitions = quick.general.repetitions;
        config.general.max_attempts = config.general.max_attempts.min(quick.general.max_attempts);
    }
    if args.thorough {
        let thorough = ExperimentConfig::thorough();
        config.general.repetitions = thorough.general.repetitions;
        config.solver.timeout_secs = thorough.solver.timeout_secs;
    }
    if let Some(ref dir) = args.game_dir {
        config.paths.game_dir = dir.clone();
    }
    if let Some(ref dir) = args.out_dir {
        config.paths.out_dir = dir.clone();
    }
    if let Some(ref solver) = args.solver {
        config.paths.solver_path = solver.clone();
    }
    if let Some(ref template) = args.template {
        config.paths.template_path = template.clone();
    }
    if let Some(repetitions) = args.repetitions {
        config.general.repetitions = repetitions;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.general.max_attempts = max_attempts;
    }
    if let Some(ref model) = args.model {
        config.generator.model = model.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Game description files, sorted by name.
fn list_games(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read game directory {}", dir.display()))?;

    let mut games = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            games.push(path);
        }
    }
    games.sort();
    Ok(games)
}
