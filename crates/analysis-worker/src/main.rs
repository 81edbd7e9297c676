//! Tactic Trainer Analysis Worker
//!
//! Reads a batch of games, searches every candidate position on a local
//! executor pool and writes the selected tactics as JSON.

use std::path::PathBuf;

use analysis_worker::pipeline::parse_games;
use analysis_worker::{TacticPipeline, WorkerConfig};
use clap::Parser;
use tracing::{info, warn};

/// Generate tactical puzzles from played games.
#[derive(Parser)]
#[command(name = "analysis-worker")]
#[command(about = "Extracts engine-confirmed tactics from a batch of games")]
struct Args {
    /// JSON array of game records, or a multi-game PGN file
    #[arg(long)]
    games: PathBuf,

    /// Search depth in plies (overrides SEARCH_DEPTH)
    #[arg(long)]
    depth: Option<u8>,

    /// Write the tactics here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = WorkerConfig::load()?;
    let depth = args.depth.unwrap_or(config.depth);

    let games = parse_games(&std::fs::read_to_string(&args.games)?)?;
    if games.is_empty() {
        warn!(path = %args.games.display(), "No games found in input");
    }
    info!(
        games = games.len(),
        depth,
        workers = config.workers,
        batch_size = config.pipeline.batch_size,
        "Starting tactic generation"
    );

    let pipeline = TacticPipeline::from_config(&config)?;
    let report = pipeline
        .generate_report(&games, depth, |percent, status| {
            info!(percent, "{status}");
        })
        .await;

    info!(
        tactics = report.tactics.len(),
        candidates = report.candidates,
        duplicates = report.duplicates_skipped,
        failed = report.analyses_failed,
        "{}",
        report.status
    );

    let json = serde_json::to_string_pretty(&report.tactics)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!(path = %path.display(), "Tactics written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
