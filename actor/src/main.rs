//! Actor - MCTS self-play runner for Gamut
//!
//! A process that:
//! 1. Plays self-play episodes of a registered game with one MCTS agent per seat
//! 2. Saves every searched position to `./data/replay.db` (SQLite)
//! 3. Writes running totals to `./data/actor_stats.json`
//!
//! Ctrl-C interrupts the search in progress and stops the actor.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_core::Game;
use games_tictactoe::TicTacToe;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod actor;
mod config;
mod replay;
mod stats;

use crate::actor::Actor;
use crate::config::Config;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Run an actor for `game` on a blocking thread until it finishes or
/// Ctrl-C arrives.
async fn launch<G: Game>(config: Config, game: Arc<G>) -> Result<()> {
    let mut actor = Actor::new(config, game)?;
    let shutdown = actor.shutdown_handle();

    // Setup graceful shutdown
    let shutdown_task = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping actor...");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to listen for ctrl+c: {}", e),
        }
    });

    // Searches are CPU-bound, keep them off the async workers
    let run_result = tokio::task::spawn_blocking(move || actor.run()).await?;

    shutdown_task.abort();
    run_result
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let episodes = if config.episodes < 0 {
        "unlimited".to_string()
    } else {
        config.episodes.to_string()
    };
    info!(
        "Starting actor {} for environment {} ({} episodes)",
        config.actor_id, config.env_id, episodes
    );

    let result = match config.env_id.as_str() {
        games_tictactoe::ENV_ID => launch(config, Arc::new(TicTacToe::new())).await,
        other => Err(anyhow!("Game '{}' not registered", other)),
    };

    match result {
        Ok(()) => {
            info!("Actor completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Actor failed: {}", e);
            Err(e)
        }
    }
}
