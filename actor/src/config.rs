//! Configuration for the self-play actor
//!
//! Defaults come from the central config (config.toml plus `GAMUT_*`
//! environment overrides). CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig, MctsSection};
use mcts::{FinalMoveKind, MctsConfig, PlayoutKind, QInit, SelectionKind};
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_env_id() -> String {
    CENTRAL_CONFIG.common.env_id.clone()
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_replay_db_path() -> String {
    format!(
        "{}/{}",
        CENTRAL_CONFIG.common.data_dir, CENTRAL_CONFIG.actor.replay_db
    )
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Gamut Actor - MCTS self-play runner")]
#[command(
    long_about = "Plays MCTS-vs-MCTS episodes of a registered game and stores
imitation-learning samples in a SQLite replay database.

Configuration is loaded from config.toml with GAMUT_<SECTION>_<KEY>
environment overrides. CLI arguments take highest priority."
)]
pub struct Config {
    /// Unique actor identifier, used as the episode id prefix
    #[arg(long, default_value = "actor-1")]
    pub actor_id: String,

    /// Game to play (e.g., tictactoe)
    #[arg(long, default_value_t = default_env_id())]
    pub env_id: String,

    /// Episodes to play (-1 for unlimited)
    #[arg(long, allow_hyphen_values = true, default_value_t = CENTRAL_CONFIG.actor.episodes)]
    pub episodes: i64,

    /// Search time per move in seconds (0 or negative for no time limit)
    #[arg(long, allow_hyphen_values = true, default_value_t = CENTRAL_CONFIG.actor.seconds_per_move)]
    pub seconds_per_move: f64,

    /// Search iterations per move (negative for no iteration limit)
    #[arg(long, allow_hyphen_values = true, default_value_t = CENTRAL_CONFIG.actor.iterations_per_move)]
    pub iterations_per_move: i64,

    /// Maximum selection depth (0 for unlimited)
    #[arg(long, default_value_t = CENTRAL_CONFIG.actor.max_depth)]
    pub max_depth: usize,

    /// Seed for episode contexts
    #[arg(long, default_value_t = CENTRAL_CONFIG.actor.seed)]
    pub seed: u64,

    /// Selection strategy (ucb1, ucb1_grave, puct, regularized)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.selection.clone())]
    pub selection: String,

    /// Playout strategy (random, softmax, mast)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.playout.clone())]
    pub playout: String,

    /// Final move strategy (robust_child, max_avg_score, proportional_exp_visit_count, regularized)
    #[arg(long, default_value_t = CENTRAL_CONFIG.mcts.final_move.clone())]
    pub final_move: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Log progress every N episodes (0 to disable)
    #[arg(long, default_value_t = CENTRAL_CONFIG.actor.log_interval)]
    pub log_interval: u32,

    /// Path to SQLite replay database
    #[arg(long, default_value_t = default_replay_db_path())]
    pub replay_db_path: String,

    /// Directory for actor_stats.json
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Remaining search parameters, taken from the central config only
    #[arg(skip = CENTRAL_CONFIG.mcts.clone())]
    pub mcts: MctsSection,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.actor_id.is_empty() {
            return Err(anyhow!("actor_id cannot be empty"));
        }

        if self.env_id.is_empty() {
            return Err(anyhow!("env_id cannot be empty"));
        }

        if self.episodes == 0 {
            return Err(anyhow!("episodes must be positive or -1 for unlimited"));
        }

        if self.seconds_per_move <= 0.0 && self.iterations_per_move < 0 {
            return Err(anyhow!(
                "per-move budget is unbounded: set seconds_per_move > 0 or iterations_per_move >= 0"
            ));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.mcts_config()?;
        Ok(())
    }

    /// Search configuration for one agent.
    ///
    /// The strategy names given on the command line replace the ones from
    /// the central config.
    pub fn mcts_config(&self) -> Result<MctsConfig> {
        let section = &self.mcts;
        Ok(MctsConfig {
            selection: self.selection.parse::<SelectionKind>()?,
            playout: self.playout.parse::<PlayoutKind>()?,
            final_move: self.final_move.parse::<FinalMoveKind>()?,
            exploration: section.exploration,
            q_init: section.q_init.parse::<QInit>()?,
            tree_reuse: section.tree_reuse,
            autoplay_seconds: section.autoplay_seconds,
            global_stats: section.global_stats,
            global_stats_decay: section.global_stats_decay,
            amaf_selection_weight: section.amaf_selection_weight,
            amaf_playout_weight: section.amaf_playout_weight,
            playout_action_cap: section.playout_action_cap,
            playout_epsilon: section.playout_epsilon,
            mast_tau: section.mast_tau,
            grave_bias: section.grave_bias,
            final_temperature: section.final_temperature,
            dirichlet_alpha: section.dirichlet_alpha,
            dirichlet_epsilon: section.dirichlet_epsilon,
            cheat: section.cheat,
            seed: (section.seed != 0).then_some(section.seed),
        })
    }
}
