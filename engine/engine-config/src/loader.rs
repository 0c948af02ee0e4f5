//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "GAMUT_CONFIG";

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by the GAMUT_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_PATH_VAR, path.display());
            return load_from_path(path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_PATH_VAR,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults with a
/// warning; environment overrides are applied either way.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (i64, u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: GAMUT_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.env_id, "GAMUT_COMMON_ENV_ID");
    env_override!(config, common.data_dir, "GAMUT_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "GAMUT_COMMON_LOG_LEVEL");

    // MCTS
    env_override!(config, mcts.selection, "GAMUT_MCTS_SELECTION");
    env_override!(config, mcts.playout, "GAMUT_MCTS_PLAYOUT");
    env_override!(config, mcts.final_move, "GAMUT_MCTS_FINAL_MOVE");
    env_override!(config, mcts.exploration, "GAMUT_MCTS_EXPLORATION", parse);
    env_override!(config, mcts.q_init, "GAMUT_MCTS_Q_INIT");
    env_override!(config, mcts.tree_reuse, "GAMUT_MCTS_TREE_REUSE", parse);
    env_override!(
        config,
        mcts.autoplay_seconds,
        "GAMUT_MCTS_AUTOPLAY_SECONDS",
        parse
    );
    env_override!(config, mcts.global_stats, "GAMUT_MCTS_GLOBAL_STATS", parse);
    env_override!(
        config,
        mcts.global_stats_decay,
        "GAMUT_MCTS_GLOBAL_STATS_DECAY",
        parse
    );
    env_override!(
        config,
        mcts.amaf_selection_weight,
        "GAMUT_MCTS_AMAF_SELECTION_WEIGHT",
        parse
    );
    env_override!(
        config,
        mcts.amaf_playout_weight,
        "GAMUT_MCTS_AMAF_PLAYOUT_WEIGHT",
        parse
    );
    env_override!(
        config,
        mcts.playout_action_cap,
        "GAMUT_MCTS_PLAYOUT_ACTION_CAP",
        parse
    );
    env_override!(
        config,
        mcts.playout_epsilon,
        "GAMUT_MCTS_PLAYOUT_EPSILON",
        parse
    );
    env_override!(config, mcts.mast_tau, "GAMUT_MCTS_MAST_TAU", parse);
    env_override!(config, mcts.grave_bias, "GAMUT_MCTS_GRAVE_BIAS", parse);
    env_override!(
        config,
        mcts.final_temperature,
        "GAMUT_MCTS_FINAL_TEMPERATURE",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "GAMUT_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.dirichlet_epsilon,
        "GAMUT_MCTS_DIRICHLET_EPSILON",
        parse
    );
    env_override!(config, mcts.cheat, "GAMUT_MCTS_CHEAT", parse);
    env_override!(config, mcts.seed, "GAMUT_MCTS_SEED", parse);

    // Actor
    env_override!(config, actor.episodes, "GAMUT_ACTOR_EPISODES", parse);
    env_override!(
        config,
        actor.seconds_per_move,
        "GAMUT_ACTOR_SECONDS_PER_MOVE",
        parse
    );
    env_override!(
        config,
        actor.iterations_per_move,
        "GAMUT_ACTOR_ITERATIONS_PER_MOVE",
        parse
    );
    env_override!(config, actor.max_depth, "GAMUT_ACTOR_MAX_DEPTH", parse);
    env_override!(config, actor.seed, "GAMUT_ACTOR_SEED", parse);
    env_override!(
        config,
        actor.log_interval,
        "GAMUT_ACTOR_LOG_INTERVAL",
        parse
    );
    env_override!(config, actor.replay_db, "GAMUT_ACTOR_REPLAY_DB");

    config
}
