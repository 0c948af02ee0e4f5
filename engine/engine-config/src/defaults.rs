//! Default configuration values loaded from config.defaults.toml.
//!
//! The shared TOML file is embedded at compile time so the binary and the
//! documentation always agree on the built-in values.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: MctsDefaults,
    actor: ActorDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    env_id: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    selection: String,
    playout: String,
    final_move: String,
    exploration: f64,
    q_init: String,
    tree_reuse: bool,
    autoplay_seconds: f64,
    global_stats: bool,
    global_stats_decay: f64,
    amaf_selection_weight: f64,
    amaf_playout_weight: f64,
    playout_action_cap: usize,
    playout_epsilon: f64,
    mast_tau: f64,
    grave_bias: f64,
    final_temperature: f64,
    dirichlet_alpha: f64,
    dirichlet_epsilon: f64,
    cheat: bool,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct ActorDefaults {
    episodes: i64,
    seconds_per_move: f64,
    iterations_per_move: i64,
    max_depth: usize,
    seed: u64,
    log_interval: u32,
    replay_db: String,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn env_id() -> &'static str {
    &DEFAULTS.common.env_id
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// MCTS
pub fn selection() -> &'static str {
    &DEFAULTS.mcts.selection
}
pub fn playout() -> &'static str {
    &DEFAULTS.mcts.playout
}
pub fn final_move() -> &'static str {
    &DEFAULTS.mcts.final_move
}
pub fn exploration() -> f64 {
    DEFAULTS.mcts.exploration
}
pub fn q_init() -> &'static str {
    &DEFAULTS.mcts.q_init
}
pub fn tree_reuse() -> bool {
    DEFAULTS.mcts.tree_reuse
}
pub fn autoplay_seconds() -> f64 {
    DEFAULTS.mcts.autoplay_seconds
}
pub fn global_stats() -> bool {
    DEFAULTS.mcts.global_stats
}
pub fn global_stats_decay() -> f64 {
    DEFAULTS.mcts.global_stats_decay
}
pub fn amaf_selection_weight() -> f64 {
    DEFAULTS.mcts.amaf_selection_weight
}
pub fn amaf_playout_weight() -> f64 {
    DEFAULTS.mcts.amaf_playout_weight
}
pub fn playout_action_cap() -> usize {
    DEFAULTS.mcts.playout_action_cap
}
pub fn playout_epsilon() -> f64 {
    DEFAULTS.mcts.playout_epsilon
}
pub fn mast_tau() -> f64 {
    DEFAULTS.mcts.mast_tau
}
pub fn grave_bias() -> f64 {
    DEFAULTS.mcts.grave_bias
}
pub fn final_temperature() -> f64 {
    DEFAULTS.mcts.final_temperature
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn dirichlet_epsilon() -> f64 {
    DEFAULTS.mcts.dirichlet_epsilon
}
pub fn cheat() -> bool {
    DEFAULTS.mcts.cheat
}
pub fn mcts_seed() -> u64 {
    DEFAULTS.mcts.seed
}

// Actor
pub fn episodes() -> i64 {
    DEFAULTS.actor.episodes
}
pub fn seconds_per_move() -> f64 {
    DEFAULTS.actor.seconds_per_move
}
pub fn iterations_per_move() -> i64 {
    DEFAULTS.actor.iterations_per_move
}
pub fn max_depth() -> usize {
    DEFAULTS.actor.max_depth
}
pub fn actor_seed() -> u64 {
    DEFAULTS.actor.seed
}
pub fn log_interval() -> u32 {
    DEFAULTS.actor.log_interval
}
pub fn replay_db() -> &'static str {
    &DEFAULTS.actor.replay_db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Just accessing these will verify the TOML parses correctly
        assert_eq!(data_dir(), "./data");
        assert_eq!(env_id(), "tictactoe");
        assert_eq!(log_level(), "info");
    }

    #[test]
    fn test_mcts_defaults() {
        assert_eq!(selection(), "ucb1");
        assert_eq!(playout(), "random");
        assert_eq!(final_move(), "robust_child");
        assert!((exploration() - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!((global_stats_decay() - 0.6).abs() < f64::EPSILON);
        assert!((autoplay_seconds() - 0.1).abs() < f64::EPSILON);
        assert_eq!(playout_action_cap(), 0);
        assert!(tree_reuse());
        assert!(!cheat());
    }

    #[test]
    fn test_actor_defaults() {
        assert_eq!(episodes(), 10);
        assert_eq!(iterations_per_move(), 800);
        assert_eq!(max_depth(), 0);
        assert_eq!(replay_db(), "replay.db");
    }
}
