//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_env_id() -> String {
    defaults::env_id().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_selection() -> String {
    defaults::selection().into()
}
fn d_playout() -> String {
    defaults::playout().into()
}
fn d_final_move() -> String {
    defaults::final_move().into()
}
fn d_exploration() -> f64 {
    defaults::exploration()
}
fn d_q_init() -> String {
    defaults::q_init().into()
}
fn d_tree_reuse() -> bool {
    defaults::tree_reuse()
}
fn d_autoplay_seconds() -> f64 {
    defaults::autoplay_seconds()
}
fn d_global_stats() -> bool {
    defaults::global_stats()
}
fn d_global_stats_decay() -> f64 {
    defaults::global_stats_decay()
}
fn d_amaf_selection_weight() -> f64 {
    defaults::amaf_selection_weight()
}
fn d_amaf_playout_weight() -> f64 {
    defaults::amaf_playout_weight()
}
fn d_playout_action_cap() -> usize {
    defaults::playout_action_cap()
}
fn d_playout_epsilon() -> f64 {
    defaults::playout_epsilon()
}
fn d_mast_tau() -> f64 {
    defaults::mast_tau()
}
fn d_grave_bias() -> f64 {
    defaults::grave_bias()
}
fn d_final_temperature() -> f64 {
    defaults::final_temperature()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_dirichlet_epsilon() -> f64 {
    defaults::dirichlet_epsilon()
}
fn d_cheat() -> bool {
    defaults::cheat()
}
fn d_mcts_seed() -> u64 {
    defaults::mcts_seed()
}
fn d_episodes() -> i64 {
    defaults::episodes()
}
fn d_seconds_per_move() -> f64 {
    defaults::seconds_per_move()
}
fn d_iterations_per_move() -> i64 {
    defaults::iterations_per_move()
}
fn d_max_depth() -> usize {
    defaults::max_depth()
}
fn d_actor_seed() -> u64 {
    defaults::actor_seed()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}
fn d_replay_db() -> String {
    defaults::replay_db().into()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub mcts: MctsSection,
    #[serde(default)]
    pub actor: ActorSection,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_env_id")]
    pub env_id: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            env_id: defaults::env_id().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search parameters as written in config.toml.
///
/// Strategy names stay strings here; the search crate parses them into its
/// own enums so this crate does not depend on it.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsSection {
    #[serde(default = "d_selection")]
    pub selection: String,
    #[serde(default = "d_playout")]
    pub playout: String,
    #[serde(default = "d_final_move")]
    pub final_move: String,
    #[serde(default = "d_exploration")]
    pub exploration: f64,
    #[serde(default = "d_q_init")]
    pub q_init: String,
    #[serde(default = "d_tree_reuse")]
    pub tree_reuse: bool,
    /// Time allowance when the root has a single legal move
    #[serde(default = "d_autoplay_seconds")]
    pub autoplay_seconds: f64,
    #[serde(default = "d_global_stats")]
    pub global_stats: bool,
    #[serde(default = "d_global_stats_decay")]
    pub global_stats_decay: f64,
    #[serde(default = "d_amaf_selection_weight")]
    pub amaf_selection_weight: f64,
    #[serde(default = "d_amaf_playout_weight")]
    pub amaf_playout_weight: f64,
    /// Maximum playout length (0 = unlimited)
    #[serde(default = "d_playout_action_cap")]
    pub playout_action_cap: usize,
    #[serde(default = "d_playout_epsilon")]
    pub playout_epsilon: f64,
    #[serde(default = "d_mast_tau")]
    pub mast_tau: f64,
    #[serde(default = "d_grave_bias")]
    pub grave_bias: f64,
    #[serde(default = "d_final_temperature")]
    pub final_temperature: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    #[serde(default = "d_dirichlet_epsilon")]
    pub dirichlet_epsilon: f64,
    /// Force closed-loop trees even for stochastic games
    #[serde(default = "d_cheat")]
    pub cheat: bool,
    /// RNG seed (0 = from entropy)
    #[serde(default = "d_mcts_seed")]
    pub seed: u64,
}

impl Default for MctsSection {
    fn default() -> Self {
        Self {
            selection: defaults::selection().into(),
            playout: defaults::playout().into(),
            final_move: defaults::final_move().into(),
            exploration: defaults::exploration(),
            q_init: defaults::q_init().into(),
            tree_reuse: defaults::tree_reuse(),
            autoplay_seconds: defaults::autoplay_seconds(),
            global_stats: defaults::global_stats(),
            global_stats_decay: defaults::global_stats_decay(),
            amaf_selection_weight: defaults::amaf_selection_weight(),
            amaf_playout_weight: defaults::amaf_playout_weight(),
            playout_action_cap: defaults::playout_action_cap(),
            playout_epsilon: defaults::playout_epsilon(),
            mast_tau: defaults::mast_tau(),
            grave_bias: defaults::grave_bias(),
            final_temperature: defaults::final_temperature(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            dirichlet_epsilon: defaults::dirichlet_epsilon(),
            cheat: defaults::cheat(),
            seed: defaults::mcts_seed(),
        }
    }
}

/// Actor (self-play) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActorSection {
    /// Number of episodes to play (-1 = until interrupted)
    #[serde(default = "d_episodes")]
    pub episodes: i64,
    #[serde(default = "d_seconds_per_move")]
    pub seconds_per_move: f64,
    #[serde(default = "d_iterations_per_move")]
    pub iterations_per_move: i64,
    #[serde(default = "d_max_depth")]
    pub max_depth: usize,
    #[serde(default = "d_actor_seed")]
    pub seed: u64,
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
    /// Replay database file, relative to `common.data_dir`
    #[serde(default = "d_replay_db")]
    pub replay_db: String,
}

impl Default for ActorSection {
    fn default() -> Self {
        Self {
            episodes: defaults::episodes(),
            seconds_per_move: defaults::seconds_per_move(),
            iterations_per_move: defaults::iterations_per_move(),
            max_depth: defaults::max_depth(),
            seed: defaults::actor_seed(),
            log_interval: defaults::log_interval(),
            replay_db: defaults::replay_db().into(),
        }
    }
}
