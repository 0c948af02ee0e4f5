//! Tests for the configuration module.

use super::*;
use std::sync::Mutex;

// Tests touching process environment variables must not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.env_id, "tictactoe");
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.actor.episodes, 10);
    assert_eq!(config.mcts.selection, "ucb1");
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.mcts.playout, "random");
    assert_eq!(config.mcts.final_move, "robust_child");
    assert_eq!(config.mcts.q_init, "optimistic");
    assert!(config.mcts.tree_reuse);
    assert!(!config.mcts.global_stats);
    assert!((config.mcts.global_stats_decay - 0.6).abs() < f64::EPSILON);
    assert!((config.mcts.amaf_selection_weight - 1.0).abs() < f64::EPSILON);
    assert!((config.mcts.amaf_playout_weight - 1.0).abs() < f64::EPSILON);
    assert!((config.mcts.dirichlet_epsilon - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.mcts.seed, 0);
}

#[test]
fn test_actor_defaults() {
    let config = CentralConfig::default();
    assert!((config.actor.seconds_per_move - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.actor.iterations_per_move, 800);
    assert_eq!(config.actor.max_depth, 0);
    assert_eq!(config.actor.seed, 42);
    assert_eq!(config.actor.log_interval, 1);
    assert_eq!(config.actor.replay_db, "replay.db");
}

#[test]
fn test_gamut_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("GAMUT_COMMON_ENV_ID", "hex");
    std::env::set_var("GAMUT_ACTOR_EPISODES", "7");
    std::env::set_var("GAMUT_MCTS_EXPLORATION", "0.5");
    std::env::set_var("GAMUT_MCTS_TREE_REUSE", "false");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.common.env_id, "hex");
    assert_eq!(config.actor.episodes, 7);
    assert!((config.mcts.exploration - 0.5).abs() < f64::EPSILON);
    assert!(!config.mcts.tree_reuse);

    std::env::remove_var("GAMUT_COMMON_ENV_ID");
    std::env::remove_var("GAMUT_ACTOR_EPISODES");
    std::env::remove_var("GAMUT_MCTS_EXPLORATION");
    std::env::remove_var("GAMUT_MCTS_TREE_REUSE");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("GAMUT_ACTOR_MAX_DEPTH", "deep");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.actor.max_depth, 0);

    std::env::remove_var("GAMUT_ACTOR_MAX_DEPTH");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
env_id = "tictactoe"
data_dir = "/custom/data"

[mcts]
selection = "ucb1_grave"
playout = "mast"
global_stats = true
exploration = 0.7

[actor]
episodes = 100
seconds_per_move = 0.25
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.data_dir, "/custom/data");
    assert_eq!(config.mcts.selection, "ucb1_grave");
    assert_eq!(config.mcts.playout, "mast");
    assert!(config.mcts.global_stats);
    assert!((config.mcts.exploration - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.actor.episodes, 100);
    assert!((config.actor.seconds_per_move - 0.25).abs() < f64::EPSILON);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[mcts]
q_init = "draw"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.mcts.q_init, "draw");
    assert_eq!(config.mcts.selection, "ucb1"); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.actor.iterations_per_move, 800); // Default
}

#[test]
fn test_load_from_path_falls_back_on_bad_toml() {
    let _guard = ENV_LOCK.lock().unwrap();
    let dir = std::env::temp_dir().join(format!("gamut-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, "[mcts\nselection = ").unwrap();

    let config = load_from_path(&path);
    assert_eq!(config.mcts.selection, "ucb1");

    std::fs::write(&path, "[mcts]\nselection = \"puct\"\n").unwrap();
    let config = load_from_path(&path);
    assert_eq!(config.mcts.selection, "puct");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.env_id, cloned.common.env_id);
    assert_eq!(config.mcts.selection, cloned.mcts.selection);
}
