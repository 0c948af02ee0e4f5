//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across the Rust components (search engine presets, actor).
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`GAMUT_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! GAMUT_<SECTION>_<KEY>=value
//!
//! Examples:
//!     GAMUT_COMMON_ENV_ID=tictactoe
//!     GAMUT_COMMON_DATA_DIR=/data
//!     GAMUT_MCTS_SELECTION=ucb1_grave
//!     GAMUT_MCTS_EXPLORATION=0.7
//!     GAMUT_ACTOR_EPISODES=50
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_PATH_VAR, CONFIG_SEARCH_PATHS,
};
pub use structs::*;

#[cfg(test)]
mod tests;
