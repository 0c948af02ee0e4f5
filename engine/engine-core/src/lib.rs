//! Core traits and types for the Gamut game engine
//!
//! This crate provides the fundamental abstractions consumed by the search:
//! - `Game`: Typed trait describing the rules of a game
//! - `Capabilities`: Static description used to pick the search representation
//! - `MoveIdentity`: Canonical move addressing for shared statistics
//! - `Context`: A state together with its move trail and chance RNG

pub mod context;
pub mod game_utils;
pub mod typed;

// Re-export main types for convenience
pub use context::{Context, TrailEntry};
pub use typed::{
    ActionSpace, Capabilities, EncodeError, EngineId, Game, MoveIdentity, MoveKind,
};
