//! Monte Carlo Tree Search (MCTS) for general game playing.
//!
//! This crate provides a game-agnostic MCTS implementation that works with any
//! game implementing the `engine-core` Game trait.
//!
//! # Overview
//!
//! MCTS is a search algorithm that builds a search tree by running trials.
//! Each iteration consists of four phases:
//!
//! 1. **Selection**: Walk the tree with a [`SelectionStrategy`] (UCB1,
//!    UCB1-GRAVE, PUCT-style or regularized-policy sampling)
//! 2. **Expansion**: Materialise the first missing child on the path
//! 3. **Playout**: Complete the trial with a [`PlayoutStrategy`] (random,
//!    learned softmax, epsilon-greedy or MAST)
//! 4. **Backpropagation**: Credit the terminal utilities to every node on the
//!    path and, when enabled, to the pooled [`GlobalActionStats`]
//!
//! A [`FinalMoveStrategy`] then picks the move to play from the root.
//!
//! Deterministic perfect-information games use a closed-loop tree where each
//! node pins one state. Games with chance or hidden information use an
//! open-loop tree that re-samples the path on every iteration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use engine_core::Context;
//! use games_tictactoe::TicTacToe;
//! use mcts::{Mcts, MctsConfig};
//! use std::sync::Arc;
//!
//! let mut ctx = Context::new(Arc::new(TicTacToe::new()), 42);
//! let mut mcts = Mcts::new(MctsConfig::default().with_seed(7));
//! mcts.init_game(&ctx)?;
//!
//! while !ctx.is_terminal() {
//!     // One second or 800 iterations, whichever comes first
//!     let mv = mcts.select_move(&ctx, 1.0, 800, 0)?;
//!     println!("{}", mcts.analysis_report());
//!     ctx.apply(&mv);
//! }
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `selection`, `playout`, `final_move`: strategy kinds
//! - `exploration`: Exploration constant (default: sqrt(2))
//! - `q_init`: Value assumed for unvisited children (default: optimistic)
//! - `tree_reuse`: Keep the chosen subtree between calls (default: true)
//! - `global_stats_decay`: Per-call decay of the pooled move statistics
//! - `dirichlet_alpha`: Root prior noise for prior-based selection
//!
//! # Policies
//!
//! Prior-based strategies consume a [`MovePolicy`]:
//!
//! - [`UniformPolicy`]: Equal logits for every move (for testing)
//! - Custom policies can wrap trained models

pub mod backprop;
pub mod config;
pub mod final_move;
pub mod node;
pub mod playout;
pub mod policy;
pub mod search;
pub mod selection;
pub mod stats;
pub mod tree;

#[cfg(test)]
mod test_games;

// Re-export main types
pub use backprop::{backpropagate, AmafWeights};
pub use config::{FinalMoveKind, MctsConfig, ParseKindError, PlayoutKind, QInit, SelectionKind};
pub use final_move::{
    FinalMoveStrategy, MaxAvgScore, ProportionalExpVisitCount, RegularizedFinal, RobustChild,
};
pub use node::{MctsNode, NodeContext, NodeId};
pub use playout::{
    EpsilonGreedyPlayout, MastPlayout, PlayoutEnv, PlayoutOutcome, PlayoutStrategy,
    RandomPlayout, SoftmaxPlayout,
};
pub use policy::{compute_priors, softmax, MovePolicy, PolicyError, UniformPolicy};
pub use search::{Mcts, SearchError, SearchStats, TrainingSample};
pub use selection::{
    regularized_policy, Puct, RegularizedSelection, SelectionEnv, SelectionStrategy, Ucb1,
    Ucb1Grave,
};
pub use stats::{ActionStatistics, GlobalActionStats, MoveKey};
pub use tree::{LoopMode, MctsTree, TreeStats};
