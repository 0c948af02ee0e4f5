//! Game context: a state plus the trail of moves that produced it
//!
//! `Context` is what the search engine passes around. It wraps a shared game
//! instance, the current state, the full history of applied moves and the
//! RNG used for chance events, so that playouts and tree descent only ever
//! need a single mutable handle.

use std::fmt;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::typed::{Capabilities, EngineId, Game};

/// One applied move together with the player who made it
#[derive(Debug, Clone, PartialEq)]
pub struct TrailEntry<M> {
    pub mover: usize,
    pub mv: M,
}

/// High-level context for running game simulations
///
/// # Example
///
/// ```rust,ignore
/// use engine_core::Context;
/// use games_tictactoe::{Action, TicTacToe};
/// use std::sync::Arc;
///
/// let mut ctx = Context::new(Arc::new(TicTacToe::new()), 42);
/// ctx.apply(&Action::Place(4));
/// assert_eq!(ctx.num_moves_played(), 1);
/// ```
pub struct Context<G: Game> {
    game: Arc<G>,
    state: G::State,
    trail: Vec<TrailEntry<G::Move>>,
    rng: ChaCha20Rng,
}

impl<G: Game> Context<G> {
    /// Start a new game from the game's initial state
    pub fn new(game: Arc<G>, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let state = game.initial_state(&mut rng);
        Self {
            game,
            state,
            trail: Vec::new(),
            rng,
        }
    }

    /// Wrap an existing state with an empty trail
    pub fn from_state(game: Arc<G>, state: G::State, seed: u64) -> Self {
        Self {
            game,
            state,
            trail: Vec::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn game(&self) -> &Arc<G> {
        &self.game
    }

    pub fn engine_id(&self) -> EngineId {
        self.game.engine_id()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.game.capabilities()
    }

    pub fn state(&self) -> &G::State {
        &self.state
    }

    /// Every move applied through this context, oldest first
    pub fn trail(&self) -> &[TrailEntry<G::Move>] {
        &self.trail
    }

    pub fn num_moves_played(&self) -> usize {
        self.trail.len()
    }

    pub fn current_player(&self) -> usize {
        self.game.current_player(&self.state)
    }

    /// Legal moves at the current state; empty once the trial is over
    pub fn legal_moves(&self) -> Vec<G::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.game.legal_moves(&self.state)
    }

    /// Apply a move, drawing any chance outcome from this context's RNG
    pub fn apply(&mut self, mv: &G::Move) {
        let mover = self.current_player();
        self.game.apply(&mut self.state, mv, &mut self.rng);
        self.trail.push(TrailEntry {
            mover,
            mv: mv.clone(),
        });
    }

    pub fn is_terminal(&self) -> bool {
        self.game.is_terminal(&self.state)
    }

    pub fn utilities(&self) -> Vec<f64> {
        self.game.utilities(&self.state)
    }

    /// Replace the chance RNG so future `apply` calls sample fresh outcomes
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Resample the information hidden from `observer`
    pub fn determinize(&mut self, observer: usize) {
        self.game
            .determinize(&mut self.state, observer, &mut self.rng);
    }
}

impl<G: Game> Clone for Context<G> {
    fn clone(&self) -> Self {
        Self {
            game: Arc::clone(&self.game),
            state: self.state.clone(),
            trail: self.trail.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<G: Game> fmt::Debug for Context<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("game", &self.game)
            .field("state", &self.state)
            .field("moves_played", &self.trail.len())
            .finish()
    }
}
