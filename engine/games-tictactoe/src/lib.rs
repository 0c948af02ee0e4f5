//! TicTacToe game implementation for the Gamut engine
//!
//! This crate provides a complete reference implementation of TicTacToe
//! demonstrating how to implement the Game trait for the search engine.
//!
//! # Usage
//!
//! ```rust
//! use games_tictactoe::{Action, TicTacToe};
//! use engine_core::Context;
//! use std::sync::Arc;
//!
//! let mut ctx = Context::new(Arc::new(TicTacToe::new()), 42);
//! ctx.apply(&Action::Place(4));
//! assert_eq!(ctx.legal_moves().len(), 8);
//! ```

use engine_core::game_utils::two_player_utilities;
use engine_core::typed::{
    ActionSpace, Capabilities, EncodeError, EngineId, Game, MoveIdentity,
};
use rand_chacha::ChaCha20Rng;

/// Environment id used in configuration files
pub const ENV_ID: &str = "tictactoe";

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// current player, and winner information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; 9],
    /// Current player: 1=X, 2=O
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1, // X goes first
            winner: 0,
        }
    }

    /// Board cells: 0=empty, 1=X, 2=O
    pub fn board(&self) -> &[u8; 9] {
        &self.board
    }

    /// Winner code: 0=ongoing, 1=X, 2=O, 3=draw
    pub fn winner(&self) -> u8 {
        self.winner
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..9u8)
            .filter(|&pos| self.board[pos as usize] == 0)
            .collect()
    }

    /// Make a move and return the new state
    pub fn make_move(&self, position: u8) -> State {
        if self.is_done() || position >= 9 || self.board[position as usize] != 0 {
            return *self; // Invalid move, return unchanged state
        }

        let mut new_state = *self;
        new_state.board[position as usize] = self.current_player;

        new_state.winner = Self::check_winner(&new_state.board);

        // Switch player if game not over
        if new_state.winner == 0 {
            new_state.current_player = if self.current_player == 1 { 2 } else { 1 };
        }

        new_state
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; 9]) -> u8 {
        // Winning positions (rows, columns, diagonals)
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8], // rows
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8], // columns
            [0, 4, 8],
            [2, 4, 6], // diagonals
        ];

        for line in &LINES {
            let [a, b, c] = *line;
            if board[a] != 0 && board[a] == board[b] && board[b] == board[c] {
                return board[a];
            }
        }

        if board.iter().all(|&cell| cell != 0) {
            return 3; // Draw
        }

        0
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// TicTacToe action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Place a piece at the given position (0-8)
    Place(u8),
}

impl Action {
    /// Get the position for this action
    pub fn position(&self) -> u8 {
        match self {
            Action::Place(pos) => *pos,
        }
    }
}

/// TicTacToe game implementation
#[derive(Debug)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create a new TicTacToe game
    pub fn new() -> Self {
        Self
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for TicTacToe {
    type State = State;
    type Move = Action;

    fn engine_id(&self) -> EngineId {
        EngineId {
            env_id: ENV_ID.to_string(),
            build_id: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            id: self.engine_id(),
            num_players: 2,
            stochastic: false,
            hidden_information: false,
            max_horizon: 9,                         // Maximum 9 moves in TicTacToe
            action_space: ActionSpace::Discrete(9), // 9 possible positions
        }
    }

    fn initial_state(&self, _rng: &mut ChaCha20Rng) -> Self::State {
        State::new()
    }

    fn current_player(&self, state: &Self::State) -> usize {
        (state.current_player - 1) as usize
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move> {
        state.legal_moves().into_iter().map(Action::Place).collect()
    }

    fn apply(&self, state: &mut Self::State, mv: &Self::Move, _rng: &mut ChaCha20Rng) {
        *state = state.make_move(mv.position());
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.is_done()
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        two_player_utilities(state.winner)
    }

    fn move_identity(&self, mv: &Self::Move) -> MoveIdentity {
        MoveIdentity::placement(mv.position() as i32)
    }

    fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        // Simple binary encoding: board (9 bytes) + current_player (1 byte) + winner (1 byte)
        out.extend_from_slice(&state.board);
        out.push(state.current_player);
        out.push(state.winner);
        Ok(())
    }

    fn encode_move(mv: &Self::Move, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let position = mv.position();
        if position >= 9 {
            return Err(EncodeError::InvalidData(format!(
                "Invalid action position: {}",
                position
            )));
        }
        out.push(position);
        Ok(())
    }
}
