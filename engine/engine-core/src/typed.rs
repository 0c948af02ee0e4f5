//! Typed Game trait describing the rules consumed by the search engine
//!
//! A game implementation owns legal-move generation, state transitions and
//! terminal utilities. The search engine never inspects states directly; it
//! only clones them, compares them and feeds them back through this trait.

use rand_chacha::ChaCha20Rng;

/// Engine identification information
#[derive(Debug, Clone, PartialEq)]
pub struct EngineId {
    pub env_id: String,
    pub build_id: String,
}

/// Action space variants
///
/// Learned policies use this to refuse games whose move encoding their model
/// was not trained for.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionSpace {
    /// Every move maps to one of `n` fixed action indices.
    Discrete(u32),
    /// Moves are generated freely and have no fixed indexing.
    Unbounded,
}

/// Game capabilities and configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub id: EngineId,
    /// Number of players; player indices run from 0 to `num_players - 1`.
    pub num_players: usize,
    /// Whether `apply` samples chance outcomes from the RNG.
    pub stochastic: bool,
    /// Whether players observe only part of the state.
    pub hidden_information: bool,
    /// Upper bound on the number of moves in one game.
    pub max_horizon: u32,
    pub action_space: ActionSpace,
}

impl Capabilities {
    /// Whether a search tree for this game must re-sample successors on every
    /// traversal instead of pinning one concrete state per node.
    pub fn requires_resampling(&self) -> bool {
        self.stochastic || self.hidden_information
    }
}

/// Special move categories that are disambiguated by depth in shared statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    Pass,
    Swap,
}

/// Board addressing of a move, used to pool statistics for the same abstract
/// move seen at different positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveIdentity {
    pub from: i32,
    pub to: i32,
    /// Oriented moves distinguish `from -> to` from `to -> from`.
    pub oriented: bool,
    pub kind: MoveKind,
}

impl MoveIdentity {
    /// Sentinel site for moves without an origin (placements).
    pub const OFF_BOARD: i32 = -1;

    /// A piece placed on `to`.
    pub fn placement(to: i32) -> Self {
        Self {
            from: Self::OFF_BOARD,
            to,
            oriented: true,
            kind: MoveKind::Normal,
        }
    }

    /// A directed move from `from` to `to`.
    pub fn step(from: i32, to: i32) -> Self {
        Self {
            from,
            to,
            oriented: true,
            kind: MoveKind::Normal,
        }
    }

    /// A move connecting two sites where direction carries no meaning
    /// (e.g. claiming an edge).
    pub fn undirected(a: i32, b: i32) -> Self {
        Self {
            from: a,
            to: b,
            oriented: false,
            kind: MoveKind::Normal,
        }
    }

    pub fn pass() -> Self {
        Self {
            from: Self::OFF_BOARD,
            to: Self::OFF_BOARD,
            oriented: true,
            kind: MoveKind::Pass,
        }
    }

    pub fn swap() -> Self {
        Self {
            from: Self::OFF_BOARD,
            to: Self::OFF_BOARD,
            oriented: true,
            kind: MoveKind::Swap,
        }
    }
}

/// Main trait for game implementations
///
/// # Type Parameters
///
/// * `State` - Game state, cloned freely by the search
/// * `Move` - Move type, compared with `==` when replaying real moves
///
/// # Example
///
/// ```rust
/// # use engine_core::typed::*;
/// # use rand_chacha::ChaCha20Rng;
/// #[derive(Debug)]
/// struct Countdown;
///
/// impl Game for Countdown {
///     type State = u8;
///     type Move = u8;
///
///     fn engine_id(&self) -> EngineId {
///         EngineId { env_id: "countdown".into(), build_id: "0.1.0".into() }
///     }
///     fn capabilities(&self) -> Capabilities {
///         Capabilities {
///             id: self.engine_id(),
///             num_players: 2,
///             stochastic: false,
///             hidden_information: false,
///             max_horizon: 10,
///             action_space: ActionSpace::Discrete(2),
///         }
///     }
///     fn initial_state(&self, _rng: &mut ChaCha20Rng) -> u8 { 10 }
///     fn current_player(&self, state: &u8) -> usize { (*state % 2) as usize }
///     fn legal_moves(&self, state: &u8) -> Vec<u8> {
///         (1..=2).filter(|m| *m <= *state).collect()
///     }
///     fn apply(&self, state: &mut u8, mv: &u8, _rng: &mut ChaCha20Rng) { *state -= *mv; }
///     fn is_terminal(&self, state: &u8) -> bool { *state == 0 }
///     fn utilities(&self, _state: &u8) -> Vec<f64> { vec![0.0, 0.0] }
///     fn move_identity(&self, mv: &u8) -> MoveIdentity { MoveIdentity::placement(*mv as i32) }
///     fn encode_state(state: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
///         out.push(*state);
///         Ok(())
///     }
///     fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
///         out.push(*mv);
///         Ok(())
///     }
/// }
/// ```
pub trait Game: Send + Sync + std::fmt::Debug + 'static {
    /// Game state type
    type State: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// Move type
    type Move: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// Get engine identification information
    fn engine_id(&self) -> EngineId;

    /// Get game capabilities and configuration
    fn capabilities(&self) -> Capabilities;

    /// Create the initial state of a new game
    fn initial_state(&self, rng: &mut ChaCha20Rng) -> Self::State;

    /// Index of the player to move
    fn current_player(&self, state: &Self::State) -> usize;

    /// Legal moves in a fixed, deterministic order. Empty for terminal states.
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// Apply a legal move in place. Chance outcomes are drawn from `rng`.
    fn apply(&self, state: &mut Self::State, mv: &Self::Move, rng: &mut ChaCha20Rng);

    /// Whether the trial has ended
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Per-player utilities in [-1, 1]
    ///
    /// Must also be defined for non-terminal states, because playouts may stop
    /// at an action cap; returning zeros (a draw) is the usual choice.
    fn utilities(&self, state: &Self::State) -> Vec<f64>;

    /// Canonical addressing used to pool statistics across positions
    fn move_identity(&self, mv: &Self::Move) -> MoveIdentity;

    /// Resample the information hidden from `observer`.
    ///
    /// Called once per search iteration for hidden-information games.
    fn determinize(&self, _state: &mut Self::State, _observer: usize, _rng: &mut ChaCha20Rng) {}

    // Encoding hooks for training samples

    /// Encode state to bytes
    fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError>;

    /// Encode move to bytes
    fn encode_move(mv: &Self::Move, out: &mut Vec<u8>) -> Result<(), EncodeError>;
}

/// Error type for encoding operations
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to encode data: {0}")]
    SerializationError(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[derive(Debug)]
    struct CoinGame;

    impl Game for CoinGame {
        type State = (u8, i8);
        type Move = u8;

        fn engine_id(&self) -> EngineId {
            EngineId {
                env_id: "coin".to_string(),
                build_id: "0.1.0".to_string(),
            }
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                id: self.engine_id(),
                num_players: 1,
                stochastic: true,
                hidden_information: false,
                max_horizon: 1,
                action_space: ActionSpace::Discrete(1),
            }
        }

        fn initial_state(&self, _rng: &mut ChaCha20Rng) -> Self::State {
            (0, 0)
        }

        fn current_player(&self, _state: &Self::State) -> usize {
            0
        }

        fn legal_moves(&self, state: &Self::State) -> Vec<u8> {
            if state.0 == 0 {
                vec![0]
            } else {
                Vec::new()
            }
        }

        fn apply(&self, state: &mut Self::State, _mv: &u8, rng: &mut ChaCha20Rng) {
            use rand::Rng;
            state.0 = 1;
            state.1 = if rng.gen_bool(0.5) { 1 } else { -1 };
        }

        fn is_terminal(&self, state: &Self::State) -> bool {
            state.0 == 1
        }

        fn utilities(&self, state: &Self::State) -> Vec<f64> {
            vec![state.1 as f64]
        }

        fn move_identity(&self, _mv: &u8) -> MoveIdentity {
            MoveIdentity::pass()
        }

        fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError> {
            out.push(state.0);
            out.push(state.1 as u8);
            Ok(())
        }

        fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
            out.push(*mv);
            Ok(())
        }
    }

    #[test]
    fn test_stochastic_game_requires_resampling() {
        let caps = CoinGame.capabilities();
        assert!(caps.requires_resampling());
        assert_eq!(caps.num_players, 1);
    }

    #[test]
    fn test_apply_draws_chance_from_rng() {
        let game = CoinGame;
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut outcomes = std::collections::HashSet::new();
        for _ in 0..32 {
            let mut state = game.initial_state(&mut rng);
            game.apply(&mut state, &0, &mut rng);
            assert!(game.is_terminal(&state));
            outcomes.insert(state.1);
        }
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_move_identity_constructors() {
        let placement = MoveIdentity::placement(4);
        assert_eq!(placement.from, MoveIdentity::OFF_BOARD);
        assert!(placement.oriented);

        let edge = MoveIdentity::undirected(1, 2);
        assert!(!edge.oriented);
        assert_eq!(edge.kind, MoveKind::Normal);

        assert_eq!(MoveIdentity::pass().kind, MoveKind::Pass);
        assert_eq!(MoveIdentity::swap().kind, MoveKind::Swap);
    }

    #[test]
    fn test_encode_state() {
        let mut buf = Vec::new();
        CoinGame::encode_state(&(1, -1), &mut buf).unwrap();
        assert_eq!(buf, vec![1, 255]);
    }
}
