//! Small synthetic games used by the search tests.

use engine_core::{ActionSpace, Capabilities, EncodeError, EngineId, Game, MoveIdentity};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

fn engine_id(name: &str) -> EngineId {
    EngineId {
        env_id: name.to_string(),
        build_id: "test".to_string(),
    }
}

fn caps(name: &str, stochastic: bool, hidden: bool, horizon: u32, actions: u32) -> Capabilities {
    Capabilities {
        id: engine_id(name),
        num_players: 2,
        stochastic,
        hidden_information: hidden,
        max_horizon: horizon,
        action_space: ActionSpace::Discrete(actions),
    }
}

/// Player 0 makes one move and the game ends: move 1 wins, moves 0 and 2 lose.
#[derive(Debug)]
pub struct OneShot;

impl OneShot {
    pub const WINNING_MOVE: u8 = 1;
}

impl Game for OneShot {
    type State = Option<u8>;
    type Move = u8;

    fn engine_id(&self) -> EngineId {
        engine_id("one_shot")
    }

    fn capabilities(&self) -> Capabilities {
        caps("one_shot", false, false, 1, 3)
    }

    fn initial_state(&self, _rng: &mut ChaCha20Rng) -> Self::State {
        None
    }

    fn current_player(&self, _state: &Self::State) -> usize {
        0
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<u8> {
        match state {
            None => vec![0, 1, 2],
            Some(_) => Vec::new(),
        }
    }

    fn apply(&self, state: &mut Self::State, mv: &u8, _rng: &mut ChaCha20Rng) {
        *state = Some(*mv);
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.is_some()
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        match state {
            None => vec![0.0, 0.0],
            Some(mv) if *mv == Self::WINNING_MOVE => vec![1.0, -1.0],
            Some(_) => vec![-1.0, 1.0],
        }
    }

    fn move_identity(&self, mv: &u8) -> MoveIdentity {
        MoveIdentity::placement(*mv as i32)
    }

    fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(state.map_or(u8::MAX, |m| m));
        Ok(())
    }

    fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(*mv);
        Ok(())
    }
}

/// Player 0 either bets (move 0) on a 70% coin or folds (move 1) for -0.2.
#[derive(Debug)]
pub struct BetGame;

impl BetGame {
    pub const BET: u8 = 0;
    pub const FOLD: u8 = 1;
    pub const WIN_PROBABILITY: f64 = 0.7;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetState {
    pub choice: Option<u8>,
    pub won: Option<bool>,
}

impl Game for BetGame {
    type State = BetState;
    type Move = u8;

    fn engine_id(&self) -> EngineId {
        engine_id("bet")
    }

    fn capabilities(&self) -> Capabilities {
        caps("bet", true, false, 1, 2)
    }

    fn initial_state(&self, _rng: &mut ChaCha20Rng) -> Self::State {
        BetState {
            choice: None,
            won: None,
        }
    }

    fn current_player(&self, _state: &Self::State) -> usize {
        0
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<u8> {
        if state.choice.is_some() {
            Vec::new()
        } else {
            vec![Self::BET, Self::FOLD]
        }
    }

    fn apply(&self, state: &mut Self::State, mv: &u8, rng: &mut ChaCha20Rng) {
        state.choice = Some(*mv);
        if *mv == Self::BET {
            state.won = Some(rng.gen_bool(Self::WIN_PROBABILITY));
        }
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.choice.is_some()
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        match (state.choice, state.won) {
            (Some(Self::BET), Some(true)) => vec![1.0, -1.0],
            (Some(Self::BET), _) => vec![-1.0, 1.0],
            (Some(_), _) => vec![-0.2, 0.2],
            (None, _) => vec![0.0, 0.0],
        }
    }

    fn move_identity(&self, mv: &u8) -> MoveIdentity {
        MoveIdentity::placement(*mv as i32)
    }

    fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(state.choice.map_or(u8::MAX, |c| c));
        out.push(state.won.map_or(u8::MAX, u8::from));
        Ok(())
    }

    fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(*mv);
        Ok(())
    }
}

/// Player 0 names a value (0, 2 or 4), then player 1 answers with one of two
/// cards hidden from player 0. The higher number wins.
#[derive(Debug)]
pub struct DealGame;

#[derive(Debug, Clone, PartialEq)]
pub struct DealState {
    pub call: Option<u8>,
    pub hand: [u8; 2],
    pub answer: Option<u8>,
}

impl DealGame {
    fn deal(rng: &mut ChaCha20Rng) -> [u8; 2] {
        let first = rng.gen_range(0..6u8);
        let mut second = rng.gen_range(0..5u8);
        if second >= first {
            second += 1;
        }
        [first, second]
    }
}

impl Game for DealGame {
    type State = DealState;
    type Move = u8;

    fn engine_id(&self) -> EngineId {
        engine_id("deal")
    }

    fn capabilities(&self) -> Capabilities {
        caps("deal", false, true, 2, 6)
    }

    fn initial_state(&self, rng: &mut ChaCha20Rng) -> Self::State {
        DealState {
            call: None,
            hand: Self::deal(rng),
            answer: None,
        }
    }

    fn current_player(&self, state: &Self::State) -> usize {
        if state.call.is_none() {
            0
        } else {
            1
        }
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<u8> {
        match (state.call, state.answer) {
            (None, _) => vec![0, 2, 4],
            (Some(_), None) => state.hand.to_vec(),
            (Some(_), Some(_)) => Vec::new(),
        }
    }

    fn apply(&self, state: &mut Self::State, mv: &u8, _rng: &mut ChaCha20Rng) {
        if state.call.is_none() {
            state.call = Some(*mv);
        } else {
            assert!(state.hand.contains(mv), "card {} not in hand {:?}", mv, state.hand);
            state.answer = Some(*mv);
        }
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.answer.is_some()
    }

    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        match (state.call, state.answer) {
            (Some(call), Some(answer)) if call > answer => vec![1.0, -1.0],
            (Some(call), Some(answer)) if call < answer => vec![-1.0, 1.0],
            _ => vec![0.0, 0.0],
        }
    }

    fn move_identity(&self, mv: &u8) -> MoveIdentity {
        MoveIdentity::placement(*mv as i32)
    }

    fn determinize(&self, state: &mut Self::State, observer: usize, rng: &mut ChaCha20Rng) {
        if observer != 1 && state.answer.is_none() {
            state.hand = Self::deal(rng);
        }
    }

    fn encode_state(state: &Self::State, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(state.call.map_or(u8::MAX, |c| c));
        out.extend_from_slice(&state.hand);
        out.push(state.answer.map_or(u8::MAX, |a| a));
        Ok(())
    }

    fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(*mv);
        Ok(())
    }
}

/// Players alternate through a corridor of `LENGTH` forced moves.
#[derive(Debug)]
pub struct Corridor;

impl Corridor {
    pub const LENGTH: u8 = 5;
}

impl Game for Corridor {
    type State = u8;
    type Move = u8;

    fn engine_id(&self) -> EngineId {
        engine_id("corridor")
    }

    fn capabilities(&self) -> Capabilities {
        caps("corridor", false, false, Self::LENGTH as u32, 1)
    }

    fn initial_state(&self, _rng: &mut ChaCha20Rng) -> u8 {
        0
    }

    fn current_player(&self, state: &u8) -> usize {
        (*state % 2) as usize
    }

    fn legal_moves(&self, state: &u8) -> Vec<u8> {
        if *state < Self::LENGTH {
            vec![*state]
        } else {
            Vec::new()
        }
    }

    fn apply(&self, state: &mut u8, _mv: &u8, _rng: &mut ChaCha20Rng) {
        *state += 1;
    }

    fn is_terminal(&self, state: &u8) -> bool {
        *state >= Self::LENGTH
    }

    fn utilities(&self, _state: &u8) -> Vec<f64> {
        vec![0.0, 0.0]
    }

    fn move_identity(&self, mv: &u8) -> MoveIdentity {
        MoveIdentity::placement(*mv as i32)
    }

    fn encode_state(state: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(*state);
        Ok(())
    }

    fn encode_move(mv: &u8, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(*mv);
        Ok(())
    }
}
