//! Playout strategies: completing a trial from an unfinished position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use engine_core::{Capabilities, Context, Game};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::policy::{softmax, MovePolicy, PolicyError};
use crate::selection::sample_weighted;
use crate::stats::{GlobalActionStats, MoveKey};

/// Shared inputs for one playout.
pub struct PlayoutEnv<'a> {
    pub global_stats: &'a GlobalActionStats,
    /// Maximum actions to apply (0 = play to the end)
    pub action_cap: usize,
    pub deadline: Option<Instant>,
    pub interrupt: &'a AtomicBool,
}

impl PlayoutEnv<'_> {
    /// Whether the search has been interrupted or run out of time.
    #[inline]
    pub fn should_abort(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// How a playout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoutOutcome {
    /// Reached a terminal state or the action cap.
    Completed { actions: usize },
    /// Stopped early; the trial must be discarded.
    Aborted,
}

/// Plays moves on a context until the trial is over.
pub trait PlayoutStrategy<G: Game>: Send {
    fn name(&self) -> &'static str;

    /// Whether this strategy can play the given game.
    fn supports_game(&self, _caps: &Capabilities) -> bool {
        true
    }

    /// Whether move choice reads the pooled move statistics.
    fn uses_global_stats(&self) -> bool {
        false
    }

    /// Pick an index into `moves` (never empty).
    fn choose_move(
        &self,
        ctx: &Context<G>,
        moves: &[G::Move],
        env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<usize, PolicyError>;

    /// Apply moves to `ctx` until it is terminal or the action cap is reached.
    fn run_playout(
        &self,
        ctx: &mut Context<G>,
        env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<PlayoutOutcome, PolicyError> {
        let mut actions = 0;
        while !ctx.is_terminal() {
            if env.action_cap > 0 && actions >= env.action_cap {
                break;
            }
            if env.should_abort() {
                return Ok(PlayoutOutcome::Aborted);
            }
            let moves = ctx.legal_moves();
            if moves.is_empty() {
                break;
            }
            let index = self.choose_move(ctx, &moves, env, rng)?;
            ctx.apply(&moves[index]);
            actions += 1;
        }
        Ok(PlayoutOutcome::Completed { actions })
    }
}

/// Uniformly random moves.
#[derive(Debug, Clone, Default)]
pub struct RandomPlayout;

impl RandomPlayout {
    pub fn new() -> Self {
        Self
    }
}

impl<G: Game> PlayoutStrategy<G> for RandomPlayout {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn choose_move(
        &self,
        _ctx: &Context<G>,
        moves: &[G::Move],
        _env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<usize, PolicyError> {
        Ok(rng.gen_range(0..moves.len()))
    }
}

/// Samples moves from the softmax of a learned policy's logits.
pub struct SoftmaxPlayout<G: Game> {
    policy: Arc<dyn MovePolicy<G>>,
}

impl<G: Game> SoftmaxPlayout<G> {
    pub fn new(policy: Arc<dyn MovePolicy<G>>) -> Self {
        Self { policy }
    }
}

impl<G: Game> PlayoutStrategy<G> for SoftmaxPlayout<G> {
    fn name(&self) -> &'static str {
        "Softmax"
    }

    fn supports_game(&self, caps: &Capabilities) -> bool {
        self.policy.supports_game(caps)
    }

    fn choose_move(
        &self,
        ctx: &Context<G>,
        moves: &[G::Move],
        _env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<usize, PolicyError> {
        let logits = self.policy.move_logits(ctx, moves)?;
        if logits.len() != moves.len() {
            return Err(PolicyError::DimensionMismatch {
                expected: moves.len(),
                actual: logits.len(),
            });
        }
        let probs = softmax(&logits, 1.0);
        Ok(sample_weighted(&probs, rng).unwrap_or_else(|| rng.gen_range(0..moves.len())))
    }
}

/// With probability `epsilon` plays a uniformly random move, otherwise
/// defers to the wrapped strategy.
pub struct EpsilonGreedyPlayout<G: Game> {
    inner: Box<dyn PlayoutStrategy<G>>,
    epsilon: f64,
}

impl<G: Game> EpsilonGreedyPlayout<G> {
    pub fn new(inner: Box<dyn PlayoutStrategy<G>>, epsilon: f64) -> Self {
        Self {
            inner,
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }
}

impl<G: Game> PlayoutStrategy<G> for EpsilonGreedyPlayout<G> {
    fn name(&self) -> &'static str {
        "Epsilon-Greedy"
    }

    fn supports_game(&self, caps: &Capabilities) -> bool {
        self.inner.supports_game(caps)
    }

    fn uses_global_stats(&self) -> bool {
        self.inner.uses_global_stats()
    }

    fn choose_move(
        &self,
        ctx: &Context<G>,
        moves: &[G::Move],
        env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<usize, PolicyError> {
        if rng.gen::<f64>() < self.epsilon {
            Ok(rng.gen_range(0..moves.len()))
        } else {
            self.inner.choose_move(ctx, moves, env, rng)
        }
    }
}

/// Move-Average Sampling Technique: Gibbs sampling over the pooled average
/// of each move's key.
#[derive(Debug, Clone)]
pub struct MastPlayout {
    pub tau: f64,
}

impl MastPlayout {
    /// Score of a key that has never been recorded.
    pub const UNSEEN_SCORE: f64 = 1.0;

    pub fn new(tau: f64) -> Self {
        Self { tau }
    }
}

impl<G: Game> PlayoutStrategy<G> for MastPlayout {
    fn name(&self) -> &'static str {
        "MAST"
    }

    fn uses_global_stats(&self) -> bool {
        true
    }

    fn choose_move(
        &self,
        ctx: &Context<G>,
        moves: &[G::Move],
        env: &PlayoutEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> Result<usize, PolicyError> {
        let mover = ctx.current_player();
        let depth = ctx.num_moves_played();
        let scores: Vec<f64> = moves
            .iter()
            .map(|mv| {
                let key = MoveKey::new(mover, ctx.game().move_identity(mv), depth);
                env.global_stats
                    .get(&key)
                    .and_then(|s| s.average())
                    .unwrap_or(Self::UNSEEN_SCORE)
            })
            .collect();
        let weights = softmax(&scores, self.tau);
        Ok(sample_weighted(&weights, rng).unwrap_or_else(|| rng.gen_range(0..moves.len())))
    }
}
