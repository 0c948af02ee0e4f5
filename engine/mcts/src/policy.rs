//! Learned move-prior interface.
//!
//! A policy scores the legal moves of a position with one logit per move.
//! The search turns these into priors (PUCT, regularized selection) or
//! samples playout moves from them (softmax playout). Training the policy
//! happens elsewhere; this crate only consumes it.

use engine_core::{Capabilities, Context, Game};
use thiserror::Error;

/// Errors raised while consuming a policy.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Policy returned {actual} logits for {expected} moves")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Policy evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Trait for move-prior functions.
///
/// Implementations could be:
/// - UniformPolicy: Equal logits for every move (for testing)
/// - A model wrapper mapping positions to action logits
pub trait MovePolicy<G: Game>: Send + Sync {
    /// Score each of `moves` at the position held by `ctx`.
    ///
    /// Must return exactly `moves.len()` logits.
    fn move_logits(&self, ctx: &Context<G>, moves: &[G::Move]) -> Result<Vec<f64>, PolicyError>;

    /// Whether this policy was built for the given game.
    fn supports_game(&self, _caps: &Capabilities) -> bool {
        true
    }
}

/// Policy that assigns the same logit to every move.
#[derive(Debug, Clone, Default)]
pub struct UniformPolicy;

impl UniformPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl<G: Game> MovePolicy<G> for UniformPolicy {
    fn move_logits(&self, _ctx: &Context<G>, moves: &[G::Move]) -> Result<Vec<f64>, PolicyError> {
        Ok(vec![0.0; moves.len()])
    }
}

/// Numerically stable softmax with temperature.
///
/// Returns an empty vector for empty input and a uniform distribution when
/// every logit is non-finite.
pub fn softmax(logits: &[f64], temperature: f64) -> Vec<f64> {
    if logits.is_empty() {
        return Vec::new();
    }
    let t = if temperature > 0.0 { temperature } else { 1.0 };
    let max = logits
        .iter()
        .copied()
        .filter(|l| l.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return vec![1.0 / logits.len() as f64; logits.len()];
    }

    let mut exps: Vec<f64> = logits
        .iter()
        .map(|&l| if l.is_finite() { ((l - max) / t).exp() } else { 0.0 })
        .collect();
    let sum: f64 = exps.iter().sum();
    for e in &mut exps {
        *e /= sum;
    }
    exps
}

/// Evaluate `policy` over `moves` and normalise to priors.
///
/// Without a policy every move gets the same prior.
pub fn compute_priors<G: Game>(
    policy: Option<&dyn MovePolicy<G>>,
    ctx: &Context<G>,
    moves: &[G::Move],
) -> Result<Vec<f64>, PolicyError> {
    if moves.is_empty() {
        return Ok(Vec::new());
    }
    match policy {
        None => Ok(vec![1.0 / moves.len() as f64; moves.len()]),
        Some(policy) => {
            let logits = policy.move_logits(ctx, moves)?;
            if logits.len() != moves.len() {
                return Err(PolicyError::DimensionMismatch {
                    expected: moves.len(),
                    actual: logits.len(),
                });
            }
            Ok(softmax(&logits, 1.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_games::OneShot;
    use std::sync::Arc;

    struct ShortPolicy;

    impl MovePolicy<OneShot> for ShortPolicy {
        fn move_logits(&self, _ctx: &Context<OneShot>, _moves: &[u8]) -> Result<Vec<f64>, PolicyError> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0], 1.0);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_temperature_flattens() {
        let sharp = softmax(&[0.0, 2.0], 0.5);
        let flat = softmax(&[0.0, 2.0], 10.0);
        assert!(sharp[1] > flat[1]);
        assert!(flat[1] > 0.5);
    }

    #[test]
    fn test_softmax_handles_large_and_infinite_logits() {
        let p = softmax(&[1000.0, 1000.0, f64::NEG_INFINITY], 1.0);
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert_eq!(p[2], 0.0);

        let all_bad = softmax(&[f64::NAN, f64::NEG_INFINITY], 1.0);
        assert_eq!(all_bad, vec![0.5, 0.5]);
    }

    #[test]
    fn test_uniform_priors_without_policy() {
        let ctx = Context::new(Arc::new(OneShot), 1);
        let moves = ctx.legal_moves();
        let priors = compute_priors::<OneShot>(None, &ctx, &moves).unwrap();
        assert_eq!(priors.len(), 3);
        for p in priors {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_uniform_policy_matches_no_policy() {
        let ctx = Context::new(Arc::new(OneShot), 1);
        let moves = ctx.legal_moves();
        let priors = compute_priors(Some(&UniformPolicy as &dyn MovePolicy<OneShot>), &ctx, &moves)
            .unwrap();
        let sum: f64 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let ctx = Context::new(Arc::new(OneShot), 1);
        let moves = ctx.legal_moves();
        let err = compute_priors(Some(&ShortPolicy as &dyn MovePolicy<OneShot>), &ctx, &moves)
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }
}
