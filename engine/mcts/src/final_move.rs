//! Final move selection: which root move is actually played.
//!
//! Strategies only look at the root's aggregate statistics. Candidates are
//! the root move indices legal in the real position; when none of them has
//! been visited a candidate is still returned (chosen at random).

use engine_core::Game;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::config::QInit;
use crate::node::MctsNode;
use crate::selection::{
    argmax_random_tie, regularization_lambda, regularized_inputs, regularized_policy,
    sample_weighted,
};
use crate::tree::MctsTree;

/// Picks the move to play once the search budget is spent.
pub trait FinalMoveStrategy<G: Game>: Send {
    fn name(&self) -> &'static str;

    /// Choose one of `candidates` (never empty).
    fn choose(&self, tree: &MctsTree<G>, candidates: &[usize], rng: &mut ChaCha20Rng) -> usize;
}

/// Visited root children among `candidates`.
fn visited<'a, G: Game>(
    tree: &'a MctsTree<G>,
    candidates: &'a [usize],
) -> impl Iterator<Item = (usize, &'a MctsNode<G>)> + 'a {
    let root = tree.get(tree.root());
    candidates.iter().filter_map(move |&i| {
        root.child_at(i)
            .map(|id| tree.get(id))
            .filter(|child| child.visit_count > 0)
            .map(|child| (i, child))
    })
}

fn random_candidate(candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
    candidates[rng.gen_range(0..candidates.len())]
}

/// Most visited child.
#[derive(Debug, Clone, Default)]
pub struct RobustChild;

impl<G: Game> FinalMoveStrategy<G> for RobustChild {
    fn name(&self) -> &'static str {
        "Robust Child"
    }

    fn choose(&self, tree: &MctsTree<G>, candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
        let scored: Vec<(usize, f64)> = visited(tree, candidates)
            .map(|(i, child)| (i, child.visit_count as f64))
            .collect();
        argmax_random_tie(scored, rng).unwrap_or_else(|| random_candidate(candidates, rng))
    }
}

/// Child with the highest average score for the player to move at the root.
#[derive(Debug, Clone, Default)]
pub struct MaxAvgScore;

impl<G: Game> FinalMoveStrategy<G> for MaxAvgScore {
    fn name(&self) -> &'static str {
        "Max Average Score"
    }

    fn choose(&self, tree: &MctsTree<G>, candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
        let mover = tree.get(tree.root()).mover;
        let scored: Vec<(usize, f64)> = visited(tree, candidates)
            .map(|(i, child)| (i, child.average_score(mover)))
            .collect();
        argmax_random_tie(scored, rng).unwrap_or_else(|| random_candidate(candidates, rng))
    }
}

/// Samples a child with probability proportional to `visits^(1/temperature)`.
///
/// A non-positive temperature degenerates to [`RobustChild`].
#[derive(Debug, Clone)]
pub struct ProportionalExpVisitCount {
    pub temperature: f64,
}

impl ProportionalExpVisitCount {
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl<G: Game> FinalMoveStrategy<G> for ProportionalExpVisitCount {
    fn name(&self) -> &'static str {
        "Proportional Exp Visit Count"
    }

    fn choose(&self, tree: &MctsTree<G>, candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
        if self.temperature <= 0.0 {
            return RobustChild.choose(tree, candidates, rng);
        }
        let (indices, weights): (Vec<usize>, Vec<f64>) = visited(tree, candidates)
            .map(|(i, child)| (i, (child.visit_count as f64).powf(1.0 / self.temperature)))
            .unzip();
        match sample_weighted(&weights, rng) {
            Some(k) => indices[k],
            None => random_candidate(candidates, rng),
        }
    }
}

/// Plays the mode of the regularized policy target at the root.
///
/// Unvisited candidates are valued at the root's own average.
#[derive(Debug, Clone)]
pub struct RegularizedFinal {
    pub exploration: f64,
}

impl RegularizedFinal {
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

impl<G: Game> FinalMoveStrategy<G> for RegularizedFinal {
    fn name(&self) -> &'static str {
        "Regularized Policy"
    }

    fn choose(&self, tree: &MctsTree<G>, candidates: &[usize], rng: &mut ChaCha20Rng) -> usize {
        let root = tree.get(tree.root());
        if visited(tree, candidates).next().is_none() {
            return random_candidate(candidates, rng);
        }
        let (q, priors) = regularized_inputs(tree, root, candidates, QInit::Parent);
        let lambda = regularization_lambda(self.exploration, root.visit_count, candidates.len());
        let pi = regularized_policy(&q, &priors, lambda);
        argmax_random_tie(
            candidates.iter().copied().zip(pi),
            rng,
        )
        .unwrap_or_else(|| random_candidate(candidates, rng))
    }
}
