//! Selection strategies: which child to descend into.
//!
//! Every strategy is a pure function of the node's statistics (plus cached
//! priors or pooled move statistics where the variant uses them) and is well
//! defined for unvisited nodes and children. Equal scores are broken
//! uniformly at random.

use engine_core::Game;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::config::QInit;
use crate::node::{MctsNode, NodeId};
use crate::stats::{GlobalActionStats, MoveKey};
use crate::tree::MctsTree;

/// Shared inputs for one selection decision.
pub struct SelectionEnv<'a> {
    pub q_init: QInit,
    pub global_stats: &'a GlobalActionStats,
}

/// Picks the move index to follow at a node.
pub trait SelectionStrategy<G: Game>: Send {
    fn name(&self) -> &'static str;

    /// Whether the node's priors must be filled before `select` is called.
    fn uses_priors(&self) -> bool {
        false
    }

    /// Whether `select` reads the pooled move statistics.
    fn uses_global_stats(&self) -> bool {
        false
    }

    /// Choose one of `legal` (indices into the node's move list).
    fn select(
        &self,
        tree: &MctsTree<G>,
        node: NodeId,
        legal: &[usize],
        env: &SelectionEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> usize;
}

/// Visits and value of child `index` from the perspective of the node's mover.
///
/// Unvisited children take the Q-init estimate.
pub(crate) fn child_value<G: Game>(
    tree: &MctsTree<G>,
    node: &MctsNode<G>,
    index: usize,
    q_init: QInit,
) -> (u32, f64) {
    match node.child_at(index) {
        Some(id) if tree.get(id).visit_count > 0 => {
            let child = tree.get(id);
            (child.visit_count, child.average_score(node.mover))
        }
        _ => (0, node.unvisited_value_estimate(node.mover, q_init)),
    }
}

/// Index with the highest score; ties are broken uniformly at random.
pub(crate) fn argmax_random_tie<I>(scored: I, rng: &mut ChaCha20Rng) -> Option<usize>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    let mut ties = 0u32;
    for (index, score) in scored {
        if best.is_none() || score > best_score {
            best = Some(index);
            best_score = score;
            ties = 1;
        } else if score == best_score {
            ties += 1;
            if rng.gen_range(0..ties) == 0 {
                best = Some(index);
            }
        }
    }
    best
}

/// Sample an index from non-negative weights.
pub(crate) fn sample_weighted(weights: &[f64], rng: &mut ChaCha20Rng) -> Option<usize> {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let mut r = rng.gen::<f64>() * total;
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        if r < w {
            return Some(i);
        }
        r -= w;
        last_positive = Some(i);
    }
    // Floating point remainder
    last_positive
}

fn exploration_log(parent_visits: u32) -> f64 {
    (parent_visits.max(1) as f64).ln()
}

/// UCB1: `avg + C * sqrt(ln N / n)`.
#[derive(Debug, Clone)]
pub struct Ucb1 {
    pub exploration: f64,
}

impl Ucb1 {
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

impl<G: Game> SelectionStrategy<G> for Ucb1 {
    fn name(&self) -> &'static str {
        "UCB1"
    }

    fn select(
        &self,
        tree: &MctsTree<G>,
        node_id: NodeId,
        legal: &[usize],
        env: &SelectionEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> usize {
        let node = tree.get(node_id);
        let log_n = exploration_log(node.visit_count);
        let scored = legal.iter().map(|&i| {
            let (n, value) = child_value(tree, node, i, env.q_init);
            if n == 0 {
                (i, value)
            } else {
                (i, value + self.exploration * (log_n / n as f64).sqrt())
            }
        });
        argmax_random_tie(scored, rng).unwrap_or(legal[0])
    }
}

/// UCB1 with the exploitation term blended towards pooled move statistics.
///
/// `score = (1 - b) * avg + b * amaf + C * sqrt(ln N / n)` with
/// `b = m / (m + n + bias * m * n)`, where `m` is the pooled visit count.
#[derive(Debug, Clone)]
pub struct Ucb1Grave {
    pub exploration: f64,
    pub bias: f64,
}

impl Ucb1Grave {
    pub fn new(exploration: f64, bias: f64) -> Self {
        Self { exploration, bias }
    }
}

impl<G: Game> SelectionStrategy<G> for Ucb1Grave {
    fn name(&self) -> &'static str {
        "UCB1-GRAVE"
    }

    fn uses_global_stats(&self) -> bool {
        true
    }

    fn select(
        &self,
        tree: &MctsTree<G>,
        node_id: NodeId,
        legal: &[usize],
        env: &SelectionEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> usize {
        let node = tree.get(node_id);
        let log_n = exploration_log(node.visit_count);
        let scored = legal.iter().map(|&i| {
            let (n, value) = child_value(tree, node, i, env.q_init);
            if n == 0 {
                return (i, value);
            }
            let n = n as f64;
            let key = MoveKey::new(node.mover, node.identities[i], node.depth);
            let exploit = match env.global_stats.get(&key) {
                Some(pooled) if pooled.visit_count > 0.0 => {
                    let m = pooled.visit_count;
                    let beta = m / (m + n + self.bias * m * n);
                    let amaf = pooled.accumulated_score / m;
                    (1.0 - beta) * value + beta * amaf
                }
                _ => value,
            };
            (i, exploit + self.exploration * (log_n / n).sqrt())
        });
        argmax_random_tie(scored, rng).unwrap_or(legal[0])
    }
}

/// Prior-weighted selection: `avg + C * prior * sqrt(N) / (1 + n)`.
#[derive(Debug, Clone)]
pub struct Puct {
    pub exploration: f64,
}

impl Puct {
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

impl<G: Game> SelectionStrategy<G> for Puct {
    fn name(&self) -> &'static str {
        "PUCT"
    }

    fn uses_priors(&self) -> bool {
        true
    }

    fn select(
        &self,
        tree: &MctsTree<G>,
        node_id: NodeId,
        legal: &[usize],
        env: &SelectionEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> usize {
        let node = tree.get(node_id);
        let sqrt_n = (node.visit_count as f64).sqrt();
        let uniform = 1.0 / legal.len().max(1) as f64;
        let scored = legal.iter().map(|&i| {
            let (n, value) = child_value(tree, node, i, env.q_init);
            let prior = node
                .priors
                .as_ref()
                .and_then(|p| p.get(i).copied())
                .unwrap_or(uniform);
            (i, value + self.exploration * prior * sqrt_n / (1.0 + n as f64))
        });
        argmax_random_tie(scored, rng).unwrap_or(legal[0])
    }
}

/// Regularized policy target over a set of moves.
///
/// Computes `pi(a) = lambda * prior(a) / (alpha - q(a))` with `alpha` found
/// by bisection so that the result sums to one. With `lambda <= 0` (no
/// visits yet) the normalised priors are returned.
pub fn regularized_policy(q: &[f64], priors: &[f64], lambda: f64) -> Vec<f64> {
    debug_assert_eq!(q.len(), priors.len());
    if q.is_empty() {
        return Vec::new();
    }

    let prior_sum: f64 = priors.iter().sum();
    let priors: Vec<f64> = if prior_sum > 0.0 {
        priors.iter().map(|p| p / prior_sum).collect()
    } else {
        vec![1.0 / q.len() as f64; q.len()]
    };
    if lambda <= 0.0 {
        return priors;
    }

    let q_max = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut lo = q
        .iter()
        .zip(&priors)
        .map(|(q, p)| q + lambda * p)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut hi = q_max + lambda;

    let mass = |alpha: f64| -> f64 {
        q.iter()
            .zip(&priors)
            .map(|(q, p)| lambda * p / (alpha - q).max(f64::MIN_POSITIVE))
            .sum()
    };

    // Mass decreases in alpha; it is >= 1 at lo and <= 1 at hi.
    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        if mass(mid) > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let alpha = hi;
    let mut pi: Vec<f64> = q
        .iter()
        .zip(&priors)
        .map(|(q, p)| lambda * p / (alpha - q).max(f64::MIN_POSITIVE))
        .collect();
    let total: f64 = pi.iter().sum();
    if total > 0.0 && total.is_finite() {
        for x in &mut pi {
            *x /= total;
        }
        pi
    } else {
        priors
    }
}

/// `lambda_N = C * sqrt(N) / (|A| + N)`
#[inline]
pub fn regularization_lambda(exploration: f64, parent_visits: u32, num_moves: usize) -> f64 {
    let n = parent_visits as f64;
    exploration * n.sqrt() / (num_moves as f64 + n)
}

/// Samples a child from the regularized policy target instead of taking an
/// argmax.
#[derive(Debug, Clone)]
pub struct RegularizedSelection {
    pub exploration: f64,
}

impl RegularizedSelection {
    pub fn new(exploration: f64) -> Self {
        Self { exploration }
    }
}

/// Q-values and priors of `indices`, used by the regularized variants.
pub(crate) fn regularized_inputs<G: Game>(
    tree: &MctsTree<G>,
    node: &MctsNode<G>,
    indices: &[usize],
    q_init: QInit,
) -> (Vec<f64>, Vec<f64>) {
    let q = indices
        .iter()
        .map(|&i| child_value(tree, node, i, q_init).1)
        .collect();
    let priors = indices
        .iter()
        .map(|&i| {
            node.priors
                .as_ref()
                .and_then(|p| p.get(i).copied())
                .unwrap_or(1.0)
        })
        .collect();
    (q, priors)
}

impl<G: Game> SelectionStrategy<G> for RegularizedSelection {
    fn name(&self) -> &'static str {
        "Regularized Policy"
    }

    fn uses_priors(&self) -> bool {
        true
    }

    fn select(
        &self,
        tree: &MctsTree<G>,
        node_id: NodeId,
        legal: &[usize],
        env: &SelectionEnv<'_>,
        rng: &mut ChaCha20Rng,
    ) -> usize {
        let node = tree.get(node_id);
        let (q, priors) = regularized_inputs(tree, node, legal, env.q_init);
        let lambda = regularization_lambda(self.exploration, node.visit_count, legal.len());
        let pi = regularized_policy(&q, &priors, lambda);
        match sample_weighted(&pi, rng) {
            Some(k) => legal[k],
            None => legal[rng.gen_range(0..legal.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_games::OneShot;
    use crate::tree::LoopMode;
    use engine_core::Context;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// Root of OneShot with the three children expanded and visited as given.
    fn tree_with(outcomes: &[(usize, [f64; 2])]) -> MctsTree<OneShot> {
        let ctx = Context::new(Arc::new(OneShot), 0);
        let mut tree = MctsTree::new(&ctx, LoopMode::Closed);
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        for i in 0..3 {
            let mut working = tree.begin_iteration(&ctx, &mut rng);
            tree.expand(tree.root(), i, &mut working);
        }
        for &(i, u) in outcomes {
            let child = tree.get(tree.root()).child_at(i).unwrap();
            tree.get_mut(child).record_outcome(&u);
            tree.get_mut(tree.root()).record_outcome(&u);
        }
        tree
    }

    fn env(stats: &GlobalActionStats, q_init: QInit) -> SelectionEnv<'_> {
        SelectionEnv {
            q_init,
            global_stats: stats,
        }
    }

    #[test]
    fn test_ucb1_prefers_unvisited_with_optimistic_init() {
        let tree = tree_with(&[(0, [1.0, -1.0]), (1, [1.0, -1.0])]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let pick = Ucb1::new(1.4).select(
            &tree,
            tree.root(),
            &[0, 1, 2],
            &env(&stats, QInit::Optimistic),
            &mut rng,
        );
        assert_eq!(pick, 2);
    }

    #[test]
    fn test_ucb1_exploits_with_zero_exploration() {
        let tree = tree_with(&[(0, [-1.0, 1.0]), (1, [1.0, -1.0]), (2, [0.0, 0.0])]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let pick = Ucb1::new(0.0).select(
            &tree,
            tree.root(),
            &[0, 1, 2],
            &env(&stats, QInit::Draw),
            &mut rng,
        );
        assert_eq!(pick, 1);
    }

    #[test]
    fn test_ucb1_at_zero_visits_breaks_ties_randomly() {
        let tree = tree_with(&[]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..64 {
            let pick = Ucb1::new(1.4).select(
                &tree,
                tree.root(),
                &[0, 1, 2],
                &env(&stats, QInit::Draw),
                &mut rng,
            );
            seen[pick] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_selection_respects_legal_subset() {
        let tree = tree_with(&[(1, [1.0, -1.0])]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..16 {
            let pick = Ucb1::new(1.4).select(
                &tree,
                tree.root(),
                &[0, 2],
                &env(&stats, QInit::Pessimistic),
                &mut rng,
            );
            assert!(pick == 0 || pick == 2);
        }
    }

    #[test]
    fn test_grave_uses_pooled_statistics() {
        // Child 0 looks bad on its own visits but the pooled statistics say
        // the move is excellent; child 2 is mediocre everywhere.
        let tree = tree_with(&[(0, [-0.2, 0.2]), (2, [0.0, 0.0])]);
        let mut stats = GlobalActionStats::new();
        let root = tree.get(tree.root());
        let key = MoveKey::new(root.mover, root.identities[0], root.depth);
        for _ in 0..100 {
            stats.update(key, 1.0, 1.0);
        }

        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let grave = Ucb1Grave::new(0.0, 1e-6).select(
            &tree,
            tree.root(),
            &[0, 2],
            &env(&stats, QInit::Draw),
            &mut rng,
        );
        let plain = Ucb1::new(0.0).select(
            &tree,
            tree.root(),
            &[0, 2],
            &env(&stats, QInit::Draw),
            &mut rng,
        );
        assert_eq!(grave, 0);
        assert_eq!(plain, 2);
    }

    #[test]
    fn test_puct_follows_priors_when_unvisited() {
        let mut tree = tree_with(&[]);
        tree.get_mut(tree.root()).record_outcome(&[0.0, 0.0]);
        tree.get_mut(tree.root()).priors = Some(vec![0.1, 0.2, 0.7]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let pick = Puct::new(1.0).select(
            &tree,
            tree.root(),
            &[0, 1, 2],
            &env(&stats, QInit::Draw),
            &mut rng,
        );
        assert_eq!(pick, 2);
    }

    #[test]
    fn test_regularized_policy_sums_to_one() {
        let q = [0.5, -0.2, 0.1, 0.9];
        let priors = [0.1, 0.4, 0.3, 0.2];
        let pi = regularized_policy(&q, &priors, regularization_lambda(1.25, 50, 4));
        let sum: f64 = pi.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(pi.iter().all(|p| *p >= 0.0));
        // Best q-value gets the most mass
        assert!(pi[3] > 0.5);
    }

    #[test]
    fn test_regularized_policy_at_zero_visits_is_prior() {
        let pi = regularized_policy(&[0.0, 0.0], &[1.0, 3.0], regularization_lambda(1.0, 0, 2));
        assert!((pi[0] - 0.25).abs() < 1e-12);
        assert!((pi[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_regularized_policy_large_lambda_approaches_prior() {
        let pi = regularized_policy(&[1.0, -1.0], &[0.5, 0.5], 1e6);
        assert!((pi[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_regularized_selection_samples_legal_indices() {
        let mut tree = tree_with(&[(0, [1.0, -1.0]), (1, [-1.0, 1.0])]);
        tree.get_mut(tree.root()).priors = Some(vec![0.3, 0.3, 0.4]);
        let stats = GlobalActionStats::new();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let strategy = RegularizedSelection::new(1.0);
        let mut counts = [0u32; 3];
        for _ in 0..200 {
            let pick = strategy.select(
                &tree,
                tree.root(),
                &[0, 1],
                &env(&stats, QInit::Draw),
                &mut rng,
            );
            counts[pick] += 1;
        }
        assert_eq!(counts[2], 0);
        assert!(counts[0] > counts[1]);
    }

    #[test]
    fn test_sample_weighted_skips_zero_weights() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let weights = [0.0, 0.5, 0.3, 0.2, 0.0];
        let mut counts = [0u32; 5];
        for _ in 0..1000 {
            counts[sample_weighted(&weights, &mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);
        assert!(sample_weighted(&[0.0, 0.0], &mut rng).is_none());
    }
}
