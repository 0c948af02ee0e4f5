//! Backpropagation: pushing one trial's utilities back up the visited path.

use engine_core::{Context, Game};
use tracing::trace;

use crate::node::NodeId;
use crate::stats::{GlobalActionStats, MoveKey};
use crate::tree::MctsTree;

/// Relative weight of the two move sources fed into the pooled statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmafWeights {
    /// Moves made inside the tree
    pub selection: f64,
    /// Moves made by the playout
    pub playout: f64,
}

impl Default for AmafWeights {
    fn default() -> Self {
        Self {
            selection: 1.0,
            playout: 1.0,
        }
    }
}

/// Record `utilities` at `leaf` and every ancestor up to the root.
///
/// `ctx` is the iteration's working context after the playout; its trail
/// holds every move of the trial. The last `playout_actions` entries were
/// played by the playout. When `global` is given, playout moves are pooled
/// first, then each tree edge on the way up, each credited with the acting
/// player's utility.
pub fn backpropagate<G: Game>(
    tree: &mut MctsTree<G>,
    leaf: NodeId,
    ctx: &Context<G>,
    utilities: &[f64],
    playout_actions: usize,
    mut global: Option<(&mut GlobalActionStats, AmafWeights)>,
) {
    let trail = ctx.trail();
    let game = ctx.game();
    let utility = |player: usize| utilities.get(player).copied().unwrap_or(0.0);

    if let Some((stats, weights)) = global.as_mut() {
        let start = trail.len().saturating_sub(playout_actions);
        for (depth, entry) in trail.iter().enumerate().skip(start) {
            let key = MoveKey::new(entry.mover, game.move_identity(&entry.mv), depth);
            stats.update(key, weights.playout, utility(entry.mover));
        }
    }

    let mut current = leaf;
    let mut path_len = 0;
    while current.is_some() {
        let node = tree.get_mut(current);
        node.record_outcome(utilities);
        path_len += 1;

        let parent = node.parent;
        if parent.is_some() && node.depth > 0 {
            if let (Some((stats, weights)), Some(entry)) =
                (global.as_mut(), trail.get(node.depth - 1))
            {
                let key = MoveKey::new(
                    entry.mover,
                    game.move_identity(&entry.mv),
                    node.depth - 1,
                );
                stats.update(key, weights.selection, utility(entry.mover));
            }
        }
        current = parent;
    }

    trace!(path_len, playout_actions, "Backpropagated trial");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_games::OneShot;
    use crate::tree::LoopMode;
    use engine_core::MoveIdentity;
    use games_tictactoe::{Action, TicTacToe};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;

    #[test]
    fn test_backprop_updates_path_to_root() {
        let ctx = Context::new(Arc::new(OneShot), 0);
        let mut tree = MctsTree::new(&ctx, LoopMode::Closed);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut working = tree.begin_iteration(&ctx, &mut rng);
        let leaf = tree.expand(tree.root(), 1, &mut working);

        backpropagate(&mut tree, leaf, &working, &working.utilities(), 0, None);

        assert_eq!(tree.get(leaf).visit_count, 1);
        assert_eq!(tree.get(tree.root()).visit_count, 1);
        assert!((tree.get(leaf).average_score(0) - 1.0).abs() < 1e-12);
        assert!((tree.get(tree.root()).average_score(1) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_backprop_pools_selection_and_playout_moves() {
        let ctx = Context::new(Arc::new(TicTacToe::new()), 0);
        let mut tree = MctsTree::new(&ctx, LoopMode::Closed);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut working = tree.begin_iteration(&ctx, &mut rng);

        // Tree edge: X at 4. Playout: O at 0, X at 1.
        let root_index = tree
            .get(tree.root())
            .moves
            .iter()
            .position(|m| *m == Action::Place(4))
            .unwrap();
        let leaf = tree.expand(tree.root(), root_index, &mut working);
        working.apply(&Action::Place(0));
        working.apply(&Action::Place(1));

        let utilities = [0.5, -0.5];
        let mut stats = GlobalActionStats::new();
        let weights = AmafWeights {
            selection: 2.0,
            playout: 1.0,
        };
        backpropagate(
            &mut tree,
            leaf,
            &working,
            &utilities,
            2,
            Some((&mut stats, weights)),
        );

        assert_eq!(stats.len(), 3);
        let tree_move = stats
            .get(&MoveKey::new(0, MoveIdentity::placement(4), 0))
            .unwrap();
        assert!((tree_move.visit_count - 2.0).abs() < 1e-12);
        assert!((tree_move.accumulated_score - 1.0).abs() < 1e-12);

        let o_move = stats
            .get(&MoveKey::new(1, MoveIdentity::placement(0), 1))
            .unwrap();
        assert!((o_move.visit_count - 1.0).abs() < 1e-12);
        assert!((o_move.accumulated_score + 0.5).abs() < 1e-12);

        let x_move = stats
            .get(&MoveKey::new(0, MoveIdentity::placement(1), 2))
            .unwrap();
        assert!((x_move.average().unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_backprop_from_root_only() {
        let ctx = Context::new(Arc::new(OneShot), 0);
        let mut tree = MctsTree::new(&ctx, LoopMode::Closed);
        let mut stats = GlobalActionStats::new();
        let root = tree.root();

        backpropagate(
            &mut tree,
            root,
            &ctx,
            &[0.0, 0.0],
            0,
            Some((&mut stats, AmafWeights::default())),
        );

        assert_eq!(tree.get(root).visit_count, 1);
        assert!(stats.is_empty());
    }
}
