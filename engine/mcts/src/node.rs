//! MCTS tree node representation.
//!
//! Each node is one visited position. Its legal moves are captured in a fixed
//! order when the node is created; a move's index in that list is its stable
//! identity for child slots, priors and statistics. Open-loop nodes may append
//! moves later but never reorder them.

use engine_core::{Context, Game, MoveIdentity};

use crate::config::QInit;

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a node reproduces its position.
#[derive(Debug)]
pub enum NodeContext<G: Game> {
    /// Pins one concrete successor state.
    Closed(Context<G>),
    /// Regenerated from the parent on every traversal.
    Open,
}

impl<G: Game> Clone for NodeContext<G> {
    fn clone(&self) -> Self {
        match self {
            NodeContext::Closed(ctx) => NodeContext::Closed(ctx.clone()),
            NodeContext::Open => NodeContext::Open,
        }
    }
}

/// A node in the MCTS tree.
#[derive(Debug)]
pub struct MctsNode<G: Game> {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Index of the incoming move in the parent's move list (None for root)
    pub parent_move: Option<usize>,

    /// Number of moves in the trail at this position
    pub depth: usize,

    /// Player to move at this position
    pub mover: usize,

    /// Moves in stable index order
    pub moves: Vec<G::Move>,

    /// Board addressing of `moves`, same indexing
    pub identities: Vec<MoveIdentity>,

    /// Child slot per move index (NONE until materialised)
    pub children: Vec<NodeId>,

    /// Number of completed iterations through this node
    pub visit_count: u32,

    /// Per-player sum of backpropagated utilities
    pub score_sums: Vec<f64>,

    /// Cached move priors, same indexing as `moves`
    pub priors: Option<Vec<f64>>,

    pub context: NodeContext<G>,
}

impl<G: Game> MctsNode<G> {
    /// Create a node for the position held by `ctx`.
    pub fn new(
        parent: NodeId,
        parent_move: Option<usize>,
        ctx: &Context<G>,
        num_players: usize,
        context: NodeContext<G>,
    ) -> Self {
        let moves = ctx.legal_moves();
        let identities = moves
            .iter()
            .map(|mv| ctx.game().move_identity(mv))
            .collect();
        let children = vec![NodeId::NONE; moves.len()];
        Self {
            parent,
            parent_move,
            depth: ctx.num_moves_played(),
            mover: ctx.current_player(),
            moves,
            identities,
            children,
            visit_count: 0,
            score_sums: vec![0.0; num_players],
            priors: None,
            context,
        }
    }

    #[inline]
    pub fn legal_move_count(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn move_at(&self, index: usize) -> &G::Move {
        &self.moves[index]
    }

    /// Child for the given move index, if it has been materialised.
    #[inline]
    pub fn child_at(&self, index: usize) -> Option<NodeId> {
        let id = self.children[index];
        id.is_some().then_some(id)
    }

    /// Fill an empty child slot. Each slot is filled at most once.
    pub fn attach_child(&mut self, index: usize, child: NodeId) {
        debug_assert!(
            self.children[index].is_none(),
            "child slot {} already attached",
            index
        );
        self.children[index] = child;
    }

    /// Append `mv` if it is not yet known and return its index.
    pub fn index_of_or_insert(&mut self, mv: &G::Move, identity: MoveIdentity) -> usize {
        if let Some(i) = self.moves.iter().position(|m| m == mv) {
            return i;
        }
        self.moves.push(mv.clone());
        self.identities.push(identity);
        self.children.push(NodeId::NONE);
        self.moves.len() - 1
    }

    /// Add one completed iteration's utilities.
    pub fn record_outcome(&mut self, utilities: &[f64]) {
        self.visit_count += 1;
        for (sum, u) in self.score_sums.iter_mut().zip(utilities) {
            *sum += u;
        }
    }

    /// Mean utility for `player`, or 0 before the first visit.
    #[inline]
    pub fn average_score(&self, player: usize) -> f64 {
        if self.visit_count == 0 {
            return 0.0;
        }
        self.score_sums.get(player).copied().unwrap_or(0.0) / self.visit_count as f64
    }

    /// Value assumed for an unvisited child of this node, from `player`'s view.
    pub fn unvisited_value_estimate(&self, player: usize, q_init: QInit) -> f64 {
        match q_init {
            QInit::Optimistic => QInit::OPTIMISTIC_VALUE,
            QInit::Pessimistic => -1.0,
            QInit::Draw => 0.0,
            QInit::Parent => self.average_score(player),
        }
    }

    /// Child reached by playing `mv` here, compared by game move equality.
    pub fn find_child_for_move(&self, mv: &G::Move) -> Option<NodeId> {
        self.moves
            .iter()
            .position(|m| m == mv)
            .and_then(|i| self.child_at(i))
    }

    /// Check if this node has any materialised children.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.children.iter().any(|c| c.is_some())
    }
}

impl<G: Game> Clone for MctsNode<G> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent,
            parent_move: self.parent_move,
            depth: self.depth,
            mover: self.mover,
            moves: self.moves.clone(),
            identities: self.identities.clone(),
            children: self.children.clone(),
            visit_count: self.visit_count,
            score_sums: self.score_sums.clone(),
            priors: self.priors.clone(),
            context: self.context.clone(),
        }
    }
}
