//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. Children are owned top-down through
//! per-move slots; the parent link is only used to walk back up.

use engine_core::{Context, Game};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::node::{MctsNode, NodeContext, NodeId};

/// Node representation chosen once per tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Every node pins one concrete state. Used for deterministic,
    /// perfect-information games (or when cheating is allowed).
    Closed,
    /// Nodes are re-sampled on every traversal. Used for games with chance
    /// events or hidden information.
    Open,
}

impl LoopMode {
    /// Pick the representation for a game.
    pub fn for_game<G: Game>(ctx: &Context<G>, cheat: bool) -> Self {
        if ctx.capabilities().requires_resampling() && !cheat {
            LoopMode::Open
        } else {
            LoopMode::Closed
        }
    }
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree<G: Game> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<G>>,

    /// Root node index
    root: NodeId,

    mode: LoopMode,

    num_players: usize,
}

impl<G: Game> MctsTree<G> {
    /// Create a new tree rooted at the position held by `ctx`.
    pub fn new(ctx: &Context<G>, mode: LoopMode) -> Self {
        let num_players = ctx.capabilities().num_players;
        let context = match mode {
            LoopMode::Closed => NodeContext::Closed(ctx.clone()),
            LoopMode::Open => NodeContext::Open,
        };
        let root = MctsNode::new(NodeId::NONE, None, ctx, num_players, context);
        Self {
            nodes: vec![root],
            root: NodeId(0),
            mode,
            num_players,
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<G> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<G> {
        &mut self.nodes[id.index()]
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode<G>] {
        &self.nodes
    }

    /// Concrete state pinned at a closed-loop node.
    pub fn pinned_context(&self, id: NodeId) -> Option<&Context<G>> {
        match &self.get(id).context {
            NodeContext::Closed(ctx) => Some(ctx),
            NodeContext::Open => None,
        }
    }

    /// Working context for one iteration, positioned at the root.
    ///
    /// Closed-loop trees start from the root's pinned state. Open-loop trees
    /// start from the real position with a fresh chance RNG and, for
    /// hidden-information games, a fresh determinization for the player to
    /// move.
    pub fn begin_iteration(&self, real: &Context<G>, rng: &mut ChaCha20Rng) -> Context<G> {
        match (&self.mode, self.pinned_context(self.root)) {
            (LoopMode::Closed, Some(pinned)) => pinned.clone(),
            _ => {
                let mut working = real.clone();
                working.reseed(rng.gen());
                if working.capabilities().hidden_information {
                    let observer = working.current_player();
                    working.determinize(observer);
                }
                working
            }
        }
    }

    /// Move indices of `id` that are legal at `working`.
    ///
    /// Closed-loop nodes return every index. Open-loop nodes first append
    /// moves seen for the first time and then return the indices legal in
    /// this traversal only.
    pub fn legal_indices(&mut self, id: NodeId, working: &Context<G>) -> Vec<usize> {
        match self.mode {
            LoopMode::Closed => (0..self.get(id).legal_move_count()).collect(),
            LoopMode::Open => {
                let game = working.game().clone();
                let legal = working.legal_moves();
                let node = self.get_mut(id);
                node.mover = working.current_player();
                legal
                    .iter()
                    .map(|mv| node.index_of_or_insert(mv, game.move_identity(mv)))
                    .collect()
            }
        }
    }

    /// Context for the position after playing move `index` at `id`.
    ///
    /// Pure for closed-loop nodes. For open-loop nodes `from` is the current
    /// traversal's context and the result may differ between calls.
    pub fn descend(&self, id: NodeId, index: usize, from: &Context<G>) -> Context<G> {
        let node = self.get(id);
        let mut next = match &node.context {
            NodeContext::Closed(pinned) => pinned.clone(),
            NodeContext::Open => from.clone(),
        };
        next.apply(node.move_at(index));
        next
    }

    /// Advance `working` along an existing edge and return the child.
    pub fn step(&self, id: NodeId, index: usize, working: &mut Context<G>) -> Option<NodeId> {
        let child = self.get(id).child_at(index)?;
        match &self.get(child).context {
            NodeContext::Closed(pinned) => *working = pinned.clone(),
            NodeContext::Open => working.apply(self.get(id).move_at(index)),
        }
        Some(child)
    }

    /// Materialise the child for move `index`, advancing `working` to it.
    pub fn expand(&mut self, id: NodeId, index: usize, working: &mut Context<G>) -> NodeId {
        let context = match self.mode {
            LoopMode::Closed => {
                *working = self.descend(id, index, working);
                NodeContext::Closed(working.clone())
            }
            LoopMode::Open => {
                let mv = self.get(id).move_at(index).clone();
                working.apply(&mv);
                NodeContext::Open
            }
        };
        let child = MctsNode::new(id, Some(index), working, self.num_players, context);
        let child_id = self.allocate(child);
        self.get_mut(id).attach_child(index, child_id);
        child_id
    }

    /// Undo the expansion of `id`, which must be the most recently expanded
    /// node and must not have been visited.
    pub fn discard_leaf(&mut self, id: NodeId) {
        let (parent, index) = {
            let node = self.get(id);
            debug_assert_eq!(node.visit_count, 0, "discarding a visited node");
            (node.parent, node.parent_move)
        };
        if let (true, Some(index)) = (parent.is_some(), index) {
            self.get_mut(parent).children[index] = NodeId::NONE;
        }
        if id.index() + 1 == self.nodes.len() {
            self.nodes.pop();
        }
    }

    /// Allocate a new node and return its ID.
    fn allocate(&mut self, node: MctsNode<G>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Make `new_root` the root, dropping everything outside its subtree.
    ///
    /// Surviving nodes keep their statistics; the arena is compacted and
    /// indices are reassigned in breadth-first order.
    pub fn promote(&mut self, new_root: NodeId) {
        if new_root == self.root {
            return;
        }

        let mut remap = vec![NodeId::NONE; self.nodes.len()];
        let mut order = vec![new_root];
        remap[new_root.index()] = NodeId(0);
        let mut head = 0;
        while head < order.len() {
            let id = order[head];
            head += 1;
            for &child in &self.nodes[id.index()].children {
                if child.is_some() {
                    remap[child.index()] = NodeId(order.len() as u32);
                    order.push(child);
                }
            }
        }

        let mut old: Vec<Option<MctsNode<G>>> = self.nodes.drain(..).map(Some).collect();
        let mut compacted = Vec::with_capacity(order.len());
        for id in order {
            if let Some(mut node) = old[id.index()].take() {
                node.parent = if id == new_root {
                    NodeId::NONE
                } else {
                    remap[node.parent.index()]
                };
                if id == new_root {
                    node.parent_move = None;
                }
                for child in node.children.iter_mut() {
                    if child.is_some() {
                        *child = remap[child.index()];
                    }
                }
                compacted.push(node);
            }
        }

        self.nodes = compacted;
        self.root = NodeId(0);
    }

    /// Visit counts of the root's children, aligned with the root's moves.
    pub fn root_visits(&self) -> Vec<u32> {
        let root = self.get(self.root);
        root.children
            .iter()
            .map(|&c| if c.is_some() { self.get(c).visit_count } else { 0 })
            .collect()
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.average_score(root.mover),
            max_depth: self.compute_max_depth(),
        }
    }

    fn compute_max_depth(&self) -> u32 {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in &self.get(id).children {
                if child.is_some() {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    /// Root average for the player to move at the root
    pub root_value: f64,
    pub max_depth: u32,
}
