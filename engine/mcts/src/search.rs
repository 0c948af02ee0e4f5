//! MCTS search controller.
//!
//! One [`Mcts::select_move`] call runs the search loop for a single real
//! decision:
//! 1. Root acquisition: reuse the subtree reached by the moves played since
//!    the previous call, or build a fresh root
//! 2. Selection: walk the tree with the selection strategy, expanding the
//!    first missing child
//! 3. Playout: complete the trial with the playout strategy
//! 4. Backpropagation: credit the utilities to every node on the path and,
//!    when enabled, to the pooled move statistics
//!
//! Iterations run strictly one after another. An interrupt (or the deadline)
//! observed mid-iteration throws that iteration away, so the returned move is
//! always derived from completed iterations only.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_core::{Context, EncodeError, Game};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::backprop::{backpropagate, AmafWeights};
use crate::config::{FinalMoveKind, MctsConfig, PlayoutKind, SelectionKind};
use crate::final_move::{
    FinalMoveStrategy, MaxAvgScore, ProportionalExpVisitCount, RegularizedFinal, RobustChild,
};
use crate::node::NodeId;
use crate::playout::{
    EpsilonGreedyPlayout, MastPlayout, PlayoutEnv, PlayoutOutcome, PlayoutStrategy,
    RandomPlayout, SoftmaxPlayout,
};
use crate::policy::{compute_priors, MovePolicy, PolicyError, UniformPolicy};
use crate::selection::{
    Puct, RegularizedSelection, SelectionEnv, SelectionStrategy, Ucb1, Ucb1Grave,
};
use crate::stats::GlobalActionStats;
use crate::tree::{LoopMode, MctsTree};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("{strategy} does not support game '{game}'")]
    UnsupportedGame { strategy: &'static str, game: String },

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("No search has been run yet")]
    NoSearchResult,
}

/// Counters from the most recent search call.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Completed iterations
    pub iterations: u64,
    /// Actions taken by the last completed playout
    pub last_playout_actions: usize,
    /// Value estimate of the chosen move for the player to move
    pub value: f64,
    /// Visits of the chosen move
    pub chosen_visits: u32,
    /// Nodes in the tree when the search finished
    pub tree_nodes: usize,
    /// Whether the root came from the previous call's tree
    pub reused: bool,
    /// Whether the loop stopped on the interrupt flag
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Imitation-learning sample for the position of the last search.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    /// Encoded state
    pub state: Vec<u8>,
    /// Encoded legal moves, in `Context::legal_moves` order
    pub moves: Vec<Vec<u8>>,
    /// Visit distribution over `moves`
    pub policy: Vec<f64>,
    /// Root value estimate for `mover`
    pub value: f64,
    pub mover: usize,
}

/// Root statistics of the last search, aligned with the real legal moves.
#[derive(Debug, Clone)]
struct RootSummary<M> {
    moves: Vec<M>,
    visits: Vec<u32>,
    values: Vec<Option<f64>>,
    chosen: usize,
    root_value: f64,
    mover: usize,
}

/// Where the kept tree's root sits in the real game.
#[derive(Debug, Clone)]
struct ReuseAnchor<M> {
    /// Trail length at the kept root
    trail_len: usize,
    /// Last trail move at the kept root, if any
    entry: Option<M>,
}

enum IterationOutcome {
    Completed { playout_actions: usize },
    Aborted,
}

/// Monte Carlo Tree Search agent for one seat of one game.
pub struct Mcts<G: Game> {
    config: MctsConfig,
    selection: Box<dyn SelectionStrategy<G>>,
    playout: Box<dyn PlayoutStrategy<G>>,
    final_move: Box<dyn FinalMoveStrategy<G>>,
    policy: Option<Arc<dyn MovePolicy<G>>>,
    tree: Option<MctsTree<G>>,
    anchor: Option<ReuseAnchor<G::Move>>,
    global_stats: GlobalActionStats,
    rng: ChaCha20Rng,
    interrupt: Arc<AtomicBool>,
    preserve_tree: bool,
    stats: SearchStats,
    last: Option<RootSummary<G::Move>>,
}

fn build_selection<G: Game>(config: &MctsConfig) -> Box<dyn SelectionStrategy<G>> {
    match config.selection {
        SelectionKind::Ucb1 => Box::new(Ucb1::new(config.exploration)),
        SelectionKind::Ucb1Grave => Box::new(Ucb1Grave::new(config.exploration, config.grave_bias)),
        SelectionKind::Puct => Box::new(Puct::new(config.exploration)),
        SelectionKind::Regularized => Box::new(RegularizedSelection::new(config.exploration)),
    }
}

fn build_playout<G: Game>(
    config: &MctsConfig,
    policy: Option<&Arc<dyn MovePolicy<G>>>,
) -> Box<dyn PlayoutStrategy<G>> {
    let base: Box<dyn PlayoutStrategy<G>> = match config.playout {
        PlayoutKind::Random => Box::new(RandomPlayout::new()),
        PlayoutKind::Softmax => {
            let policy = policy
                .cloned()
                .unwrap_or_else(|| Arc::new(UniformPolicy::new()));
            Box::new(SoftmaxPlayout::new(policy))
        }
        PlayoutKind::Mast => Box::new(MastPlayout::new(config.mast_tau)),
    };
    if config.playout_epsilon > 0.0 {
        Box::new(EpsilonGreedyPlayout::new(base, config.playout_epsilon))
    } else {
        base
    }
}

fn build_final_move<G: Game>(config: &MctsConfig) -> Box<dyn FinalMoveStrategy<G>> {
    match config.final_move {
        FinalMoveKind::RobustChild => Box::new(RobustChild),
        FinalMoveKind::MaxAvgScore => Box::new(MaxAvgScore),
        FinalMoveKind::ProportionalExpVisitCount => {
            Box::new(ProportionalExpVisitCount::new(config.final_temperature))
        }
        FinalMoveKind::Regularized => Box::new(RegularizedFinal::new(config.exploration)),
    }
}

impl<G: Game> Mcts<G> {
    /// Create an agent with the strategies named in `config`.
    pub fn new(config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self {
            selection: build_selection(&config),
            playout: build_playout(&config, None),
            final_move: build_final_move(&config),
            policy: None,
            tree: None,
            anchor: None,
            global_stats: GlobalActionStats::new(),
            rng,
            interrupt: Arc::new(AtomicBool::new(false)),
            preserve_tree: false,
            stats: SearchStats::default(),
            last: None,
            config,
        }
    }

    /// Plain UCT: UCB1 selection, random playouts, robust child.
    pub fn uct() -> Self {
        Self::new(MctsConfig::default())
    }

    /// Attach a learned policy used for priors and softmax playouts.
    pub fn with_policy(mut self, policy: Arc<dyn MovePolicy<G>>) -> Self {
        if self.config.playout == PlayoutKind::Softmax {
            self.playout = build_playout(&self.config, Some(&policy));
        }
        self.policy = Some(policy);
        self
    }

    pub fn with_selection(mut self, selection: Box<dyn SelectionStrategy<G>>) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_playout(mut self, playout: Box<dyn PlayoutStrategy<G>>) -> Self {
        self.playout = playout;
        self
    }

    pub fn with_final_move(mut self, final_move: Box<dyn FinalMoveStrategy<G>>) -> Self {
        self.final_move = final_move;
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Shared flag that stops the current search at the next check.
    ///
    /// The flag is never cleared by the engine.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Keep the searched tree untouched after `select_move` for inspection.
    pub fn set_preserve_tree(&mut self, preserve: bool) {
        self.preserve_tree = preserve;
    }

    /// Counters from the most recent search.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// The tree kept for the next call, if any.
    ///
    /// With tree reuse this is the chosen child promoted to root, not the
    /// root that was searched. Call `set_preserve_tree(true)` beforehand to
    /// inspect the searched root itself.
    pub fn tree(&self) -> Option<&MctsTree<G>> {
        self.tree.as_ref()
    }

    pub fn global_stats(&self) -> &GlobalActionStats {
        &self.global_stats
    }

    fn global_stats_enabled(&self) -> bool {
        self.config.global_stats
            || self.selection.uses_global_stats()
            || self.playout.uses_global_stats()
    }

    /// Reset all per-game state and check that the strategies can play `ctx`'s game.
    pub fn init_game(&mut self, ctx: &Context<G>) -> Result<(), SearchError> {
        let caps = ctx.capabilities();
        if !self.playout.supports_game(&caps) {
            return Err(SearchError::UnsupportedGame {
                strategy: self.playout.name(),
                game: caps.id.env_id,
            });
        }
        if let Some(policy) = &self.policy {
            if self.selection.uses_priors() && !policy.supports_game(&caps) {
                return Err(SearchError::UnsupportedGame {
                    strategy: self.selection.name(),
                    game: caps.id.env_id,
                });
            }
        }

        self.tree = None;
        self.anchor = None;
        self.global_stats.clear();
        self.stats = SearchStats::default();
        self.last = None;
        debug!(
            game = %caps.id.env_id,
            selection = self.selection.name(),
            playout = self.playout.name(),
            final_move = self.final_move.name(),
            "MCTS initialised for new game"
        );
        Ok(())
    }

    /// Search the position held by `ctx` and return the move to play.
    ///
    /// `max_seconds <= 0` means no time limit, `max_iterations < 0` means no
    /// iteration limit and `max_depth == 0` means unlimited selection depth.
    /// With neither limit the search runs until interrupted.
    pub fn select_move(
        &mut self,
        ctx: &Context<G>,
        max_seconds: f64,
        max_iterations: i64,
        max_depth: usize,
    ) -> Result<G::Move, SearchError> {
        let start = Instant::now();
        let real_moves = ctx.legal_moves();
        if real_moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        let (mut tree, reused) = self.acquire_root(ctx);

        if self.global_stats_enabled() {
            self.global_stats.decay(self.config.global_stats_decay);
        }
        self.prepare_root_priors(&mut tree, ctx)?;

        let deadline = self.search_deadline(start, max_seconds, real_moves.len());
        let mut iterations = 0u64;
        let mut last_playout_actions = 0;
        let mut interrupted = false;
        loop {
            if max_iterations >= 0 && iterations >= max_iterations as u64 {
                break;
            }
            if self.interrupt.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            match self.run_iteration(&mut tree, ctx, max_depth, deadline)? {
                IterationOutcome::Completed { playout_actions } => {
                    iterations += 1;
                    last_playout_actions = playout_actions;
                }
                IterationOutcome::Aborted => {
                    interrupted = self.interrupt.load(Ordering::Relaxed);
                    break;
                }
            }
        }

        let root_id = tree.root();
        let candidates = tree.legal_indices(root_id, ctx);
        let index = self.final_move.choose(&tree, &candidates, &mut self.rng);
        let root = tree.get(root_id);
        let chosen = root.move_at(index).clone();
        let (chosen_visits, value) = match root.child_at(index) {
            Some(child) if tree.get(child).visit_count > 0 => {
                let child = tree.get(child);
                (child.visit_count, child.average_score(root.mover))
            }
            _ => (0, 0.0),
        };

        self.last = Some(self.summarise(&tree, ctx, &real_moves, &chosen));
        self.stats = SearchStats {
            iterations,
            last_playout_actions,
            value,
            chosen_visits,
            tree_nodes: tree.len(),
            reused,
            interrupted,
            elapsed: start.elapsed(),
        };
        debug!(
            iterations,
            value,
            chosen_visits,
            nodes = tree.len(),
            reused,
            interrupted,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "MCTS search complete"
        );

        self.keep_tree(tree, ctx, index, &chosen);
        Ok(chosen)
    }

    /// Take the previous tree if it still describes `ctx`, else build a new one.
    fn acquire_root(&mut self, ctx: &Context<G>) -> (MctsTree<G>, bool) {
        let previous = self.tree.take();
        let anchor = self.anchor.take();
        let mode = LoopMode::for_game(ctx, self.config.cheat);

        if let (true, Some(mut tree), Some(anchor)) = (self.config.tree_reuse, previous, anchor) {
            match Self::replay(&tree, &anchor, ctx) {
                Some(root) => {
                    tree.promote(root);
                    let stale = tree
                        .pinned_context(tree.root())
                        .is_some_and(|pinned| pinned.state() != ctx.state());
                    if stale {
                        debug!("Pinned root differs from the real state, building a new tree");
                    } else {
                        debug!(
                            nodes = tree.len(),
                            root_visits = tree.get(tree.root()).visit_count,
                            "Reusing search tree"
                        );
                        return (tree, true);
                    }
                }
                None => debug!("Moves since the last search are not in the tree"),
            }
        }
        (MctsTree::new(ctx, mode), false)
    }

    /// Follow the real moves played since `anchor` down the tree.
    fn replay(
        tree: &MctsTree<G>,
        anchor: &ReuseAnchor<G::Move>,
        ctx: &Context<G>,
    ) -> Option<NodeId> {
        let trail = ctx.trail();
        if trail.len() < anchor.trail_len {
            return None;
        }
        if anchor.trail_len > 0 {
            match &anchor.entry {
                Some(mv) if trail[anchor.trail_len - 1].mv == *mv => {}
                _ => return None,
            }
        }
        let mut current = tree.root();
        for entry in &trail[anchor.trail_len..] {
            current = tree.get(current).find_child_for_move(&entry.mv)?;
        }
        Some(current)
    }

    /// Refresh root priors (with optional Dirichlet noise) for prior-based selection.
    fn prepare_root_priors(
        &mut self,
        tree: &mut MctsTree<G>,
        ctx: &Context<G>,
    ) -> Result<(), SearchError> {
        if !self.selection.uses_priors() {
            return Ok(());
        }
        let root_id = tree.root();
        if tree.mode() == LoopMode::Open {
            tree.legal_indices(root_id, ctx);
        }
        let priors = self.root_priors(ctx, &tree.get(root_id).moves)?;
        tree.get_mut(root_id).priors = Some(priors);
        Ok(())
    }

    /// Policy priors over the root's moves, mixed with Dirichlet noise when
    /// configured.
    fn root_priors(&mut self, ctx: &Context<G>, moves: &[G::Move]) -> Result<Vec<f64>, SearchError> {
        let mut priors = compute_priors(self.policy.as_deref(), ctx, moves)?;
        if self.config.dirichlet_alpha > 0.0 && priors.len() > 1 {
            let noise = dirichlet_noise(priors.len(), self.config.dirichlet_alpha, &mut self.rng);
            let eps = self.config.dirichlet_epsilon;
            for (p, n) in priors.iter_mut().zip(noise) {
                *p = (1.0 - eps) * *p + eps * n;
            }
        }
        Ok(priors)
    }

    fn search_deadline(&self, start: Instant, max_seconds: f64, root_moves: usize) -> Option<Instant> {
        let autoplay = self.config.autoplay_seconds;
        let seconds = if root_moves == 1
            && autoplay >= 0.0
            && (max_seconds <= 0.0 || autoplay < max_seconds)
        {
            autoplay
        } else if max_seconds > 0.0 {
            max_seconds
        } else {
            return None;
        };
        Duration::try_from_secs_f64(seconds)
            .ok()
            .and_then(|d| start.checked_add(d))
    }

    /// One Selection, Expansion, Playout and Backpropagation pass.
    fn run_iteration(
        &mut self,
        tree: &mut MctsTree<G>,
        real: &Context<G>,
        max_depth: usize,
        deadline: Option<Instant>,
    ) -> Result<IterationOutcome, SearchError> {
        let mut working = tree.begin_iteration(real, &mut self.rng);
        let mut current = tree.root();
        let mut expanded = None;
        let mut edges = 0;

        while !working.is_terminal() && (max_depth == 0 || edges < max_depth) {
            let legal = tree.legal_indices(current, &working);
            if legal.is_empty() {
                break;
            }
            if self.selection.uses_priors() {
                let node = tree.get(current);
                let stale = node
                    .priors
                    .as_ref()
                    .map_or(true, |p| p.len() != node.legal_move_count());
                if stale {
                    // An open-loop root that grew new moves keeps its noise
                    let priors = if current == tree.root() {
                        self.root_priors(&working, &node.moves)?
                    } else {
                        compute_priors(self.policy.as_deref(), &working, &node.moves)?
                    };
                    tree.get_mut(current).priors = Some(priors);
                }
            }

            let env = SelectionEnv {
                q_init: self.config.q_init,
                global_stats: &self.global_stats,
            };
            let index = self.selection.select(tree, current, &legal, &env, &mut self.rng);
            edges += 1;
            match tree.step(current, index, &mut working) {
                Some(child) => current = child,
                None => {
                    current = tree.expand(current, index, &mut working);
                    expanded = Some(current);
                    break;
                }
            }
        }

        let playout_actions = if working.is_terminal() {
            0
        } else {
            working.reseed(self.rng.gen());
            let env = PlayoutEnv {
                global_stats: &self.global_stats,
                action_cap: self.config.playout_action_cap,
                deadline,
                interrupt: &self.interrupt,
            };
            match self.playout.run_playout(&mut working, &env, &mut self.rng)? {
                PlayoutOutcome::Completed { actions } => actions,
                PlayoutOutcome::Aborted => {
                    if let Some(leaf) = expanded {
                        tree.discard_leaf(leaf);
                    }
                    trace!(edges, "Discarded interrupted iteration");
                    return Ok(IterationOutcome::Aborted);
                }
            }
        };

        let utilities = working.utilities();
        let weights = AmafWeights {
            selection: self.config.amaf_selection_weight,
            playout: self.config.amaf_playout_weight,
        };
        let global = if self.global_stats_enabled() {
            Some((&mut self.global_stats, weights))
        } else {
            None
        };
        backpropagate(tree, current, &working, &utilities, playout_actions, global);

        trace!(edges, playout_actions, "MCTS iteration complete");
        Ok(IterationOutcome::Completed { playout_actions })
    }

    fn summarise(
        &self,
        tree: &MctsTree<G>,
        ctx: &Context<G>,
        real_moves: &[G::Move],
        chosen: &G::Move,
    ) -> RootSummary<G::Move> {
        let root = tree.get(tree.root());
        let mover = ctx.current_player();
        let (visits, values) = real_moves
            .iter()
            .map(|mv| match root.find_child_for_move(mv).map(|id| tree.get(id)) {
                Some(child) if child.visit_count > 0 => {
                    (child.visit_count, Some(child.average_score(mover)))
                }
                _ => (0, None),
            })
            .unzip();
        RootSummary {
            moves: real_moves.to_vec(),
            visits,
            values,
            chosen: real_moves.iter().position(|m| m == chosen).unwrap_or(0),
            root_value: root.average_score(mover),
            mover,
        }
    }

    /// Drop, cut or keep the tree after a search.
    fn keep_tree(&mut self, mut tree: MctsTree<G>, ctx: &Context<G>, index: usize, chosen: &G::Move) {
        let trail_len = ctx.num_moves_played();
        if self.preserve_tree {
            self.anchor = Some(ReuseAnchor {
                trail_len,
                entry: ctx.trail().last().map(|e| e.mv.clone()),
            });
            self.tree = Some(tree);
            return;
        }
        if !self.config.tree_reuse {
            return;
        }
        if let Some(child) = tree.get(tree.root()).child_at(index) {
            tree.promote(child);
            self.anchor = Some(ReuseAnchor {
                trail_len: trail_len + 1,
                entry: Some(chosen.clone()),
            });
            self.tree = Some(tree);
        }
    }

    /// Visit distribution of the last search over the searched position's
    /// legal moves (uniform if nothing was visited, empty before any search).
    pub fn root_visit_distribution(&self) -> Vec<f64> {
        let Some(last) = &self.last else {
            return Vec::new();
        };
        let total: u32 = last.visits.iter().sum();
        if total == 0 {
            return vec![1.0 / last.moves.len() as f64; last.moves.len()];
        }
        last.visits
            .iter()
            .map(|&v| v as f64 / total as f64)
            .collect()
    }

    /// Encode the last searched position with its visit distribution.
    ///
    /// `ctx` must be the context passed to the last `select_move`.
    pub fn training_sample(&self, ctx: &Context<G>) -> Result<TrainingSample, SearchError> {
        let last = self.last.as_ref().ok_or(SearchError::NoSearchResult)?;
        let mut state = Vec::new();
        G::encode_state(ctx.state(), &mut state)?;
        let moves = last
            .moves
            .iter()
            .map(|mv| {
                let mut buf = Vec::new();
                G::encode_move(mv, &mut buf)?;
                Ok(buf)
            })
            .collect::<Result<Vec<_>, EncodeError>>()?;
        Ok(TrainingSample {
            state,
            moves,
            policy: self.root_visit_distribution(),
            value: last.root_value,
            mover: last.mover,
        })
    }

    /// Human-readable summary of the last search.
    pub fn analysis_report(&self) -> String {
        let Some(last) = &self.last else {
            return "No search has been run".to_string();
        };
        let stats = &self.stats;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} / {} / {}: played {:?} (visits {}, value {:.3})",
            self.selection.name(),
            self.playout.name(),
            self.final_move.name(),
            last.moves[last.chosen],
            stats.chosen_visits,
            stats.value,
        );
        let _ = writeln!(
            out,
            "{} iterations in {:.3}s, {} nodes, reused: {}, interrupted: {}",
            stats.iterations,
            stats.elapsed.as_secs_f64(),
            stats.tree_nodes,
            stats.reused,
            stats.interrupted,
        );
        for (i, mv) in last.moves.iter().enumerate() {
            let marker = if i == last.chosen { '*' } else { ' ' };
            match last.values[i] {
                Some(value) => {
                    let _ = writeln!(
                        out,
                        "{} {:?}: visits {}, value {:.3}",
                        marker, mv, last.visits[i], value
                    );
                }
                None => {
                    let _ = writeln!(out, "{} {:?}: unvisited", marker, mv);
                }
            }
        }
        out
    }
}

/// Generate Dirichlet-distributed noise using Gamma variates.
fn dirichlet_noise(n: usize, alpha: f64, rng: &mut ChaCha20Rng) -> Vec<f64> {
    use rand_distr::{Distribution, Gamma};

    let uniform = vec![1.0 / n as f64; n];
    let Ok(gamma) = Gamma::new(alpha, 1.0) else {
        return uniform;
    };
    let mut samples: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();

    // Normalize
    let sum: f64 = samples.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for s in &mut samples {
            *s /= sum;
        }
        samples
    } else {
        uniform
    }
}
