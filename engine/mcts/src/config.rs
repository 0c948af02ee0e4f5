//! MCTS configuration parameters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Score assumed for a child that has never been visited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QInit {
    /// A large finite value, so every child is tried once before any repeat.
    Optimistic,
    /// A certain loss (-1).
    Pessimistic,
    /// A draw (0).
    Draw,
    /// The parent's own average score.
    Parent,
}

impl QInit {
    /// Value used for [`QInit::Optimistic`]. Finite so score arithmetic stays ordered.
    pub const OPTIMISTIC_VALUE: f64 = 10_000.0;
}

/// Which selection strategy walks the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Ucb1,
    Ucb1Grave,
    Puct,
    Regularized,
}

/// Which playout strategy completes trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoutKind {
    Random,
    Softmax,
    Mast,
}

/// How the move to play is picked from the finished root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalMoveKind {
    RobustChild,
    MaxAvgScore,
    ProportionalExpVisitCount,
    Regularized,
}

/// Error for unrecognised strategy names.
#[derive(Debug, Error, PartialEq)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! named_kind {
    ($ty:ident, $label:expr, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ParseKindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParseKindError {
                        kind: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_kind!(QInit, "q_init", {
    Optimistic => "optimistic",
    Pessimistic => "pessimistic",
    Draw => "draw",
    Parent => "parent",
});

named_kind!(SelectionKind, "selection strategy", {
    Ucb1 => "ucb1",
    Ucb1Grave => "ucb1_grave",
    Puct => "puct",
    Regularized => "regularized",
});

named_kind!(PlayoutKind, "playout strategy", {
    Random => "random",
    Softmax => "softmax",
    Mast => "mast",
});

named_kind!(FinalMoveKind, "final move strategy", {
    RobustChild => "robust_child",
    MaxAvgScore => "max_avg_score",
    ProportionalExpVisitCount => "proportional_exp_visit_count",
    Regularized => "regularized",
});

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    pub selection: SelectionKind,
    pub playout: PlayoutKind,
    pub final_move: FinalMoveKind,

    /// Exploration constant shared by the selection strategies.
    /// UCB1 traditionally uses sqrt(2).
    pub exploration: f64,

    /// Value estimate for unvisited children.
    pub q_init: QInit,

    /// Keep the chosen subtree between successive calls.
    pub tree_reuse: bool,

    /// Time allowance when the root has exactly one legal move.
    /// Negative disables the shortcut.
    pub autoplay_seconds: f64,

    /// Maintain the move-keyed statistics table even when no strategy
    /// reads it. GRAVE selection and MAST playout always enable it.
    pub global_stats: bool,

    /// Multiplicative decay applied to the statistics table per call.
    pub global_stats_decay: f64,

    /// Weight of Selection-prefix moves in the statistics table.
    pub amaf_selection_weight: f64,

    /// Weight of Playout moves in the statistics table.
    pub amaf_playout_weight: f64,

    /// Maximum actions per playout (0 = play to the end).
    pub playout_action_cap: usize,

    /// Probability of a uniformly random playout move (0 = no wrapper).
    pub playout_epsilon: f64,

    /// Gibbs temperature for MAST playouts.
    pub mast_tau: f64,

    /// GRAVE bias; smaller values trust the pooled statistics longer.
    pub grave_bias: f64,

    /// Temperature for proportional final-move sampling.
    pub final_temperature: f64,

    /// Dirichlet noise alpha for root priors (0 = disabled).
    pub dirichlet_alpha: f64,

    /// Fraction of the root prior replaced by Dirichlet noise.
    pub dirichlet_epsilon: f64,

    /// Pin sampled states even for stochastic or hidden-information games.
    pub cheat: bool,

    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            selection: SelectionKind::Ucb1,
            playout: PlayoutKind::Random,
            final_move: FinalMoveKind::RobustChild,
            exploration: std::f64::consts::SQRT_2,
            q_init: QInit::Optimistic,
            tree_reuse: true,
            autoplay_seconds: 0.1,
            global_stats: false,
            global_stats_decay: 0.6,
            amaf_selection_weight: 1.0,
            amaf_playout_weight: 1.0,
            playout_action_cap: 0,
            playout_epsilon: 0.0,
            mast_tau: 1.0,
            grave_bias: 1e-6,
            final_temperature: 1.0,
            dirichlet_alpha: 0.0,
            dirichlet_epsilon: 0.25,
            cheat: false,
            seed: None,
        }
    }
}

impl MctsConfig {
    /// Create config for self-play data generation (prior-guided, with root
    /// noise and proportional move sampling).
    pub fn for_training() -> Self {
        Self {
            selection: SelectionKind::Puct,
            final_move: FinalMoveKind::ProportionalExpVisitCount,
            exploration: 1.25,
            q_init: QInit::Parent,
            dirichlet_alpha: 0.3,
            ..Self::default()
        }
    }

    /// Create config for evaluation (no noise, deterministic final choice).
    pub fn for_evaluation() -> Self {
        Self {
            final_move: FinalMoveKind::RobustChild,
            dirichlet_alpha: 0.0,
            ..Self::default()
        }
    }

    /// Create a reproducible config for testing.
    pub fn for_testing() -> Self {
        Self {
            autoplay_seconds: 0.01,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Whether the statistics table has to be maintained.
    pub fn global_stats_enabled(&self) -> bool {
        self.global_stats
            || self.selection == SelectionKind::Ucb1Grave
            || self.playout == PlayoutKind::Mast
    }

    /// Builder pattern: set selection strategy.
    pub fn with_selection(mut self, kind: SelectionKind) -> Self {
        self.selection = kind;
        self
    }

    /// Builder pattern: set playout strategy.
    pub fn with_playout(mut self, kind: PlayoutKind) -> Self {
        self.playout = kind;
        self
    }

    /// Builder pattern: set final move strategy.
    pub fn with_final_move(mut self, kind: FinalMoveKind) -> Self {
        self.final_move = kind;
        self
    }

    /// Builder pattern: set exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_q_init(mut self, q_init: QInit) -> Self {
        self.q_init = q_init;
        self
    }

    pub fn with_tree_reuse(mut self, enabled: bool) -> Self {
        self.tree_reuse = enabled;
        self
    }

    pub fn with_autoplay_seconds(mut self, seconds: f64) -> Self {
        self.autoplay_seconds = seconds;
        self
    }

    pub fn with_global_stats(mut self, enabled: bool) -> Self {
        self.global_stats = enabled;
        self
    }

    pub fn with_amaf_weights(mut self, selection: f64, playout: f64) -> Self {
        self.amaf_selection_weight = selection;
        self.amaf_playout_weight = playout;
        self
    }

    pub fn with_playout_action_cap(mut self, cap: usize) -> Self {
        self.playout_action_cap = cap;
        self
    }

    pub fn with_playout_epsilon(mut self, epsilon: f64) -> Self {
        self.playout_epsilon = epsilon;
        self
    }

    /// Builder pattern: set final-move temperature.
    pub fn with_final_temperature(mut self, t: f64) -> Self {
        self.final_temperature = t;
        self
    }

    pub fn with_dirichlet(mut self, alpha: f64, epsilon: f64) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    pub fn with_cheat(mut self, cheat: bool) -> Self {
        self.cheat = cheat;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
