//! Move-keyed statistics shared across tree positions (GRAVE/AMAF, MAST).
//!
//! The same abstract move (same mover, same board addressing) is pooled into
//! one entry no matter where in the tree it was played. Entries are created
//! lazily, decayed at the start of every search call and dropped entirely
//! when a new game starts.

use std::collections::HashMap;

use engine_core::{MoveIdentity, MoveKind};

/// Canonical identity of a move for statistics pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveKey {
    mover: usize,
    a: i32,
    b: i32,
    oriented: bool,
    kind: MoveKind,
    /// Only meaningful for pass/swap moves; zero otherwise.
    depth: usize,
}

impl MoveKey {
    /// Build the key for `identity` played by `mover` after `depth` moves.
    ///
    /// Non-oriented moves store their endpoints in sorted order so that
    /// `A -> B` and `B -> A` compare equal.
    pub fn new(mover: usize, identity: MoveIdentity, depth: usize) -> Self {
        let (a, b) = if identity.oriented {
            (identity.from, identity.to)
        } else {
            (identity.from.min(identity.to), identity.from.max(identity.to))
        };
        let depth = match identity.kind {
            MoveKind::Normal => 0,
            MoveKind::Pass | MoveKind::Swap => depth,
        };
        Self {
            mover,
            a,
            b,
            oriented: identity.oriented,
            kind: identity.kind,
            depth,
        }
    }

    pub fn mover(&self) -> usize {
        self.mover
    }
}

/// Visit and score totals for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionStatistics {
    pub visit_count: f64,
    pub accumulated_score: f64,
}

impl ActionStatistics {
    /// Mean score, or `None` before the first visit.
    #[inline]
    pub fn average(&self) -> Option<f64> {
        if self.visit_count > 0.0 {
            Some(self.accumulated_score / self.visit_count)
        } else {
            None
        }
    }
}

/// Session-scoped table of [`ActionStatistics`] keyed by [`MoveKey`].
#[derive(Debug, Clone, Default)]
pub struct GlobalActionStats {
    table: HashMap<MoveKey, ActionStatistics>,
}

impl GlobalActionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MoveKey) -> Option<&ActionStatistics> {
        self.table.get(key)
    }

    /// Add `weight` visits and `weight * score` to the entry for `key`.
    pub fn update(&mut self, key: MoveKey, weight: f64, score: f64) {
        let entry = self.table.entry(key).or_default();
        entry.visit_count += weight;
        entry.accumulated_score += weight * score;
    }

    /// Scale every counter by `factor`.
    pub fn decay(&mut self, factor: f64) {
        for stats in self.table.values_mut() {
            stats.visit_count *= factor;
            stats.accumulated_score *= factor;
        }
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MoveKey, &ActionStatistics)> {
        self.table.iter()
    }
}
