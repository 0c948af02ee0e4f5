//! Shared utilities for computing per-player utility vectors
//!
//! Game implementations report outcomes as utility vectors in [-1, 1], one
//! entry per player. These helpers convert the common outcome encodings into
//! that form so every game scores trials the same way.

/// Utility vector for a two-player game.
///
/// # Arguments
/// * `winner` - Winner indicator: 0=ongoing, 1=player one wins, 2=player two wins, 3=draw
///
/// # Returns
/// `[u0, u1]` with +1 for the winner, -1 for the loser and zeros for draws
/// or unfinished games.
///
/// # Example
/// ```
/// use engine_core::game_utils::two_player_utilities;
///
/// assert_eq!(two_player_utilities(1), vec![1.0, -1.0]);
/// assert_eq!(two_player_utilities(2), vec![-1.0, 1.0]);
/// assert_eq!(two_player_utilities(3), vec![0.0, 0.0]);
/// ```
#[inline]
pub fn two_player_utilities(winner: u8) -> Vec<f64> {
    match winner {
        1 => vec![1.0, -1.0],
        2 => vec![-1.0, 1.0],
        _ => vec![0.0, 0.0],
    }
}

/// Utility vector from finishing ranks (1 = best).
///
/// Ranks are mapped linearly onto [-1, 1]: first place scores 1, last place
/// scores -1. Shared ranks (ties) produce equal utilities, and fractional
/// ranks are allowed for averaged ties. A single player always scores 1 for
/// rank 1.
///
/// # Example
/// ```
/// use engine_core::game_utils::ranked_utilities;
///
/// assert_eq!(ranked_utilities(&[1.0, 3.0, 2.0]), vec![1.0, -1.0, 0.0]);
/// ```
pub fn ranked_utilities(ranks: &[f64]) -> Vec<f64> {
    let n = ranks.len();
    if n <= 1 {
        return ranks
            .iter()
            .map(|&r| if r <= 1.0 { 1.0 } else { -1.0 })
            .collect();
    }

    ranks
        .iter()
        .map(|&rank| {
            let u = 1.0 - 2.0 * (rank - 1.0) / (n as f64 - 1.0);
            u.clamp(-1.0, 1.0)
        })
        .collect()
}
