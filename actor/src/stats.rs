//! Actor statistics tracking and persistence.
//!
//! This module provides statistics tracking for the actor, including:
//! - Episode counts and outcomes per player
//! - Search effort (iterations, tree reuse)
//!
//! Stats are written to `actor_stats.json` in the data directory.

use mcts::SearchStats;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Aggregated actor statistics, designed for lock-free updates.
#[derive(Debug)]
pub struct ActorStats {
    episodes_completed: AtomicU32,
    total_steps: AtomicU64,
    /// Episodes won outright by each player
    wins: Vec<AtomicU32>,
    /// Episodes with no single best player
    draws: AtomicU32,
    searches: AtomicU64,
    iterations: AtomicU64,
    reused_searches: AtomicU64,
    start_time: Instant,
    stats_path: String,
    env_id: String,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorStatsSnapshot {
    pub env_id: String,
    pub episodes_completed: u32,
    pub total_steps: u64,
    pub wins: Vec<u32>,
    pub draws: u32,
    pub avg_episode_length: f64,
    pub episodes_per_second: f64,
    pub runtime_seconds: f64,
    pub searches: u64,
    pub avg_iterations_per_search: f64,
    /// Fraction of searches that started from a reused subtree
    pub reuse_rate: f64,
    pub timestamp: u64,
}

/// Index of the player with the strictly highest utility, if any.
fn winner(utilities: &[f64]) -> Option<usize> {
    let (best, &top) = utilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    let tied = utilities.iter().filter(|&&u| u == top).count();
    (tied == 1).then_some(best)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

impl ActorStats {
    /// Create new stats tracker.
    pub fn new(data_dir: &str, env_id: &str, num_players: usize) -> Self {
        let stats_path = format!("{}/actor_stats.json", data_dir);

        // Ensure data directory exists
        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!("Failed to create data directory: {}", e);
        }

        Self {
            episodes_completed: AtomicU32::new(0),
            total_steps: AtomicU64::new(0),
            wins: (0..num_players).map(|_| AtomicU32::new(0)).collect(),
            draws: AtomicU32::new(0),
            searches: AtomicU64::new(0),
            iterations: AtomicU64::new(0),
            reused_searches: AtomicU64::new(0),
            start_time: Instant::now(),
            stats_path,
            env_id: env_id.to_string(),
        }
    }

    /// Record a completed episode from its terminal utilities.
    pub fn record_episode(&self, steps: u32, utilities: &[f64]) {
        self.episodes_completed.fetch_add(1, Ordering::Relaxed);
        self.total_steps.fetch_add(steps as u64, Ordering::Relaxed);

        match winner(utilities).and_then(|p| self.wins.get(p)) {
            Some(count) => {
                count.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.draws.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record one search call.
    pub fn record_search(&self, stats: &SearchStats) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.iterations
            .fetch_add(stats.iterations, Ordering::Relaxed);
        if stats.reused {
            self.reused_searches.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> ActorStatsSnapshot {
        let episodes = self.episodes_completed.load(Ordering::Relaxed);
        let total_steps = self.total_steps.load(Ordering::Relaxed);
        let runtime = self.start_time.elapsed().as_secs_f64();
        let searches = self.searches.load(Ordering::Relaxed);
        let iterations = self.iterations.load(Ordering::Relaxed);
        let reused = self.reused_searches.load(Ordering::Relaxed);

        ActorStatsSnapshot {
            env_id: self.env_id.clone(),
            episodes_completed: episodes,
            total_steps,
            wins: self.wins.iter().map(|w| w.load(Ordering::Relaxed)).collect(),
            draws: self.draws.load(Ordering::Relaxed),
            avg_episode_length: ratio(total_steps as f64, episodes as f64),
            episodes_per_second: ratio(episodes as f64, runtime),
            runtime_seconds: runtime,
            searches,
            avg_iterations_per_search: ratio(iterations as f64, searches as f64),
            reuse_rate: ratio(reused as f64, searches as f64),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize actor stats: {}", e);
                return;
            }
        };

        // Write to temp file then rename (atomic on most filesystems)
        let temp_path = format!("{}.tmp", self.stats_path);
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write actor stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote actor stats to {}", self.stats_path);
    }

    pub fn stats_path(&self) -> &str {
        &self.stats_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn search_stats(iterations: u64, reused: bool) -> SearchStats {
        SearchStats {
            iterations,
            reused,
            ..SearchStats::default()
        }
    }

    #[test]
    fn test_record_episode() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        stats.record_episode(9, &[1.0, -1.0]);
        stats.record_episode(8, &[-1.0, 1.0]);
        stats.record_episode(9, &[0.0, 0.0]);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.episodes_completed, 3);
        assert_eq!(snapshot.wins, vec![1, 1]);
        assert_eq!(snapshot.draws, 1);
        assert_eq!(snapshot.total_steps, 26);
    }

    #[test]
    fn test_shared_top_utility_is_a_draw() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "multi", 3);

        stats.record_episode(4, &[1.0, 1.0, -1.0]);
        stats.record_episode(4, &[-1.0, -1.0, 1.0]);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.wins, vec![0, 0, 1]);
        assert_eq!(snapshot.draws, 1);
    }

    #[test]
    fn test_winner() {
        assert_eq!(winner(&[0.5, -0.5]), Some(0));
        assert_eq!(winner(&[0.0, 0.0]), None);
        assert_eq!(winner(&[]), None);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        stats.record_episode(9, &[1.0, -1.0]);
        stats.write_stats();

        let path = Path::new(stats.stats_path());
        assert!(path.exists());

        let content = fs::read_to_string(path).unwrap();
        let parsed: ActorStatsSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.episodes_completed, 1);
        assert_eq!(parsed.wins, vec![1, 0]);
    }

    #[test]
    fn test_averages_with_nothing_recorded() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.avg_episode_length, 0.0);
        assert_eq!(snapshot.avg_iterations_per_search, 0.0);
        assert_eq!(snapshot.reuse_rate, 0.0);
    }

    #[test]
    fn test_search_accumulation() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        stats.record_search(&search_stats(100, false));
        stats.record_search(&search_stats(300, true));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.searches, 2);
        assert!((snapshot.avg_iterations_per_search - 200.0).abs() < 1e-9);
        assert!((snapshot.reuse_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stats_path_format() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        let stats = ActorStats::new(dir_path, "tictactoe", 2);

        let expected = format!("{}/actor_stats.json", dir_path);
        assert_eq!(stats.stats_path(), expected);
    }

    #[test]
    fn test_avg_episode_length_calculation() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        stats.record_episode(6, &[1.0, -1.0]);
        stats.record_episode(10, &[-1.0, 1.0]);
        stats.record_episode(8, &[0.0, 0.0]);

        let snapshot = stats.snapshot();
        assert!((snapshot.avg_episode_length - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_write_stats_overwrites() {
        let dir = tempdir().unwrap();
        let stats = ActorStats::new(dir.path().to_str().unwrap(), "tictactoe", 2);

        stats.record_episode(5, &[1.0, -1.0]);
        stats.write_stats();
        stats.record_episode(7, &[-1.0, 1.0]);
        stats.write_stats();

        let content = fs::read_to_string(stats.stats_path()).unwrap();
        let parsed: ActorStatsSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.episodes_completed, 2);
        assert!(!Path::new(&format!("{}.tmp", stats.stats_path())).exists());
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let stats = Arc::new(ActorStats::new(
            dir.path().to_str().unwrap(),
            "tictactoe",
            2,
        ));

        let mut handles = vec![];
        for _ in 0..10 {
            let stats_clone = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats_clone.record_episode(5, &[1.0, -1.0]);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.episodes_completed, 1000);
        assert_eq!(snapshot.wins[0], 1000);
    }
}
