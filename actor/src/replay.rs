//! SQLite-based replay database for imitation-learning samples
//!
//! Each row is one searched position: the encoded state, the encoded legal
//! moves, the root visit distribution over those moves, the root value and
//! the final game outcome for the player who moved. Outcomes are backfilled
//! once the episode ends, so a whole episode is written in one transaction.

use anyhow::Result;
use mcts::TrainingSample;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// One searched position of a self-play episode
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySample {
    pub id: String,
    pub env_id: String,
    pub episode_id: String,
    pub step_number: u32,
    /// Player to move at this position
    pub mover: u32,
    pub state: Vec<u8>,
    /// Encoded legal moves, aligned with `policy`
    pub moves: Vec<Vec<u8>>,
    /// Root visit distribution
    pub policy: Vec<f32>,
    /// Root value estimate for `mover`
    pub root_value: f32,
    /// Final utility for `mover`, filled in when the episode ends
    pub game_outcome: Option<f32>,
    pub timestamp: u64,
}

impl ReplaySample {
    pub fn from_training(
        sample: TrainingSample,
        env_id: &str,
        episode_id: &str,
        step_number: u32,
    ) -> Result<Self> {
        Ok(Self {
            id: format!("{}-step-{}", episode_id, step_number),
            env_id: env_id.to_string(),
            episode_id: episode_id.to_string(),
            step_number,
            mover: sample.mover as u32,
            state: sample.state,
            moves: sample.moves,
            policy: sample.policy.iter().map(|&p| p as f32).collect(),
            root_value: sample.value as f32,
            game_outcome: None,
            timestamp: SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
        })
    }
}

/// Fill in every sample's outcome from the terminal utilities.
pub fn backfill_outcomes(samples: &mut [ReplaySample], utilities: &[f64]) {
    for sample in samples {
        sample.game_outcome = utilities.get(sample.mover as usize).map(|&u| u as f32);
    }
}

fn policy_to_bytes(policy: &[f32]) -> Vec<u8> {
    policy.iter().flat_map(|p| p.to_le_bytes()).collect()
}

fn policy_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<ReplaySample> {
    let moves_json: String = row.get(6)?;
    let moves = serde_json::from_str(&moves_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ReplaySample {
        id: row.get(0)?,
        env_id: row.get(1)?,
        episode_id: row.get(2)?,
        step_number: row.get(3)?,
        mover: row.get(4)?,
        state: row.get(5)?,
        moves,
        policy: policy_from_bytes(&row.get::<_, Vec<u8>>(7)?),
        root_value: row.get::<_, f64>(8)? as f32,
        game_outcome: row.get::<_, Option<f64>>(9)?.map(|v| v as f32),
        timestamp: row.get::<_, i64>(10)? as u64,
    })
}

/// SQLite-based replay buffer
pub struct ReplayBuffer {
    conn: Connection,
}

impl ReplayBuffer {
    /// Open the replay database, creating the file and schema if needed
    pub fn new(db_path: &str) -> Result<Self> {
        // Create parent directories if they don't exist
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS samples (
                id TEXT PRIMARY KEY,
                env_id TEXT NOT NULL,
                episode_id TEXT NOT NULL,
                step_number INTEGER NOT NULL,
                mover INTEGER NOT NULL,
                state BLOB NOT NULL,
                moves TEXT NOT NULL,
                policy BLOB NOT NULL,
                root_value REAL NOT NULL,
                game_outcome REAL,
                timestamp INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        // Create index for episode queries
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_samples_episode ON samples(episode_id)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Store one episode's samples in a single transaction
    pub fn store_batch(&self, samples: &[ReplaySample]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let mut stmt = tx.prepare_cached(
            "INSERT OR REPLACE INTO samples
             (id, env_id, episode_id, step_number, mover, state, moves, policy,
              root_value, game_outcome, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;

        for sample in samples {
            stmt.execute(params![
                sample.id,
                sample.env_id,
                sample.episode_id,
                sample.step_number,
                sample.mover,
                sample.state,
                serde_json::to_string(&sample.moves)?,
                policy_to_bytes(&sample.policy),
                sample.root_value as f64,
                sample.game_outcome.map(|v| v as f64),
                sample.timestamp as i64,
            ])?;
        }

        // Drop stmt before commit to release borrow on tx
        drop(stmt);
        tx.commit()?;
        Ok(())
    }

    /// Samples of one episode in step order
    #[allow(dead_code)] // Read back by tests and offline tooling
    pub fn episode(&self, episode_id: &str) -> Result<Vec<ReplaySample>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, env_id, episode_id, step_number, mover, state, moves, policy,
                    root_value, game_outcome, timestamp
             FROM samples WHERE episode_id = ?1 ORDER BY step_number",
        )?;

        let samples = stmt
            .query_map([episode_id], sample_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    /// Get the total number of samples in the database
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
