//! Self-play episode runner
//!
//! Every seat is played by its own MCTS agent. Agents keep their trees
//! between their own moves and replay the opponents' moves from the shared
//! episode context, so tree reuse works across turns.

use anyhow::{anyhow, Result};
use engine_core::{Context, Game};
use mcts::{Mcts, MctsConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::replay::{backfill_outcomes, ReplayBuffer, ReplaySample};
use crate::stats::ActorStats;

/// Stops a running actor from another thread.
///
/// Raising it sets the interrupt flag of every agent, so a search in
/// progress returns its best move so far and the episode is abandoned.
#[derive(Clone)]
pub struct ShutdownHandle {
    flags: Vec<Arc<AtomicBool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        for flag in &self.flags {
            flag.store(true, Ordering::Relaxed);
        }
        info!("Shutdown signal set");
    }
}

/// Result of one finished episode.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    pub id: String,
    pub steps: u32,
    pub utilities: Vec<f64>,
}

pub struct Actor<G: Game> {
    config: Config,
    game: Arc<G>,
    agents: Vec<Mcts<G>>,
    replay: ReplayBuffer,
    stats: ActorStats,
    shutdown_signal: Arc<AtomicBool>,
    episode_count: u32,
}

impl<G: Game> Actor<G> {
    pub fn new(config: Config, game: Arc<G>) -> Result<Self> {
        let caps = game.capabilities();
        if caps.id.env_id != config.env_id {
            return Err(anyhow!(
                "Game '{}' does not match configured env_id '{}'",
                caps.id.env_id,
                config.env_id
            ));
        }

        let mcts_config = config.mcts_config()?;
        info!(
            selection = %mcts_config.selection,
            playout = %mcts_config.playout,
            final_move = %mcts_config.final_move,
            exploration = mcts_config.exploration,
            tree_reuse = mcts_config.tree_reuse,
            "MCTS config"
        );

        let agents = (0..caps.num_players)
            .map(|seat| Mcts::new(seat_config(&mcts_config, seat)))
            .collect();

        let replay = ReplayBuffer::new(&config.replay_db_path)?;
        info!("Replay database opened at {}", config.replay_db_path);

        let stats = ActorStats::new(&config.data_dir, &config.env_id, caps.num_players);

        info!(
            "Actor {} initialized for environment {} ({} players, max_horizon={})",
            config.actor_id, caps.id.env_id, caps.num_players, caps.max_horizon
        );

        Ok(Self {
            config,
            game,
            agents,
            replay,
            stats,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            episode_count: 0,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        let mut flags: Vec<_> = self.agents.iter().map(|a| a.interrupt_handle()).collect();
        flags.push(Arc::clone(&self.shutdown_signal));
        ShutdownHandle { flags }
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown_signal.load(Ordering::Relaxed)
    }

    /// Play episodes until the configured count is reached or shutdown is
    /// requested.
    pub fn run(&mut self) -> Result<()> {
        info!(
            actor_id = %self.config.actor_id,
            episodes = self.config.episodes,
            "Actor starting main loop"
        );

        loop {
            if self.is_shutting_down() {
                info!("Shutdown signal received, stopping actor");
                break;
            }

            if self.config.episodes > 0 && i64::from(self.episode_count) >= self.config.episodes {
                info!("Reached maximum episodes ({}), stopping", self.config.episodes);
                break;
            }

            let episode_start = Instant::now();
            match self.run_episode() {
                Ok(Some(summary)) => {
                    self.episode_count += 1;
                    self.stats.write_stats();
                    debug!(
                        episode = self.episode_count,
                        steps = summary.steps,
                        utilities = ?summary.utilities,
                        duration = episode_start.elapsed().as_secs_f64(),
                        "Episode completed"
                    );

                    if self.config.log_interval > 0
                        && self.episode_count % self.config.log_interval == 0
                    {
                        let snapshot = self.stats.snapshot();
                        info!(
                            wins = ?snapshot.wins,
                            draws = snapshot.draws,
                            avg_iterations = format!("{:.0}", snapshot.avg_iterations_per_search),
                            reuse_rate = format!("{:.2}", snapshot.reuse_rate),
                            "Completed {} episodes (last: {:.2}s)",
                            self.episode_count,
                            episode_start.elapsed().as_secs_f64()
                        );
                    }
                }
                Ok(None) => {
                    info!("Episode {} abandoned on shutdown", self.episode_count + 1);
                }
                Err(e) => {
                    error!("Episode {} failed: {}", self.episode_count + 1, e);
                    return Err(e);
                }
            }
        }

        self.stats.write_stats();
        info!("Actor stopped after {} episodes", self.episode_count);
        Ok(())
    }

    /// Play one episode and store its samples.
    ///
    /// Returns `None` when shutdown interrupts the episode; nothing is stored
    /// in that case.
    fn run_episode(&mut self) -> Result<Option<EpisodeSummary>> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        let id = format!(
            "{}-ep-{}-{}",
            self.config.actor_id, self.episode_count, now.as_secs()
        );
        let seed = self.config.seed.wrapping_add(u64::from(self.episode_count));
        let mut ctx = Context::new(Arc::clone(&self.game), seed);

        for agent in &mut self.agents {
            agent.init_game(&ctx)?;
        }

        // Generous upper bound to protect against games that never end
        let max_steps = ctx.capabilities().max_horizon.saturating_mul(10).max(1000);
        let mut samples = Vec::new();
        let mut step_number = 0u32;

        debug!(episode = %id, seed, "Starting episode");

        while !ctx.is_terminal() {
            if step_number >= max_steps {
                warn!("Episode {} exceeded max steps ({})", id, max_steps);
                return Err(anyhow!("Episode exceeded {} steps without terminating", max_steps));
            }

            let seat = ctx.current_player();
            let agent = self
                .agents
                .get_mut(seat)
                .ok_or_else(|| anyhow!("No agent for player {}", seat))?;

            let mv = agent.select_move(
                &ctx,
                self.config.seconds_per_move,
                self.config.iterations_per_move,
                self.config.max_depth,
            )?;

            if self.shutdown_signal.load(Ordering::Relaxed) {
                return Ok(None);
            }

            self.stats.record_search(agent.stats());
            let sample = agent.training_sample(&ctx)?;
            samples.push(ReplaySample::from_training(
                sample,
                &self.config.env_id,
                &id,
                step_number,
            )?);

            ctx.apply(&mv);
            step_number += 1;
        }

        let utilities = ctx.utilities();
        backfill_outcomes(&mut samples, &utilities);
        self.replay.store_batch(&samples)?;
        self.stats.record_episode(step_number, &utilities);

        Ok(Some(EpisodeSummary {
            id,
            steps: step_number,
            utilities,
        }))
    }

    #[allow(dead_code)]
    pub fn episode_count(&self) -> u32 {
        self.episode_count
    }
}

/// Per-seat search config: a fixed seed is offset by the seat so the agents
/// do not mirror each other.
fn seat_config(config: &MctsConfig, seat: usize) -> MctsConfig {
    let mut config = config.clone();
    if let Some(seed) = config.seed {
        config.seed = Some(seed.wrapping_add(seat as u64));
    }
    config
}
