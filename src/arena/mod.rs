//! The arena: a population of agents competing or cooperating on a task list.
//!
//! An [`Arena`] owns its population, the [`ScoreLedger`] and the [`History`] of a run. It drives
//! exactly one [`ArenaMode`]:
//!
//! - [`ArenaMode::Tournament`]: every agent answers every task each round, the mean score of the
//!   round is added to its cumulative score.
//! - [`ArenaMode::Collaborative`]: each task goes through a primary, a critic and a synthesizer
//!   chosen round-robin; the final answer's score is split 40/30/30.
//! - [`ArenaMode::Swarm`]: generations of evaluation, selection of the best agents, and breeding
//!   of a new population from the survivors.
//!
//! # Lifecycle
//!
//! 1. [`Arena::new`], optionally followed by the `with_*` methods
//! 2. [`Arena::initialize`] creates the founding agents and their runtimes
//! 3. [`Arena::run`] (or one of `run_tournament`, `run_collaborative`, `run_swarm_evolution`)
//! 4. [`Arena::leaderboard`] / [`Arena::stats`] to report
//!
//! Failures of a single agent or evaluation never abort a run. Population problems fail fast,
//! before any task is processed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::agent::Agent;
use crate::cancel::CancelFlag;
use crate::configuration::Configuration;
use crate::display;
use crate::error::ArenaError;
use crate::evaluator::{guarded_score, Evaluator};
use crate::history::{CollaborationRecord, History};
use crate::ledger::{LeaderboardEntry, ScoreLedger};
use crate::logger::init_logger;
use crate::runtime::{BaseConfig, RuntimeFactory};

mod collaborative;
mod swarm;
mod tournament;

pub use collaborative::{
    compose_critique_prompt, compose_synthesis_prompt, split_reward, CollaborationRoles,
    CRITIC_SHARE, MIN_COLLABORATORS, PRIMARY_SHARE, SYNTHESIZER_SHARE,
};
pub use swarm::{survivor_count, EvolutionSummary, MIN_SURVIVORS};
pub use tournament::TournamentSummary;

/// Competition protocol of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArenaMode {
    /// Agents compete on every task, round after round.
    Tournament,
    /// Agents chain primary, critic and synthesizer roles on each task.
    Collaborative,
    /// Generations of evaluation, selection and breeding.
    #[serde(alias = "swarm_evolution")]
    Swarm,
}

impl ArenaMode {
    /// Smallest population the mode can run with.
    pub fn min_population(self) -> usize {
        match self {
            ArenaMode::Tournament => 1,
            ArenaMode::Collaborative => MIN_COLLABORATORS,
            ArenaMode::Swarm => MIN_SURVIVORS,
        }
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            ArenaMode::Tournament => "tournament",
            ArenaMode::Collaborative => "collaborative",
            ArenaMode::Swarm => "swarm",
        }
    }
}

impl fmt::Display for ArenaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArenaMode {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tournament" => Ok(ArenaMode::Tournament),
            "collaborative" => Ok(ArenaMode::Collaborative),
            "swarm" | "swarm_evolution" | "swarm-evolution" => Ok(ArenaMode::Swarm),
            _ => Err(ArenaError::UnknownMode(s.to_owned())),
        }
    }
}

/// Mode-specific output of [`Arena::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "results", rename_all = "snake_case")]
pub enum ArenaResults {
    /// Rounds and final leaderboard
    Tournament(TournamentSummary),
    /// One record per task, in task order
    Collaborative(Vec<CollaborationRecord>),
    /// Per-generation records and overall improvement
    Swarm(EvolutionSummary),
}

/// Snapshot of an arena, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaStats {
    /// Current population size
    pub num_agents: usize,
    /// Current (0-based) generation
    pub generation: u32,
    /// Mode of the arena
    pub mode: ArenaMode,
    /// Current ranking
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Everything recorded so far
    pub history: History,
}

/// Orchestrates one competition among a population of agents.
pub struct Arena {
    mode: ArenaMode,
    base_config: BaseConfig,
    factory: Arc<dyn RuntimeFactory>,
    evaluator: Arc<dyn Evaluator>,
    config: Configuration,
    cancel: CancelFlag,
    population: Vec<Agent>,
    population_size: usize,
    ledger: ScoreLedger,
    history: History,
    generation: u32,
    rng: StdRng,
}

impl Arena {
    /// Creates an empty arena with the default [`Configuration`] and [`BaseConfig`].
    pub fn new(
        mode: ArenaMode,
        factory: Arc<dyn RuntimeFactory>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Arena {
        Arena {
            mode,
            base_config: BaseConfig::default(),
            factory,
            evaluator,
            config: Configuration::new(),
            cancel: CancelFlag::new(),
            population: vec![],
            population_size: 0,
            ledger: ScoreLedger::new(),
            history: History::default(),
            generation: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Base model handed to the runtime factory for every agent.
    pub fn with_base_config(mut self, base_config: BaseConfig) -> Self {
        self.base_config = base_config;
        self
    }

    /// Replaces the configuration. Installs the file logger if `config` asks for it.
    pub fn with_configuration(mut self, config: Configuration) -> Self {
        if config.log {
            if let Err(e) = init_logger() {
                warn!("file logging disabled: {e:#}");
            }
        }
        if let Some(seed) = config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.config = config;
        self
    }

    /// Shares `cancel` with the caller.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that stops the run at the next boundary.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Mode of the arena.
    pub fn mode(&self) -> ArenaMode {
        self.mode
    }

    /// Current population, in population order.
    pub fn population(&self) -> &[Agent] {
        &self.population
    }

    /// Current (0-based) generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Cumulative score of `agent_id`.
    pub fn score(&self, agent_id: &str) -> f64 {
        self.ledger.get(agent_id)
    }

    /// Everything recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Creates `population_size` founding agents and their runtimes.
    ///
    /// Replaces any previous population and clears scores and history.
    ///
    /// # Errors
    /// - [`ArenaError::InvalidPopulationSize`] if `population_size` is zero
    /// - [`ArenaError::RuntimeInitialization`] if a runtime cannot be created
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn initialize(&mut self, population_size: usize) -> Result<(), ArenaError> {
        if population_size == 0 {
            return Err(ArenaError::InvalidPopulationSize {
                mode: self.mode,
                size: 0,
                minimum: 1,
            });
        }

        info!("initializing {population_size} agents");
        let mut population = Vec::new();
        for i in 0..population_size {
            let mut agent = Agent::new(format!("agent_{i}"), 0);
            agent
                .initialize(self.factory.as_ref(), &self.base_config)
                .await?;
            population.push(agent);
        }

        self.population = population;
        self.population_size = population_size;
        self.generation = 0;
        self.ledger.reset(&self.population);
        self.history = History::default();
        info!("all {population_size} agents ready");
        Ok(())
    }

    /// Runs the arena's mode over `tasks`.
    ///
    /// `rounds` is the number of tournament rounds or swarm generations (ignored in collaborative
    /// mode). `survival_rate` is only used by the swarm.
    ///
    /// # Errors
    /// Population and configuration errors of the selected protocol, or
    /// [`ArenaError::Cancelled`]. Partial history stays available through [`Arena::stats`].
    #[instrument(skip(self, tasks), fields(mode = %self.mode, num_tasks = tasks.len()))]
    pub async fn run(
        &mut self,
        tasks: &[String],
        rounds: usize,
        survival_rate: f64,
    ) -> Result<ArenaResults, ArenaError> {
        let results = match self.mode {
            ArenaMode::Tournament => {
                ArenaResults::Tournament(self.run_tournament(tasks, rounds).await?)
            }
            ArenaMode::Collaborative => {
                ArenaResults::Collaborative(self.run_collaborative(tasks).await?)
            }
            ArenaMode::Swarm => {
                ArenaResults::Swarm(self.run_swarm_evolution(tasks, rounds, survival_rate).await?)
            }
        };

        if self.config.verbose {
            display::print_leaderboard(&self.leaderboard());
        }
        Ok(results)
    }

    /// Agents ranked by cumulative score, descending; ties keep population order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.ledger.leaderboard(&self.population)
    }

    /// Current statistics, including the full history.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            num_agents: self.population.len(),
            generation: self.generation,
            mode: self.mode,
            leaderboard: self.leaderboard(),
            history: self.history.clone(),
        }
    }

    /// Checkpoints every agent. Returns the handles of the successful checkpoints by agent id.
    pub async fn checkpoint_all(&self) -> BTreeMap<String, String> {
        let mut saved = BTreeMap::new();
        for agent in &self.population {
            if let Some(handle) = agent.checkpoint(self.ledger.get(agent.id())).await {
                saved.insert(agent.id().to_owned(), handle);
            }
        }
        saved
    }

    fn ensure_population(&self, mode: ArenaMode) -> Result<(), ArenaError> {
        let size = self.population.len();
        if size == 0 {
            return Err(ArenaError::NotInitialized);
        }
        match mode {
            ArenaMode::Collaborative if size < MIN_COLLABORATORS => {
                Err(ArenaError::InsufficientPopulation {
                    required: MIN_COLLABORATORS,
                    actual: size,
                })
            }
            ArenaMode::Swarm if size < MIN_SURVIVORS => Err(ArenaError::InvalidPopulationSize {
                mode,
                size,
                minimum: MIN_SURVIVORS,
            }),
            _ => Ok(()),
        }
    }

    fn check_cancelled(&self, completed: usize, unit: &'static str) -> Result<(), ArenaError> {
        if self.cancel.is_cancelled() {
            warn!("cancelled after {completed} {unit}");
            return Err(ArenaError::Cancelled { completed, unit });
        }
        Ok(())
    }

    async fn respond(&self, agent: &Agent, prompt: &str) -> String {
        let Some(limit) = self.config.response_timeout else {
            return agent.generate_response(prompt).await;
        };
        match tokio::time::timeout(limit, agent.generate_response(prompt)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(agent = %agent.id(), "response timed out after {limit:?}");
                String::new()
            }
        }
    }

    async fn judge(&self, task: &str, response: &str) -> f64 {
        guarded_score(
            self.evaluator.as_ref(),
            task,
            response,
            self.config.response_timeout,
        )
        .await
    }

    async fn score_agent(&self, agent: &Agent, tasks: &[String]) -> Vec<f64> {
        let mut scores = Vec::with_capacity(tasks.len());
        for task in tasks {
            let response = self.respond(agent, task).await;
            scores.push(self.judge(task, &response).await);
        }
        scores
    }

    /// Per-task scores of every agent, in population order.
    ///
    /// Up to `max_parallel_agents` agents are in flight at once; each agent's tasks stay
    /// sequential. Nothing is written here, callers update the ledger after the barrier.
    async fn score_population(&self, tasks: &[String]) -> Vec<Vec<f64>> {
        let scoring: Vec<BoxFuture<'_, Vec<f64>>> = self
            .population
            .iter()
            .map(|agent| self.score_agent(agent, tasks).boxed())
            .collect();
        stream::iter(scoring)
            .buffered(self.config.max_parallel_agents.max(1))
            .collect()
            .await
    }
}
