//! Boundary between the arena and the job orchestration layer.
//!
//! [`run_job`] takes a [`JobRequest`] (usually deserialized from an HTTP body), runs a complete
//! arena and always returns a [`JobOutcome`]: errors are reported in the outcome, never raised.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agent_arena::prelude::*;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let request: JobRequest = serde_json::from_str(
//!     r#"{ "job_id": "job-1", "population_size": 6, "mode": "swarm", "generations": 4 }"#,
//! )?;
//! let outcome = run_job(
//!     request,
//!     Arc::new(MockRuntimeFactory),
//!     Arc::new(RandomEvaluator::new()),
//!     Configuration::from_env(),
//!     CancelFlag::new(),
//! )
//! .await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::arena::{Arena, ArenaMode, ArenaResults, ArenaStats};
use crate::cancel::CancelFlag;
use crate::configuration::Configuration;
use crate::error::ArenaError;
use crate::evaluator::Evaluator;
use crate::ledger::LeaderboardEntry;
use crate::runtime::{BaseConfig, RuntimeFactory};

/// Tasks used when a request does not provide any.
pub const DEFAULT_TASKS: [&str; 3] = [
    "Explain the difference between a process and a thread.",
    "Write a function that reverses a linked list.",
    "Summarize the trade-offs of caching in distributed systems.",
];

/// Largest population a request may ask for.
pub const MAX_POPULATION_SIZE: usize = 1_000;

/// Largest number of rounds or generations a request may ask for.
pub const MAX_ROUNDS: usize = 10_000;

fn default_rounds() -> usize {
    3
}

fn default_survival_rate() -> f64 {
    0.5
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Identifier echoed in the outcome
    pub job_id: String,
    /// Number of founding agents
    pub population_size: usize,
    /// Base model of every agent
    #[serde(default)]
    pub base_config: BaseConfig,
    /// Competition protocol
    pub mode: ArenaMode,
    /// Task prompts; [`DEFAULT_TASKS`] when empty
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Tournament rounds or swarm generations
    #[serde(default = "default_rounds", alias = "generations", alias = "num_rounds")]
    pub rounds: usize,
    /// Fraction of the population surviving each swarm generation
    #[serde(default = "default_survival_rate")]
    pub survival_rate: f64,
}

impl JobRequest {
    /// A request with default base model, tasks, rounds and survival rate.
    pub fn new(job_id: impl Into<String>, mode: ArenaMode, population_size: usize) -> Self {
        Self {
            job_id: job_id.into(),
            population_size,
            base_config: BaseConfig::default(),
            mode,
            tasks: vec![],
            rounds: default_rounds(),
            survival_rate: default_survival_rate(),
        }
    }

    /// Checks every parameter before any agent is created.
    ///
    /// # Errors
    /// [`ArenaError::InvalidPopulationSize`] / [`ArenaError::InsufficientPopulation`] if the
    /// population is too small for the mode, [`ArenaError::InvalidConfiguration`] for a
    /// population above [`MAX_POPULATION_SIZE`], a round count of zero or above [`MAX_ROUNDS`],
    /// or a survival rate outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ArenaError> {
        let minimum = self.mode.min_population();
        if self.population_size < minimum {
            return Err(match self.mode {
                ArenaMode::Collaborative if self.population_size > 0 => {
                    ArenaError::InsufficientPopulation {
                        required: minimum,
                        actual: self.population_size,
                    }
                }
                _ => ArenaError::InvalidPopulationSize {
                    mode: self.mode,
                    size: self.population_size,
                    minimum,
                },
            });
        }
        if self.population_size > MAX_POPULATION_SIZE {
            return Err(ArenaError::InvalidConfiguration(format!(
                "population size {} exceeds {MAX_POPULATION_SIZE}",
                self.population_size
            )));
        }
        if self.rounds == 0 || self.rounds > MAX_ROUNDS {
            return Err(ArenaError::InvalidConfiguration(format!(
                "round count {} is outside 1..={MAX_ROUNDS}",
                self.rounds
            )));
        }
        if !(self.survival_rate > 0.0 && self.survival_rate <= 1.0) {
            return Err(ArenaError::InvalidConfiguration(format!(
                "survival rate {} is outside (0, 1]",
                self.survival_rate
            )));
        }
        Ok(())
    }

    fn tasks_or_default(&self) -> Vec<String> {
        if self.tasks.is_empty() {
            DEFAULT_TASKS.iter().map(|t| (*t).to_owned()).collect()
        } else {
            self.tasks.clone()
        }
    }
}

/// Final state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The run went through
    Completed,
    /// See [`JobOutcome::error`]
    Failed,
}

/// What the job layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Identifier of the request
    pub job_id: String,
    /// Completed or failed, never anything in between
    pub status: JobStatus,
    /// Mode of the request
    pub mode: ArenaMode,
    /// Mode-specific results, when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ArenaResults>,
    /// Final ranking (possibly partial on failure)
    pub leaderboard: Vec<LeaderboardEntry>,
    /// First agent of the leaderboard
    pub best_agent: Option<String>,
    /// Arena statistics, including partial history on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ArenaStats>,
    /// Checkpoint handles by agent id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checkpoints: BTreeMap<String, String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    fn failed(request: &JobRequest, error: &ArenaError, arena: Option<&Arena>) -> Self {
        let stats = arena.map(Arena::stats);
        let leaderboard = stats
            .as_ref()
            .map(|s| s.leaderboard.clone())
            .unwrap_or_default();
        Self {
            job_id: request.job_id.clone(),
            status: JobStatus::Failed,
            mode: request.mode,
            results: None,
            best_agent: leaderboard.first().map(|e| e.agent_id.clone()),
            leaderboard,
            stats,
            checkpoints: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Runs `request` to completion.
///
/// Never fails: invalid requests, initialization failures and cancellations all produce a
/// [`JobStatus::Failed`] outcome carrying the error text.
#[instrument(skip_all, fields(job_id = %request.job_id, mode = %request.mode))]
pub async fn run_job(
    request: JobRequest,
    factory: Arc<dyn RuntimeFactory>,
    evaluator: Arc<dyn Evaluator>,
    config: Configuration,
    cancel: CancelFlag,
) -> JobOutcome {
    if let Err(e) = request.validate() {
        error!("rejected: {e}");
        return JobOutcome::failed(&request, &e, None);
    }

    let mut arena = Arena::new(request.mode, factory, evaluator)
        .with_base_config(request.base_config.clone())
        .with_configuration(config)
        .with_cancel_flag(cancel);

    if let Err(e) = arena.initialize(request.population_size).await {
        error!("initialization failed: {e}");
        return JobOutcome::failed(&request, &e, Some(&arena));
    }

    let tasks = request.tasks_or_default();
    let results = match arena
        .run(&tasks, request.rounds, request.survival_rate)
        .await
    {
        Ok(results) => results,
        Err(e) => {
            error!("run failed: {e}");
            return JobOutcome::failed(&request, &e, Some(&arena));
        }
    };

    let checkpoints = if config.checkpoint_on_complete {
        arena.checkpoint_all().await
    } else {
        BTreeMap::new()
    };

    let stats = arena.stats();
    let leaderboard = stats.leaderboard.clone();
    let best_agent = leaderboard.first().map(|e| e.agent_id.clone());
    info!(?best_agent, "job completed");

    JobOutcome {
        job_id: request.job_id,
        status: JobStatus::Completed,
        mode: request.mode,
        results: Some(results),
        leaderboard,
        best_agent,
        stats: Some(stats),
        checkpoints,
        error: None,
    }
}
