//! Errors surfaced by the arena.
//!
//! Only population and configuration problems are fatal to a run. Failures of a single agent or
//! of a single evaluation never show up here: they are degraded to an empty response or a zero
//! score and logged (see [`crate::agent`] and [`crate::evaluator`]).

use thiserror::Error;

use crate::arena::ArenaMode;

/// Everything that can stop an arena run.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// The population is too small for the requested mode (or empty).
    #[error("invalid population size {size} for {mode} mode (minimum {minimum})")]
    InvalidPopulationSize {
        /// Mode being run
        mode: ArenaMode,
        /// Actual population size
        size: usize,
        /// Smallest size the mode accepts
        minimum: usize,
    },

    /// Collaborative mode needs three distinct agents per task.
    #[error("collaborative mode needs at least {required} agents, got {actual}")]
    InsufficientPopulation {
        /// Required number of agents
        required: usize,
        /// Population size
        actual: usize,
    },

    /// The runtime factory could not produce a handle for an agent.
    #[error("could not initialize runtime of {agent_id}: {reason}")]
    RuntimeInitialization {
        /// Agent being initialized
        agent_id: String,
        /// Underlying factory error
        reason: String,
    },

    /// A run parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Mode string that is neither tournament, collaborative nor swarm.
    #[error("unknown arena mode '{0}'")]
    UnknownMode(String),

    /// A protocol was started before [`Arena::initialize`](crate::arena::Arena::initialize).
    #[error("arena has no population, call `initialize` first")]
    NotInitialized,

    /// The cancel flag was raised; the run stopped at a boundary.
    #[error("run cancelled after {completed} completed {unit}")]
    Cancelled {
        /// Number of rounds, tasks or generations fully processed
        completed: usize,
        /// What `completed` counts
        unit: &'static str,
    },
}
