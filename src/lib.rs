//! # Agent Arena
//!
//! Competitions between learning agents: a population of model instances answers text tasks, an
//! evaluator scores the answers, and the arena turns those scores into a ranking.
//!
//! It provides:
//! - Population management with lineage tracking (`Agent`)
//! - Three competition protocols, selected by [`ArenaMode`](crate::arena::ArenaMode):
//!   tournament, collaborative and swarm evolution (see [`arena`])
//! - Pluggable scoring through the [`Evaluator`](crate::evaluator::Evaluator) trait
//! - Pluggable model backends through the [`RuntimeFactory`](crate::runtime::RuntimeFactory) and
//!   [`AgentRuntime`](crate::runtime::AgentRuntime) traits
//! - A job boundary ([`job::run_job`]) that always reports `completed` or `failed`
//!
//! A flaky agent never voids a competition: failed generations count as empty answers and failed
//! evaluations as zero scores. Only population and configuration problems stop a run, before any
//! task is processed.
//!
//! # Documentation Overview
//!
//! - For the protocols and the run lifecycle, see the [`arena`] module.
//! - For run behaviour (parallelism, timeouts, logging, seeding), see
//!   [`Configuration`](crate::configuration::Configuration).
//! - For plugging a real model service or reward model, see [`runtime`] and [`evaluator`].
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agent_arena::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new().with_verbose(true).with_seed(7);
//!
//!     let mut arena = Arena::new(
//!         ArenaMode::Tournament,
//!         Arc::new(MockRuntimeFactory),
//!         Arc::new(RandomEvaluator::new()),
//!     )
//!     .with_configuration(config);
//!
//!     arena.initialize(4).await?;
//!     let tasks = vec!["Reverse a string in Rust".to_owned(), "Explain borrowing".to_owned()];
//!     arena.run(&tasks, 3, 0.5).await?;
//!
//!     for (rank, entry) in arena.leaderboard().iter().enumerate() {
//!         println!("{}. {}: {:.3}", rank + 1, entry.agent_id, entry.score);
//!     }
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]

pub use anyhow;

pub mod agent;
pub mod arena;
mod cancel;
pub mod configuration;
mod display;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod job;
pub mod ledger;
mod logger;
pub mod runtime;

pub use cancel::CancelFlag;
pub use logger::init_logger;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use agent_arena::prelude::*;
/// ```
///
/// Includes:
/// - [`Arena`](crate::arena::Arena) and [`ArenaMode`](crate::arena::ArenaMode)
/// - [`Configuration`](crate::configuration::Configuration)
/// - the capability traits and their provided implementations
/// - the job boundary types
pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::arena::{Arena, ArenaMode, ArenaResults, ArenaStats};
    pub use crate::cancel::CancelFlag;
    pub use crate::configuration::Configuration;
    pub use crate::error::ArenaError;
    pub use crate::evaluator::{Evaluator, FnEvaluator, RandomEvaluator};
    pub use crate::job::{run_job, JobOutcome, JobRequest, JobStatus};
    pub use crate::ledger::LeaderboardEntry;
    pub use crate::runtime::{AgentRuntime, BaseConfig, MockRuntimeFactory, RuntimeFactory};
}
