//! Config for the arena behaviors
//!
//! This module provides configuration options for controlling how an [`Arena`](crate::arena::Arena)
//! runs, independently of what it runs (mode, population, tasks).
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Flags are case-insensitive: set them to `"true"` to enable.
//!
//! - `ARENA_VERBOSE`: Print progress to stdout (default: `false`)
//! - `ARENA_LOG`: Enable logging to a file (default: `false`)
//! - `ARENA_MAX_PARALLEL_AGENTS`: Agents evaluated concurrently, or `auto` for the physical CPU
//!   count (default: `1`)
//! - `ARENA_RESPONSE_TIMEOUT_MS`: Timeout per generation/evaluation call (default: none)
//! - `ARENA_SEED`: Seed for breeding randomness (default: none)
//! - `ARENA_CHECKPOINT_ON_COMPLETE`: Checkpoint every agent after a successful run (default: `false`)

use std::time::Duration;

/// Configuration for arena behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) max_parallel_agents: usize,
    pub(crate) response_timeout: Option<Duration>,
    pub(crate) seed: Option<u64>,
    pub(crate) checkpoint_on_complete: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Nothing is printed to stdout.
    /// - Logging to file is disabled.
    /// - Agents are evaluated one after the other.
    /// - Calls to runtimes and evaluators have no timeout.
    /// - Breeding randomness is seeded from entropy.
    /// - No checkpoint is taken at the end of the run.
    pub fn new() -> Self {
        Self {
            verbose: false,
            log: false,
            max_parallel_agents: 1,
            response_timeout: None,
            seed: None,
            checkpoint_on_complete: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the [module documentation](self) for the recognized variables. Unset or unparsable
    /// values fall back to the defaults of [`Configuration::new()`].
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn parse_u64(var: &str) -> Option<u64> {
            std::env::var(var).ok()?.trim().parse().ok()
        }

        let defaults = Self::new();
        let max_parallel_agents = std::env::var("ARENA_MAX_PARALLEL_AGENTS")
            .ok()
            .and_then(|val| parse_parallelism(&val))
            .unwrap_or(defaults.max_parallel_agents);

        Self {
            verbose: get_env_flag("ARENA_VERBOSE", defaults.verbose),
            log: get_env_flag("ARENA_LOG", defaults.log),
            max_parallel_agents,
            response_timeout: parse_u64("ARENA_RESPONSE_TIMEOUT_MS").map(Duration::from_millis),
            seed: parse_u64("ARENA_SEED"),
            checkpoint_on_complete: get_env_flag(
                "ARENA_CHECKPOINT_ON_COMPLETE",
                defaults.checkpoint_on_complete,
            ),
        }
    }

    /// Enable or disable progress output on stdout.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Number of agents evaluated concurrently during a tournament round or a swarm generation.
    ///
    /// Values below one are treated as one. Collaborative tasks are always sequential.
    pub fn with_max_parallel_agents(mut self, value: usize) -> Self {
        self.max_parallel_agents = value.max(1);
        self
    }

    /// Use one concurrent agent evaluation per physical CPU.
    pub fn with_auto_parallelism(self) -> Self {
        self.with_max_parallel_agents(num_cpus::get_physical())
    }

    /// Bound every response generation and every evaluation by `timeout`.
    ///
    /// A timed-out call counts as a failure: empty response or zero score.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Seed the randomness used to pick parents during breeding.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable checkpointing every agent once a run completed.
    pub fn with_checkpoint_on_complete(mut self, value: bool) -> Self {
        self.checkpoint_on_complete = value;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_parallelism(value: &str) -> Option<usize> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("auto") {
        return Some(num_cpus::get_physical().max(1));
    }
    value.parse::<usize>().ok().map(|n| n.max(1))
}

#[cfg(test)]
mod configuration_tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_and_quiet() {
        let config = Configuration::default();
        assert!(!config.verbose);
        assert!(!config.log);
        assert_eq!(config.max_parallel_agents, 1);
        assert_eq!(config.response_timeout, None);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn builder_overrides() {
        let config = Configuration::new()
            .with_max_parallel_agents(0)
            .with_seed(42)
            .with_response_timeout(Duration::from_millis(250))
            .with_checkpoint_on_complete(true);
        assert_eq!(config.max_parallel_agents, 1);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.response_timeout, Some(Duration::from_millis(250)));
        assert!(config.checkpoint_on_complete);
    }

    #[test]
    fn parallelism_parsing() {
        assert_eq!(parse_parallelism("4"), Some(4));
        assert_eq!(parse_parallelism(" 0 "), Some(1));
        assert!(parse_parallelism("AUTO").is_some_and(|n| n >= 1));
        assert_eq!(parse_parallelism("many"), None);
    }
}
