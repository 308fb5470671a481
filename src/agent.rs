//! A member of the arena population.
//!
//! Agents carry identity and lineage only. Scores live in the arena's
//! [`ScoreLedger`](crate::ledger::ScoreLedger), so an agent is never mutated by a protocol once
//! its runtime is initialized.

use std::fmt;

use tracing::{debug, warn};

use crate::error::ArenaError;
use crate::runtime::{AgentRuntime, BaseConfig, RuntimeFactory};

/// Population member wrapping an exclusively owned runtime handle.
pub struct Agent {
    id: String,
    generation: u32,
    parent_ids: Vec<String>,
    runtime: Option<Box<dyn AgentRuntime>>,
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("parent_ids", &self.parent_ids)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Agent {
    /// A founding agent, without parents.
    pub fn new(id: impl Into<String>, generation: u32) -> Agent {
        Agent {
            id: id.into(),
            generation,
            parent_ids: vec![],
            runtime: None,
        }
    }

    /// An agent bred from two parents of the previous generation.
    pub fn offspring(id: impl Into<String>, generation: u32, parents: [String; 2]) -> Agent {
        Agent {
            id: id.into(),
            generation,
            parent_ids: parents.into(),
            runtime: None,
        }
    }

    /// Identifier, unique within a population.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Generation in which the agent was created (0 for the initial population).
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Lineage, for audit only. Empty for founding agents.
    pub fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }

    /// `true` once a runtime handle was acquired.
    pub fn is_ready(&self) -> bool {
        self.runtime.is_some()
    }

    fn session_name(&self) -> String {
        format!("{}_gen_{}", self.id, self.generation)
    }

    /// Acquires a runtime handle from `factory`.
    ///
    /// # Errors
    /// [`ArenaError::RuntimeInitialization`] if the factory fails. Not retried.
    pub async fn initialize(
        &mut self,
        factory: &dyn RuntimeFactory,
        base: &BaseConfig,
    ) -> Result<(), ArenaError> {
        let runtime = factory
            .create_runtime(base, &self.session_name())
            .await
            .map_err(|e| ArenaError::RuntimeInitialization {
                agent_id: self.id.clone(),
                reason: format!("{e:#}"),
            })?;
        self.runtime = Some(runtime);
        debug!(agent = %self.id, "runtime initialized");
        Ok(())
    }

    /// Generates a response to `task`.
    ///
    /// Returns an empty string when the agent has no runtime or the runtime fails: a flaky agent
    /// contributes nothing but never aborts the run.
    pub async fn generate_response(&self, task: &str) -> String {
        let Some(runtime) = &self.runtime else {
            debug!(agent = %self.id, "no runtime, empty response");
            return String::new();
        };
        match runtime.generate(task).await {
            Ok(response) => response,
            Err(e) => {
                warn!(agent = %self.id, "generation failed: {e:#}");
                String::new()
            }
        }
    }

    /// Persists the agent through its runtime, tagging the checkpoint with `score`.
    ///
    /// Failures are logged and yield `None`.
    pub async fn checkpoint(&self, score: f64) -> Option<String> {
        let runtime = self.runtime.as_ref()?;
        let name = format!("{}_score_{score:.2}", self.session_name());
        match runtime.save_checkpoint(&name).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(agent = %self.id, "failed to save checkpoint '{name}': {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod agent_tests {
    use async_trait::async_trait;

    use super::*;
    use crate::runtime::MockRuntimeFactory;

    struct Broken;

    #[async_trait]
    impl AgentRuntime for Broken {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("sampler unreachable")
        }

        async fn save_checkpoint(&self, _name: &str) -> anyhow::Result<String> {
            anyhow::bail!("disk full")
        }
    }

    struct BrokenFactory;

    #[async_trait]
    impl RuntimeFactory for BrokenFactory {
        async fn create_runtime(
            &self,
            _base: &BaseConfig,
            _session: &str,
        ) -> anyhow::Result<Box<dyn AgentRuntime>> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[tokio::test]
    async fn uninitialized_agent_answers_empty() {
        let agent = Agent::new("agent_0", 0);
        assert!(!agent.is_ready());
        assert_eq!(agent.generate_response("task").await, "");
        assert_eq!(agent.checkpoint(1.0).await, None);
    }

    #[tokio::test]
    async fn failing_runtime_degrades_to_empty() {
        let mut agent = Agent::new("agent_0", 0);
        agent.runtime = Some(Box::new(Broken));
        assert_eq!(agent.generate_response("task").await, "");
        assert_eq!(agent.checkpoint(0.5).await, None);
    }

    #[tokio::test]
    async fn factory_failure_is_reported() {
        let mut agent = Agent::new("agent_1", 0);
        let err = agent
            .initialize(&BrokenFactory, &BaseConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArenaError::RuntimeInitialization { ref agent_id, .. } if agent_id == "agent_1"
        ));
        assert!(!agent.is_ready());
    }

    #[tokio::test]
    async fn checkpoint_name_carries_generation_and_score() {
        let mut agent = Agent::offspring("agent_2_gen_1", 1, ["a".into(), "b".into()]);
        agent
            .initialize(&MockRuntimeFactory, &BaseConfig::default())
            .await
            .unwrap();
        assert_eq!(
            agent.checkpoint(1.234).await.as_deref(),
            Some("mock://checkpoints/agent_2_gen_1_gen_1_score_1.23")
        );
        assert_eq!(agent.parent_ids(), ["a".to_owned(), "b".to_owned()]);
    }
}
