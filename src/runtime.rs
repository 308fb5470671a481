//! Traits that connect the arena to the model-serving side.
//!
//! The arena never talks to a training or sampling service directly. Each [`Agent`](crate::agent::Agent)
//! owns one [`AgentRuntime`] handle, produced by a [`RuntimeFactory`] from a shared [`BaseConfig`].
//! Implement both traits to plug in a real backend; [`MockRuntimeFactory`] is provided for
//! development and demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Base model every agent of a population is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Model name understood by the runtime factory.
    pub base_model: String,
    /// Adapter rank used when creating a trainable instance.
    pub rank: u32,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            base_model: "meta-llama/Llama-3.2-1B".to_owned(),
            rank: 32,
        }
    }
}

/// A handle on one trainable/sample-able model instance.
///
/// Implementations are responsible for their own timeouts and retries. Any error is treated by
/// the arena as "no contribution" for that call.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Produces a text response to `prompt`.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Persists the current state under `name` and returns an opaque checkpoint handle.
    async fn save_checkpoint(&self, name: &str) -> anyhow::Result<String>;
}

/// Creates runtime handles. One factory is shared by the whole arena.
#[async_trait]
pub trait RuntimeFactory: Send + Sync {
    /// Creates a fresh runtime from `base`. `session` identifies the agent and its generation.
    async fn create_runtime(
        &self,
        base: &BaseConfig,
        session: &str,
    ) -> anyhow::Result<Box<dyn AgentRuntime>>;
}

const ECHO_PREFIX_LEN: usize = 50;

/// Stand-in runtime echoing the beginning of the prompt.
#[derive(Debug, Clone)]
pub struct MockRuntime {
    session: String,
}

impl MockRuntime {
    /// Creates a mock runtime answering as `session`.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let head: String = prompt.chars().take(ECHO_PREFIX_LEN).collect();
        Ok(format!("Response from {}: {head}...", self.session))
    }

    async fn save_checkpoint(&self, name: &str) -> anyhow::Result<String> {
        Ok(format!("mock://checkpoints/{name}"))
    }
}

/// Factory producing [`MockRuntime`]s. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRuntimeFactory;

#[async_trait]
impl RuntimeFactory for MockRuntimeFactory {
    async fn create_runtime(
        &self,
        _base: &BaseConfig,
        session: &str,
    ) -> anyhow::Result<Box<dyn AgentRuntime>> {
        Ok(Box::new(MockRuntime::new(session)))
    }
}
