//! Runtimes, factories and evaluators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_arena::prelude::*;
use async_trait::async_trait;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn tasks(names: &[&str]) -> Vec<String> {
    names.iter().map(|t| (*t).to_owned()).collect()
}

/// Answers `<session>|<prompt>`, optionally failing or stalling for some sessions.
pub struct EchoRuntime {
    session: String,
    broken: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AgentRuntime for EchoRuntime {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken {
            anyhow::bail!("{} lost its sampler", self.session);
        }
        Ok(format!("{}|{prompt}", self.session))
    }

    async fn save_checkpoint(&self, name: &str) -> anyhow::Result<String> {
        if self.broken {
            anyhow::bail!("checkpoint storage unavailable");
        }
        Ok(format!("test://{name}"))
    }
}

/// Factory of [`EchoRuntime`]s.
///
/// - sessions listed in `broken` get a runtime whose calls fail
/// - after `max_created` runtimes, creation fails
/// - every generation call is counted in `calls`
#[derive(Default)]
pub struct EchoFactory {
    pub broken: HashSet<String>,
    pub max_created: Option<usize>,
    pub delay: Option<Duration>,
    pub created: AtomicUsize,
    pub calls: Arc<AtomicUsize>,
}

impl EchoFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broken(mut self, session: &str) -> Self {
        self.broken.insert(session.to_owned());
        self
    }

    pub fn with_max_created(mut self, max: usize) -> Self {
        self.max_created = Some(max);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeFactory for EchoFactory {
    async fn create_runtime(
        &self,
        _base: &BaseConfig,
        session: &str,
    ) -> anyhow::Result<Box<dyn AgentRuntime>> {
        let created = self.created.fetch_add(1, Ordering::SeqCst);
        if self.max_created.is_some_and(|max| created >= max) {
            anyhow::bail!("training service refused session {session}");
        }
        Ok(Box::new(EchoRuntime {
            session: session.to_owned(),
            broken: self.broken.contains(session),
            delay: self.delay,
            calls: self.calls.clone(),
        }))
    }
}

/// 1.0 for "t1", 0.0 for everything else.
pub fn t1_only() -> FnEvaluator<impl Fn(&str, &str) -> f64 + Send + Sync> {
    FnEvaluator::new(|task: &str, _response: &str| if task == "t1" { 1.0 } else { 0.0 })
}

/// 1.0 for any non-empty response.
pub fn non_empty() -> FnEvaluator<impl Fn(&str, &str) -> f64 + Send + Sync> {
    FnEvaluator::new(|_task: &str, response: &str| if response.is_empty() { 0.0 } else { 1.0 })
}

/// Always `score`.
pub fn constant(score: f64) -> FnEvaluator<impl Fn(&str, &str) -> f64 + Send + Sync> {
    FnEvaluator::new(move |_task: &str, _response: &str| score)
}

/// Deterministic but agent-dependent score, from the response text.
pub fn by_length() -> FnEvaluator<impl Fn(&str, &str) -> f64 + Send + Sync> {
    FnEvaluator::new(|_task: &str, response: &str| (response.len() % 11) as f64 / 10.0)
}

/// Keeps every `(task, response)` pair it scored, scoring 1.0.
#[derive(Default)]
pub struct RecordingEvaluator {
    pub seen: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Evaluator for RecordingEvaluator {
    async fn score(&self, task: &str, response: &str) -> anyhow::Result<f64> {
        self.seen
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .push((task.to_owned(), response.to_owned()));
        Ok(1.0)
    }
}

/// Scores 1.0 and raises the cancel flag on its first call.
pub struct CancellingEvaluator {
    pub flag: CancelFlag,
}

#[async_trait]
impl Evaluator for CancellingEvaluator {
    async fn score(&self, _task: &str, _response: &str) -> anyhow::Result<f64> {
        self.flag.cancel();
        Ok(1.0)
    }
}
