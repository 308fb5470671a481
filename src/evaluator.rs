//! Scoring of agent responses.
//!
//! An [`Evaluator`] turns a `(task, response)` pair into a score in `[0.0, 1.0]`. It is an
//! injected capability: a reward model, a test-execution harness or a human-in-the-loop service
//! can replace the provided [`RandomEvaluator`] without touching the arena.
//!
//! Evaluators may fail. The arena never propagates those failures: a failed, timed-out or
//! non-finite evaluation counts as [`FAILED_EVALUATION_SCORE`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Score given to a response whose evaluation failed.
pub const FAILED_EVALUATION_SCORE: f64 = 0.0;

/// Scores a response against the task it answers.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Scores `response` for `task`. Must not depend on arena state.
    async fn score(&self, task: &str, response: &str) -> anyhow::Result<f64>;

    /// Called by the swarm protocol before each generation is evaluated.
    fn begin_generation(&self, _generation: u32) {}
}

/// Mock evaluator: uniform score in `[0.5, 1.0)` plus a small bonus per swarm generation.
pub struct RandomEvaluator {
    rng: Mutex<StdRng>,
    generation: AtomicU32,
}

impl RandomEvaluator {
    /// Bonus added per generation, the total being capped at 1.0.
    pub const GENERATION_BONUS: f64 = 0.05;

    /// Creates an evaluator seeded from entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a reproducible evaluator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            generation: AtomicU32::new(0),
        }
    }
}

impl Default for RandomEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for RandomEvaluator {
    async fn score(&self, _task: &str, _response: &str) -> anyhow::Result<f64> {
        let base: f64 = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| anyhow::anyhow!("evaluator rng poisoned"))?;
            rng.gen_range(0.5..1.0)
        };
        let bonus = f64::from(self.generation.load(Ordering::Relaxed)) * Self::GENERATION_BONUS;
        Ok((base + bonus).min(1.0))
    }

    fn begin_generation(&self, generation: u32) {
        self.generation.store(generation, Ordering::Relaxed);
    }
}

/// Evaluator backed by a plain function, e.g. an exact-match or length heuristic.
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    /// Wraps `f(task, response)`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    async fn score(&self, task: &str, response: &str) -> anyhow::Result<f64> {
        Ok((self.f)(task, response))
    }
}

/// Scores through `evaluator`, mapping every failure to [`FAILED_EVALUATION_SCORE`] and clamping
/// the result into `[0.0, 1.0]`.
pub(crate) async fn guarded_score(
    evaluator: &dyn Evaluator,
    task: &str,
    response: &str,
    timeout: Option<Duration>,
) -> f64 {
    let scoring = evaluator.score(task, response);
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, scoring).await {
            Ok(outcome) => outcome,
            Err(_) => Err(anyhow::anyhow!("evaluation timed out after {limit:?}")),
        },
        None => scoring.await,
    };

    match outcome {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        Ok(score) => {
            warn!("evaluator returned {score}, counted as failed");
            FAILED_EVALUATION_SCORE
        }
        Err(e) => {
            warn!("evaluation failed: {e:#}");
            FAILED_EVALUATION_SCORE
        }
    }
}

#[cfg(test)]
mod evaluator_tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Evaluator for Failing {
        async fn score(&self, _task: &str, _response: &str) -> anyhow::Result<f64> {
            anyhow::bail!("reward model offline")
        }
    }

    struct Slow;

    #[async_trait]
    impl Evaluator for Slow {
        async fn score(&self, _task: &str, _response: &str) -> anyhow::Result<f64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1.0)
        }
    }

    #[tokio::test]
    async fn failures_map_to_failed_score() {
        assert_eq!(guarded_score(&Failing, "t", "r", None).await, FAILED_EVALUATION_SCORE);
    }

    #[tokio::test]
    async fn timeouts_map_to_failed_score() {
        let score = guarded_score(&Slow, "t", "r", Some(Duration::from_millis(10))).await;
        assert_eq!(score, FAILED_EVALUATION_SCORE);
    }

    #[tokio::test]
    async fn out_of_range_scores_are_clamped() {
        let high = FnEvaluator::new(|_: &str, _: &str| 3.0);
        let low = FnEvaluator::new(|_: &str, _: &str| -1.0);
        let nan = FnEvaluator::new(|_: &str, _: &str| f64::NAN);
        assert_eq!(guarded_score(&high, "t", "r", None).await, 1.0);
        assert_eq!(guarded_score(&low, "t", "r", None).await, 0.0);
        assert_eq!(guarded_score(&nan, "t", "r", None).await, FAILED_EVALUATION_SCORE);
    }

    #[tokio::test]
    async fn random_scores_stay_in_range() {
        let evaluator = RandomEvaluator::seeded(7);
        for _ in 0..100 {
            let score = evaluator.score("t", "r").await.unwrap();
            assert!((0.5..1.0).contains(&score));
        }
        evaluator.begin_generation(20);
        assert_eq!(evaluator.score("t", "r").await.unwrap(), 1.0);
    }
}
