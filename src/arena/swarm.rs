use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{Arena, ArenaMode};
use crate::agent::Agent;
use crate::display;
use crate::error::ArenaError;
use crate::history::{AgentScore, GenerationRecord, HistoryEntry};

/// Selection never keeps fewer agents than this.
pub const MIN_SURVIVORS: usize = 2;

/// Output of a swarm evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSummary {
    /// One record per generation, in order
    pub generations: Vec<GenerationRecord>,
    /// Best score of the last generation
    pub final_best_score: f64,
    /// Mean score of the last generation
    pub final_avg_score: f64,
    /// Last best score minus first best score
    pub improvement: f64,
}

/// Number of agents kept by selection: `max(2, floor(population_size * survival_rate))`, never
/// more than the population.
pub fn survivor_count(population_size: usize, survival_rate: f64) -> usize {
    let kept = (population_size as f64 * survival_rate).floor() as usize;
    kept.max(MIN_SURVIVORS).min(population_size)
}

impl Arena {
    /// Evolves the population for `generations` generations.
    ///
    /// Each generation every score is reset, each agent's scores over the task list are summed,
    /// the population is ranked and the top [`survivor_count`] agents survive. Except after the
    /// last generation, a new population of the configured size is bred: the best survivor is
    /// carried over unchanged and every other slot gets an offspring of two survivors drawn
    /// uniformly with replacement. Offspring get a fresh runtime from the base configuration;
    /// their parents are recorded for audit only.
    ///
    /// Calling it again on the same arena continues the generation numbering of the previous
    /// run.
    ///
    /// # Errors
    /// - [`ArenaError::InvalidPopulationSize`] with fewer than two agents
    /// - [`ArenaError::InvalidConfiguration`] if `generations` is zero or `survival_rate` is
    ///   outside `(0, 1]`
    /// - [`ArenaError::Cancelled`] if the cancel flag is raised between two generations
    #[instrument(skip(self, tasks), fields(num_tasks = tasks.len()))]
    pub async fn run_swarm_evolution(
        &mut self,
        tasks: &[String],
        generations: usize,
        survival_rate: f64,
    ) -> Result<EvolutionSummary, ArenaError> {
        self.ensure_population(ArenaMode::Swarm)?;
        if !(survival_rate > 0.0 && survival_rate <= 1.0) {
            return Err(ArenaError::InvalidConfiguration(format!(
                "survival rate {survival_rate} is outside (0, 1]"
            )));
        }
        let total = u32::try_from(generations)
            .ok()
            .filter(|&g| g > 0)
            .ok_or_else(|| {
                ArenaError::InvalidConfiguration(format!(
                    "cannot evolve for {generations} generations"
                ))
            })?;
        // numbering continues across runs on the same arena: offspring ids stay unique
        let first = if self.has_evolved() {
            self.generation + 1
        } else {
            0
        };
        let last = first.checked_add(total).map(|end| end - 1).ok_or_else(|| {
            ArenaError::InvalidConfiguration(format!(
                "cannot evolve for {generations} more generations"
            ))
        })?;
        info!(
            "swarm evolution: generations {}..={}, {} agents",
            first + 1,
            last + 1,
            self.population.len()
        );

        let mut records = Vec::new();
        for generation in first..=last {
            self.check_cancelled((generation - first) as usize, "generations")?;
            self.generation = generation;
            self.evaluator.begin_generation(generation);

            // 1. evaluate: summed, not averaged
            self.ledger.reset(&self.population);
            let task_scores = self.score_population(tasks).await;
            for (agent, scores) in self.population.iter().zip(task_scores) {
                self.ledger.add(agent.id(), scores.iter().sum());
            }

            // 2. rank (stable) and select
            let ledger = &self.ledger;
            self.population
                .sort_by(|a, b| ledger.get(b.id()).total_cmp(&ledger.get(a.id())));
            let num_survivors = survivor_count(self.population.len(), survival_rate);
            let record = self.generation_record(generation + 1, num_survivors);
            info!(survivors = ?record.survivors, "generation {} evaluated", record.generation);
            if self.config.verbose {
                display::print_generation(&record, last + 1);
            }
            self.history.push(HistoryEntry::Generation(record.clone()));
            records.push(record);

            // 3. breed, except after the last generation
            if generation < last {
                self.breed(num_survivors, generation + 1).await;
            }
        }

        let first_best = records.first().map_or(0.0, |r| r.best_score);
        let (final_best_score, final_avg_score) = records
            .last()
            .map_or((0.0, 0.0), |r| (r.best_score, r.avg_score));
        info!(
            "evolution complete: best {final_best_score:.3}, improvement {:.3}",
            final_best_score - first_best
        );

        Ok(EvolutionSummary {
            generations: records,
            final_best_score,
            final_avg_score,
            improvement: final_best_score - first_best,
        })
    }

    fn has_evolved(&self) -> bool {
        self.history
            .entries()
            .iter()
            .any(|entry| matches!(entry, HistoryEntry::Generation(_)))
    }

    /// Expects the population to be sorted, best first.
    fn generation_record(&self, number: u32, num_survivors: usize) -> GenerationRecord {
        let scores: Vec<AgentScore> = self
            .population
            .iter()
            .map(|agent| AgentScore {
                agent_id: agent.id().to_owned(),
                score: self.ledger.get(agent.id()),
            })
            .collect();
        let best_score = scores.first().map_or(0.0, |s| s.score);
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
        };
        let survivors = scores
            .iter()
            .take(num_survivors)
            .map(|s| s.agent_id.clone())
            .collect();

        GenerationRecord {
            generation: number,
            best_score,
            avg_score,
            survivors,
            scores,
        }
    }

    /// Replaces the (sorted) population by the elite plus offspring of the first
    /// `num_survivors` agents.
    async fn breed(&mut self, num_survivors: usize, next_generation: u32) {
        let survivor_ids: Vec<String> = self
            .population
            .iter()
            .take(num_survivors)
            .map(|agent| agent.id().to_owned())
            .collect();

        // elitism: the best agent keeps its id, generation and runtime
        let mut next = std::mem::take(&mut self.population);
        next.truncate(1);

        while next.len() < self.population_size {
            let slot = next.len();
            let first = survivor_ids[self.rng.gen_range(0..survivor_ids.len())].clone();
            let second = survivor_ids[self.rng.gen_range(0..survivor_ids.len())].clone();
            let mut offspring = Agent::offspring(
                format!("agent_{slot}_gen_{next_generation}"),
                next_generation,
                [first, second],
            );
            // no weight interpolation: offspring restart from the base model
            if let Err(e) = offspring
                .initialize(self.factory.as_ref(), &self.base_config)
                .await
            {
                warn!("{e}, offspring kept without runtime");
            }
            next.push(offspring);
        }

        debug!(
            "generation {next_generation} bred from {} survivors",
            survivor_ids.len()
        );
        self.population = next;
    }
}

#[cfg(test)]
mod swarm_tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn survivor_count_examples() {
        assert_eq!(survivor_count(5, 0.4), 2);
        assert_eq!(survivor_count(4, 0.5), 2);
        assert_eq!(survivor_count(10, 0.5), 5);
        assert_eq!(survivor_count(2, 0.1), 2);
        assert_eq!(survivor_count(7, 1.0), 7);
    }

    proptest! {
        #[test]
        fn survivor_count_bounds(size in 2usize..500, rate in 0.0001f64..=1.0) {
            let count = survivor_count(size, rate);
            let expected = ((size as f64 * rate).floor() as usize).max(2);
            prop_assert_eq!(count, expected);
            prop_assert!(count <= size);
        }
    }
}
