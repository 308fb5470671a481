use tracing::{debug, info, instrument};

use super::{Arena, ArenaMode};
use crate::display;
use crate::error::ArenaError;
use crate::history::{CollaborationRecord, HistoryEntry};

/// Agents needed to fill the three distinct roles.
pub const MIN_COLLABORATORS: usize = 3;

/// Share of the task score going to the agent that drafted the answer.
pub const PRIMARY_SHARE: f64 = 0.4;
/// Share of the task score going to the critic.
pub const CRITIC_SHARE: f64 = 0.3;
/// Share of the task score going to the synthesizer.
pub const SYNTHESIZER_SHARE: f64 = 0.3;

/// Population indices of the three collaborators of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollaborationRoles {
    /// Drafts the answer
    pub primary: usize,
    /// Critiques the draft
    pub critic: usize,
    /// Writes the final answer from draft and critique
    pub synthesizer: usize,
}

impl CollaborationRoles {
    /// Round-robin assignment for the task at `task_index`.
    ///
    /// As the index advances every agent takes every role. Returns `None` when the population
    /// cannot provide three distinct agents.
    pub fn assign(task_index: usize, population_size: usize) -> Option<Self> {
        if population_size < MIN_COLLABORATORS {
            return None;
        }
        Some(Self {
            primary: task_index % population_size,
            critic: (task_index + 1) % population_size,
            synthesizer: (task_index + 2) % population_size,
        })
    }
}

/// Prompt given to the critic.
pub fn compose_critique_prompt(draft: &str) -> String {
    format!("Critique this response: {draft}")
}

/// Prompt given to the synthesizer.
pub fn compose_synthesis_prompt(draft: &str, critique: &str) -> String {
    format!("Improve based on critique. Original: {draft}. Critique: {critique}")
}

/// Rewards of primary, critic and synthesizer for a task scored `score`.
pub fn split_reward(score: f64) -> [f64; 3] {
    [
        score * PRIMARY_SHARE,
        score * CRITIC_SHARE,
        score * SYNTHESIZER_SHARE,
    ]
}

impl Arena {
    /// Solves each task once with three collaborators: the primary drafts, the critic reviews the
    /// draft, the synthesizer improves it. Only the final answer is evaluated.
    ///
    /// The three calls of a task are strictly sequential. Returns one record per task, in task
    /// order.
    ///
    /// # Errors
    /// [`ArenaError::InsufficientPopulation`] with fewer than three agents, before any task is
    /// processed. [`ArenaError::Cancelled`] if the cancel flag is raised between two tasks.
    #[instrument(skip(self, tasks), fields(num_tasks = tasks.len()))]
    pub async fn run_collaborative(
        &mut self,
        tasks: &[String],
    ) -> Result<Vec<CollaborationRecord>, ArenaError> {
        self.ensure_population(ArenaMode::Collaborative)?;
        let size = self.population.len();
        info!("collaborative: {} tasks, {size} agents", tasks.len());

        let mut records = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            self.check_cancelled(index, "tasks")?;

            let roles = CollaborationRoles::assign(index, size).ok_or(
                ArenaError::InsufficientPopulation {
                    required: MIN_COLLABORATORS,
                    actual: size,
                },
            )?;
            let primary = &self.population[roles.primary];
            let critic = &self.population[roles.critic];
            let synthesizer = &self.population[roles.synthesizer];

            let draft = self.respond(primary, task).await;
            debug!(agent = %primary.id(), "draft ready");
            let critique = self
                .respond(critic, &compose_critique_prompt(&draft))
                .await;
            debug!(agent = %critic.id(), "critique ready");
            let final_response = self
                .respond(synthesizer, &compose_synthesis_prompt(&draft, &critique))
                .await;
            debug!(agent = %synthesizer.id(), "final response ready");

            let score = self.judge(task, &final_response).await;
            let record = CollaborationRecord {
                task: task.clone(),
                primary_id: primary.id().to_owned(),
                critic_id: critic.id().to_owned(),
                synthesizer_id: synthesizer.id().to_owned(),
                score,
            };

            let [primary_reward, critic_reward, synthesizer_reward] = split_reward(score);
            self.ledger.add(&record.primary_id, primary_reward);
            self.ledger.add(&record.critic_id, critic_reward);
            self.ledger.add(&record.synthesizer_id, synthesizer_reward);

            if self.config.verbose {
                display::print_collaboration(index, &record);
            }
            self.history.push(HistoryEntry::Collaboration(record.clone()));
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod collaborative_tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn too_small_population_has_no_roles() {
        assert_eq!(CollaborationRoles::assign(0, 2), None);
    }

    #[test]
    fn roles_rotate() {
        let roles = CollaborationRoles::assign(3, 4).unwrap();
        assert_eq!(
            roles,
            CollaborationRoles {
                primary: 3,
                critic: 0,
                synthesizer: 1
            }
        );
    }

    #[test]
    fn prompts_embed_previous_steps() {
        assert_eq!(compose_critique_prompt("d"), "Critique this response: d");
        assert_eq!(
            compose_synthesis_prompt("d", "c"),
            "Improve based on critique. Original: d. Critique: c"
        );
    }

    proptest! {
        #[test]
        fn roles_are_distinct(size in 3usize..64, index in 0usize..10_000) {
            let roles = CollaborationRoles::assign(index, size).unwrap();
            prop_assert_ne!(roles.primary, roles.critic);
            prop_assert_ne!(roles.critic, roles.synthesizer);
            prop_assert_ne!(roles.synthesizer, roles.primary);
            prop_assert!(roles.primary < size && roles.critic < size && roles.synthesizer < size);
        }

        #[test]
        fn rewards_sum_to_score(score in 0.0f64..=1.0) {
            let total: f64 = split_reward(score).iter().sum();
            prop_assert!((total - score).abs() < 1e-12);
        }
    }
}
