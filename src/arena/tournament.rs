use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{Arena, ArenaMode};
use crate::display;
use crate::error::ArenaError;
use crate::history::{HistoryEntry, RoundRecord, RoundScore};
use crate::ledger::LeaderboardEntry;

/// Output of a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    /// Every round played, in order
    pub rounds: Vec<RoundRecord>,
    /// Ranking after the last round
    pub leaderboard: Vec<LeaderboardEntry>,
}

fn mean(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        // no task, no contribution
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

impl Arena {
    /// Plays `rounds` rounds: each agent answers every task, and the mean score of the round is
    /// added to its cumulative score.
    ///
    /// An empty task list is allowed; every round then scores 0.0.
    ///
    /// # Errors
    /// - [`ArenaError::NotInitialized`] without population
    /// - [`ArenaError::InvalidConfiguration`] if `rounds` is zero
    /// - [`ArenaError::Cancelled`] if the cancel flag is raised between two rounds
    #[instrument(skip(self, tasks), fields(num_tasks = tasks.len()))]
    pub async fn run_tournament(
        &mut self,
        tasks: &[String],
        rounds: usize,
    ) -> Result<TournamentSummary, ArenaError> {
        self.ensure_population(ArenaMode::Tournament)?;
        if rounds == 0 {
            return Err(ArenaError::InvalidConfiguration(
                "at least one round is required".to_owned(),
            ));
        }
        if tasks.is_empty() {
            warn!("empty task list, rounds will not change any score");
        }
        info!(
            "tournament: {rounds} rounds, {} agents",
            self.population.len()
        );

        let mut played = Vec::new();
        for round in 1..=rounds {
            self.check_cancelled(round - 1, "rounds")?;

            let task_scores = self.score_population(tasks).await;
            let mut results = Vec::with_capacity(self.population.len());
            for (agent, scores) in self.population.iter().zip(task_scores) {
                let round_score = mean(&scores);
                let total_score = self.ledger.add(agent.id(), round_score);
                results.push(RoundScore {
                    agent_id: agent.id().to_owned(),
                    round_score,
                    total_score,
                });
            }

            let record = RoundRecord {
                generation: self.generation,
                round,
                results,
            };
            if self.config.verbose {
                display::print_round(&record, rounds);
            }
            self.history.push(HistoryEntry::Round(record.clone()));
            played.push(record);
        }

        Ok(TournamentSummary {
            rounds: played,
            leaderboard: self.leaderboard(),
        })
    }
}

#[cfg(test)]
mod tournament_tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 0.0]), 0.5);
    }
}
