//! Scores owned by the arena, and the leaderboard derived from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;

/// One line of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Agent id
    pub agent_id: String,
    /// Cumulative score
    pub score: f64,
}

/// Mapping from agent id to cumulative score.
///
/// Agents absent from the ledger have a score of 0.0.
#[derive(Debug, Clone, Default)]
pub struct ScoreLedger {
    scores: HashMap<String, f64>,
}

impl ScoreLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score of `agent_id`.
    pub fn get(&self, agent_id: &str) -> f64 {
        self.scores.get(agent_id).copied().unwrap_or(0.0)
    }

    /// Adds `delta` to the score of `agent_id` and returns the new total.
    pub fn add(&mut self, agent_id: &str, delta: f64) -> f64 {
        let total = self.scores.entry(agent_id.to_owned()).or_insert(0.0);
        *total += delta;
        *total
    }

    /// Forgets every score and starts `population` at 0.0.
    pub fn reset(&mut self, population: &[Agent]) {
        self.scores.clear();
        for agent in population {
            self.scores.insert(agent.id().to_owned(), 0.0);
        }
    }

    /// Ranks `population` by score, descending. Agents with equal scores keep their population
    /// order.
    pub fn leaderboard(&self, population: &[Agent]) -> Vec<LeaderboardEntry> {
        let mut board: Vec<_> = population
            .iter()
            .map(|agent| LeaderboardEntry {
                agent_id: agent.id().to_owned(),
                score: self.get(agent.id()),
            })
            .collect();
        // sort_by is stable
        board.sort_by(|a, b| b.score.total_cmp(&a.score));
        board
    }
}

#[cfg(test)]
mod ledger_tests {
    use proptest::prelude::*;

    use super::*;

    fn population(n: usize) -> Vec<Agent> {
        (0..n).map(|i| Agent::new(format!("agent_{i}"), 0)).collect()
    }

    #[test]
    fn add_accumulates() {
        let mut ledger = ScoreLedger::new();
        assert_eq!(ledger.add("a", 0.5), 0.5);
        assert_eq!(ledger.add("a", 0.25), 0.75);
        assert_eq!(ledger.get("b"), 0.0);
    }

    #[test]
    fn reset_drops_departed_agents() {
        let agents = population(2);
        let mut ledger = ScoreLedger::new();
        ledger.add("agent_0", 1.0);
        ledger.add("ghost", 3.0);
        ledger.reset(&agents);
        assert_eq!(ledger.get("agent_0"), 0.0);
        assert_eq!(ledger.get("ghost"), 0.0);
        assert_eq!(ledger.leaderboard(&agents).len(), 2);
    }

    #[test]
    fn ties_keep_population_order() {
        let agents = population(4);
        let mut ledger = ScoreLedger::new();
        ledger.add("agent_2", 1.0);
        ledger.add("agent_3", 1.0);
        let ids: Vec<_> = ledger
            .leaderboard(&agents)
            .into_iter()
            .map(|e| e.agent_id)
            .collect();
        assert_eq!(ids, ["agent_2", "agent_3", "agent_0", "agent_1"]);
    }

    proptest! {
        #[test]
        fn leaderboard_is_sorted_permutation(scores in prop::collection::vec(0.0f64..10.0, 1..20)) {
            let agents = population(scores.len());
            let mut ledger = ScoreLedger::new();
            for (agent, score) in agents.iter().zip(&scores) {
                ledger.add(agent.id(), *score);
            }
            let board = ledger.leaderboard(&agents);
            prop_assert!(board.windows(2).all(|w| w[0].score >= w[1].score));

            let mut ranked: Vec<_> = board.iter().map(|e| e.agent_id.clone()).collect();
            let mut ids: Vec<_> = agents.iter().map(|a| a.id().to_owned()).collect();
            ranked.sort();
            ids.sort();
            prop_assert_eq!(ranked, ids);
        }
    }
}
