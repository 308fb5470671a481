//! Append-only record of what happened during a run.
//!
//! Entries are only ever pushed by the arena; there is no way to edit one after the fact. The
//! history is for reporting and plays no part in scheduling decisions.

use serde::{Deserialize, Serialize};

/// Result of one agent in one tournament round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    /// Agent id
    pub agent_id: String,
    /// Mean score over the task list for this round
    pub round_score: f64,
    /// Cumulative score after this round
    pub total_score: f64,
}

/// One tournament round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Arena generation the round was played in
    pub generation: u32,
    /// 1-based round number
    pub round: usize,
    /// Per-agent results, in population order
    pub results: Vec<RoundScore>,
}

/// One collaborative task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationRecord {
    /// Task prompt
    pub task: String,
    /// Agent that drafted the answer
    pub primary_id: String,
    /// Agent that critiqued the draft
    pub critic_id: String,
    /// Agent that wrote the final answer
    pub synthesizer_id: String,
    /// Score of the final answer
    pub score: f64,
}

/// Score of one agent at the end of a swarm generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    /// Agent id
    pub agent_id: String,
    /// Summed score over the task list
    pub score: f64,
}

/// One swarm-evolution generation, after evaluation and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// 1-based generation number
    pub generation: u32,
    /// Best score of the generation
    pub best_score: f64,
    /// Mean score of the generation
    pub avg_score: f64,
    /// Ids of the selected agents, best first
    pub survivors: Vec<String>,
    /// Every agent's score, best first
    pub scores: Vec<AgentScore>,
}

/// A single history snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// Tournament round
    Round(RoundRecord),
    /// Collaborative task
    Collaboration(CollaborationRecord),
    /// Swarm generation
    Generation(GenerationRecord),
}

/// Ordered snapshots of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
