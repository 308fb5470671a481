//! Progress output printed when [`Configuration::with_verbose`](crate::configuration::Configuration::with_verbose) is set.

use crate::history::{CollaborationRecord, GenerationRecord, RoundRecord};
use crate::ledger::LeaderboardEntry;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[39m";

pub(crate) fn print_round(record: &RoundRecord, total_rounds: usize) {
    println!("{GREEN}Round {}/{total_rounds}{RESET}", record.round);
    for result in &record.results {
        println!(
            "  {}: round score = {:.3}, total = {:.3}",
            result.agent_id, result.round_score, result.total_score
        );
    }
}

pub(crate) fn print_collaboration(index: usize, record: &CollaborationRecord) {
    let task: String = record.task.chars().take(50).collect();
    println!("{GREEN}Task {}:{RESET} {task}", index + 1);
    println!(
        "  primary {} -> critic {} -> synthesizer {}: {YELLOW}{:.3}{RESET}",
        record.primary_id, record.critic_id, record.synthesizer_id, record.score
    );
}

pub(crate) fn print_generation(record: &GenerationRecord, total_generations: u32) {
    println!(
        "{GREEN}Generation {}/{total_generations}{RESET}",
        record.generation
    );
    for entry in &record.scores {
        println!("  {}: score = {:.3}", entry.agent_id, entry.score);
    }
    println!(
        "  best = {:.3}, average = {:.3}, survivors: {}",
        record.best_score,
        record.avg_score,
        record.survivors.join(", ")
    );
}

pub(crate) fn print_leaderboard(board: &[LeaderboardEntry]) {
    println!("{GREEN}Final leaderboard{RESET}");
    for (rank, entry) in board.iter().enumerate() {
        println!("{}. {}: {:.3}", rank + 1, entry.agent_id, entry.score);
    }
}
