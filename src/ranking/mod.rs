//! Standings computation.
//!
//! Players are ordered by:
//! - score, highest first
//! - rating, highest first (no rating counts as 0)
//! - name, ascending (case-sensitive)
//!
//! Rating is the only tie-break; no Buchholz-style statistics are kept.

use std::cmp::Ordering;

use crate::models::{Player, StandingEntry};

/// Standings order between two players.
pub fn compare(a: &Player, b: &Player) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)))
        .then_with(|| a.name.cmp(&b.name))
}

/// Players in standings order.
pub fn rank(players: &[Player]) -> Vec<&Player> {
    let mut sorted: Vec<&Player> = players.iter().collect();
    sorted.sort_by(|a, b| compare(a, b));
    sorted
}

/// Numbered standings rows, suitable for freezing as the final leaderboard.
pub fn standings(players: &[Player]) -> Vec<StandingEntry> {
    rank(players)
        .into_iter()
        .enumerate()
        .map(|(idx, p)| StandingEntry {
            rank: idx as u32 + 1,
            player_id: p.id.clone(),
            name: p.name.clone(),
            score: p.score,
            rating: p.rating,
            wins: p.wins,
            losses: p.losses,
            draws: p.draws,
            team_name: p.team_name.clone(),
        })
        .collect()
}
