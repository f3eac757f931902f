//! Pairing engine.
//!
//! Produces the next round for a tournament, one algorithm per mode:
//! - **swiss**: random or points ordering, fair BYE, greedy no-rematch pairing
//! - **round-robin**: circle method over a persistent seating order
//! - **cup**: single-elimination bracket among players still in contention
//!
//! Generation happens in two steps. [`plan_round`] inspects the tournament
//! and returns a [`RoundPlan`] without mutating anything; [`commit_plan`]
//! appends the round and awards its BYEs. A failed precondition therefore
//! never leaves a half-built round behind.

mod cup;
mod manual;
mod round_robin;
mod swiss;

pub use manual::*;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::error::{Result, TournamentError};
use crate::ledger;
use crate::models::{Match, PlayerId, Round, Seat, Tournament, TournamentMode, TournamentStatus};

/// Candidate ordering for swiss rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwissOrdering {
    /// Shuffled; used for the opening round
    Random,
    /// Score, then rating, then name
    Points,
}

impl std::str::FromStr for SwissOrdering {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SwissOrdering::Random),
            "points" | "auto" => Ok(SwissOrdering::Points),
            other => Err(format!("Unknown pairing method: {}. Use 'random' or 'points'.", other)),
        }
    }
}

/// Non-fatal problems found while pairing. The round is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingWarning {
    /// No legal opponent was left; the player sits this round out
    Unpaired { player_id: PlayerId, name: String },
    /// Two teammates were paired because the schedule required it
    SameTeam { player1: String, player2: String },
    /// A manual pairing repeats an earlier game
    Rematch { player1: String, player2: String },
    /// Joined after the round-robin seating was fixed
    UnscheduledPlayer { player_id: PlayerId, name: String },
}

impl fmt::Display for PairingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingWarning::Unpaired { name, .. } => {
                write!(f, "No valid opponent for {}; unpaired this round", name)
            }
            PairingWarning::SameTeam { player1, player2 } => {
                write!(f, "{} and {} are teammates but were paired", player1, player2)
            }
            PairingWarning::Rematch { player1, player2 } => {
                write!(f, "{} and {} have already played each other", player1, player2)
            }
            PairingWarning::UnscheduledPlayer { name, .. } => {
                write!(f, "{} joined after the round-robin schedule was fixed", name)
            }
        }
    }
}

/// A round ready to be appended.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub round_number: u32,
    pub matches: Vec<Match>,
    pub warnings: Vec<PairingWarning>,
    /// Round-robin seating to persist for the following round
    pub next_seating: Option<Vec<Seat>>,
}

impl RoundPlan {
    fn new(round_number: u32) -> Self {
        Self {
            round_number,
            matches: Vec::new(),
            warnings: Vec::new(),
            next_seating: None,
        }
    }

    fn next_board(&self) -> u32 {
        self.matches.len() as u32 + 1
    }

    fn push_pair(&mut self, player1: PlayerId, player2: PlayerId) {
        let board = self.next_board();
        self.matches.push(Match::paired(player1, player2, board));
    }

    fn push_bye(&mut self, player: PlayerId) {
        let board = self.next_board();
        self.matches.push(Match::bye(player, board));
    }
}

/// Summary of a generated round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub round_number: u32,
    /// False when nothing could be paired and no round was added
    pub appended: bool,
    pub matches: usize,
    pub byes: Vec<PlayerId>,
    pub warnings: Vec<PairingWarning>,
}

/// Check preconditions and pair the next round without touching the tournament.
pub fn plan_round<R: Rng>(
    tournament: &Tournament,
    ordering: SwissOrdering,
    rng: &mut R,
) -> Result<RoundPlan> {
    tournament.ensure_current_round_recorded()?;

    if let Some(limit) = tournament.num_rounds {
        if tournament.rounds.len() >= limit as usize {
            return Err(TournamentError::RoundLimitReached { limit });
        }
    }

    let round_number = tournament.rounds.len() as u32 + 1;
    match tournament.mode {
        TournamentMode::Swiss => swiss::pair(tournament, round_number, ordering, rng),
        TournamentMode::RoundRobin => round_robin::pair(tournament, round_number),
        TournamentMode::Cup => cup::pair(tournament, round_number, rng),
    }
}

/// Append a planned round, close the previous one and award its BYEs.
pub fn commit_plan(tournament: &mut Tournament, plan: RoundPlan) -> RoundReport {
    for warning in &plan.warnings {
        warn!("Round {}: {}", plan.round_number, warning);
    }

    if let Some(seating) = plan.next_seating {
        tournament.rr_players_order = Some(seating);
    }

    let byes: Vec<PlayerId> = plan
        .matches
        .iter()
        .filter(|m| m.is_bye())
        .map(|m| m.player1_id.clone())
        .collect();

    if plan.matches.is_empty() && tournament.mode != TournamentMode::Cup {
        warn!(
            "No matches could be generated for round {}",
            plan.round_number
        );
        return RoundReport {
            round_number: plan.round_number,
            appended: false,
            matches: 0,
            byes,
            warnings: plan.warnings,
        };
    }

    if let Some(previous) = tournament.current_round_mut() {
        if previous.completed_at.is_none() {
            previous.completed_at = Some(Utc::now());
        }
    }

    let match_count = plan.matches.len();
    tournament
        .rounds
        .push(Round::new(plan.round_number, plan.matches));
    let round_idx = tournament.rounds.len() - 1;

    let bye_indices: Vec<usize> = tournament.rounds[round_idx]
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_bye())
        .map(|(idx, _)| idx)
        .collect();
    for match_idx in bye_indices {
        ledger::award_bye(tournament, round_idx, match_idx);
    }

    tournament.touch();
    info!(
        "Round {} generated: {} match(es), {} BYE(s)",
        plan.round_number,
        match_count,
        byes.len()
    );

    RoundReport {
        round_number: plan.round_number,
        appended: true,
        matches: match_count,
        byes,
        warnings: plan.warnings,
    }
}

/// Generate and append the next round of an ongoing tournament.
pub fn generate_round<R: Rng>(
    tournament: &mut Tournament,
    ordering: SwissOrdering,
    rng: &mut R,
) -> Result<RoundReport> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::InvalidState {
            action: "generate a round",
            status: tournament.status,
        });
    }

    let plan = plan_round(tournament, ordering, rng)?;
    Ok(commit_plan(tournament, plan))
}

fn require_participants(found: usize) -> Result<()> {
    if found < 2 {
        return Err(TournamentError::InsufficientParticipants { required: 2, found });
    }
    Ok(())
}
