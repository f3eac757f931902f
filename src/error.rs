//! Errors raised by the tournament core.

use std::fmt;
use thiserror::Error;

use crate::models::{PlayerId, TournamentStatus};

/// The kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Team,
    Match,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Player => "Player",
            EntityKind::Team => "Team",
            EntityKind::Match => "Match",
        };
        f.write_str(name)
    }
}

/// Errors that abort a core operation. None of them leave partial mutations behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TournamentError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {action} while tournament is {status}")]
    InvalidState {
        action: &'static str,
        status: TournamentStatus,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("No round has been generated yet")]
    NoRound,

    #[error("Maximum of {limit} rounds reached")]
    RoundLimitReached { limit: u32 },

    #[error("Round {round} still has {pending} unrecorded match(es)")]
    IncompleteRound { round: u32, pending: usize },

    #[error("At least {required} active participants required, found {found}")]
    InsufficientParticipants { required: usize, found: usize },

    #[error("Cup winner already decided: {winner}")]
    WinnerDecided { winner: PlayerId },
}

impl TournamentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TournamentError::Validation(msg.into())
    }

    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        TournamentError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = TournamentError> = std::result::Result<T, E>;
