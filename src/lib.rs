//! # Tourney Desk
//!
//! Pairing, scoring and standings for swiss, round-robin and cup
//! tournaments.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (tournaments, players, rounds, matches)
//! - **lifecycle**: The `TournamentDesk` controller and roster management
//! - **pairing**: Round generation per mode, plus manual pairing
//! - **ledger**: Result recording, corrections and the cup elimination cascade
//! - **ranking**: Standings order
//! - **storage**: Tournament snapshots (JSONL store, JSON import/export)
//! - **notify**: Change notification hooks
//! - **config**: Configuration loading and validation

pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod pairing;
pub mod ranking;
pub mod storage;

pub use error::{Result, TournamentError};
pub use lifecycle::{NewTournament, PlayerDetails, TournamentDesk, Transition};
pub use models::*;
