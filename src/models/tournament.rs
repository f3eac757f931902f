//! The tournament aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

use super::{EntityId, Match, MatchId, Player, PlayerId, Round, Score, Team, TeamId, TournamentId};
use crate::error::{EntityKind, Result, TournamentError};

/// Pairing format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentMode {
    Swiss,
    RoundRobin,
    Cup,
}

impl fmt::Display for TournamentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentMode::Swiss => write!(f, "swiss"),
            TournamentMode::RoundRobin => write!(f, "round-robin"),
            TournamentMode::Cup => write!(f, "cup"),
        }
    }
}

impl std::str::FromStr for TournamentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swiss" => Ok(TournamentMode::Swiss),
            "round-robin" | "roundrobin" | "rr" => Ok(TournamentMode::RoundRobin),
            "cup" | "knockout" => Ok(TournamentMode::Cup),
            other => Err(format!(
                "Unknown mode: {}. Use 'swiss', 'round-robin' or 'cup'.",
                other
            )),
        }
    }
}

/// Lifecycle state. `Completed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    #[default]
    Pending,
    Ongoing,
    Completed,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentStatus::Pending => write!(f, "pending"),
            TournamentStatus::Ongoing => write!(f, "ongoing"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A seat in the persistent round-robin rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SeatRepr")]
pub enum Seat {
    Player(PlayerId),
    /// Padding seat for odd fields; whoever faces it sits out with a BYE
    Bye,
}

/// Id of the padding entry in older seating lists.
const LEGACY_BYE_ID: &str = "BYE_PLAYER";

/// Accepted seat encodings: the tagged form written by [`Seat`], or an
/// older player-shaped object (`{"id": .., "isByeDummy": ..}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum SeatRepr {
    Tagged(TaggedSeat),
    Legacy(LegacySeat),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum TaggedSeat {
    Player(PlayerId),
    Bye,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySeat {
    id: PlayerId,
    #[serde(default)]
    is_bye_dummy: bool,
}

impl From<SeatRepr> for Seat {
    fn from(repr: SeatRepr) -> Self {
        match repr {
            SeatRepr::Tagged(TaggedSeat::Player(id)) => Seat::Player(id),
            SeatRepr::Tagged(TaggedSeat::Bye) => Seat::Bye,
            SeatRepr::Legacy(seat) if seat.is_bye_dummy || seat.id.as_str() == LEGACY_BYE_ID => {
                Seat::Bye
            }
            SeatRepr::Legacy(seat) => Seat::Player(seat.id),
        }
    }
}

/// One row of the frozen final standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub score: Score,
    #[serde(default)]
    pub rating: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    #[serde(default)]
    pub team_name: Option<String>,
}

/// A tournament with its roster, rounds and standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,

    pub name: String,

    pub mode: TournamentMode,

    /// Free-text time control, e.g. "10+0"
    #[serde(default)]
    pub time_control: String,

    /// Fixed round limit; `None` means unlimited
    #[serde(default)]
    pub num_rounds: Option<u32>,

    #[serde(default)]
    pub is_team_tournament: bool,

    #[serde(default)]
    pub status: TournamentStatus,

    pub players: Vec<Player>,

    #[serde(default)]
    pub teams: Vec<Team>,

    pub rounds: Vec<Round>,

    /// Standings frozen when the tournament ended
    #[serde(default, deserialize_with = "lenient_leaderboard")]
    pub leaderboard: Vec<StandingEntry>,

    /// Persistent round-robin seating, fixed when the first round-robin round is drawn
    #[serde(default)]
    pub rr_players_order: Option<Vec<Seat>>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Read a stored leaderboard, discarding it when its rows are not standings
/// rows (older documents kept whole player objects here).
fn lenient_leaderboard<'de, D>(deserializer: D) -> std::result::Result<Vec<StandingEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let parsed: std::result::Result<Vec<StandingEntry>, _> =
        rows.into_iter().map(serde_json::from_value).collect();
    match parsed {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!("Discarding stored leaderboard: {}", e);
            Ok(Vec::new())
        }
    }
}

impl Tournament {
    /// Create a new pending tournament.
    pub fn new(name: String, mode: TournamentMode, time_control: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            name,
            mode,
            time_control,
            num_rounds: None,
            is_team_tournament: false,
            status: TournamentStatus::Pending,
            players: Vec::new(),
            teams: Vec::new(),
            rounds: Vec::new(),
            leaderboard: Vec::new(),
            rr_players_order: None,
            created_at: now,
            last_updated: now,
            completed_at: None,
        }
    }

    /// Builder method to set the round limit.
    pub fn with_round_limit(mut self, rounds: u32) -> Self {
        self.num_rounds = Some(rounds);
        self
    }

    /// Builder method to mark this as a team tournament.
    pub fn with_teams(mut self) -> Self {
        self.is_team_tournament = true;
        self
    }

    /// Bump `last_updated`.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status != TournamentStatus::Completed
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    pub fn require_player(&self, id: &PlayerId) -> Result<&Player> {
        self.player(id)
            .ok_or_else(|| TournamentError::not_found(EntityKind::Player, id))
    }

    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == *id)
    }

    /// Players still in contention (all players outside cup mode).
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn current_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut()
    }

    /// Locate a match in the current round.
    pub fn current_match(&self, match_id: &MatchId) -> Result<&Match> {
        self.current_round()
            .and_then(|r| r.find_match(match_id))
            .ok_or_else(|| TournamentError::not_found(EntityKind::Match, match_id))
    }

    /// Number of BYEs the player has received across all rounds.
    pub fn bye_count(&self, player_id: &PlayerId) -> usize {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .filter(|m| m.is_bye() && m.player1_id == *player_id)
            .count()
    }

    /// The player appears on any board of any round.
    pub fn has_any_match(&self, player_id: &PlayerId) -> bool {
        self.rounds.iter().any(|r| r.includes_player(player_id))
    }

    /// Fail unless the most recent round has every non-BYE match recorded.
    pub fn ensure_current_round_recorded(&self) -> Result<()> {
        match self.current_round() {
            Some(round) if !round.is_fully_recorded() => Err(TournamentError::IncompleteRound {
                round: round.round_number,
                pending: round.pending_count(),
            }),
            _ => Ok(()),
        }
    }
}
