//! Player and team models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId, Score, TeamId};

/// A team that players may be affiliated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,

    /// Unique (case-insensitive) team name
    pub name: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: String) -> Self {
        Self {
            id: EntityId::generate(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// A tournament participant and their running record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique identifier
    pub id: PlayerId,

    /// Unique (case-insensitive) display name
    pub name: String,

    /// Optional numeric rating, used as the ranking tie-break
    #[serde(default)]
    pub rating: Option<u32>,

    #[serde(default)]
    pub score: Score,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,

    #[serde(default)]
    pub draws: u32,

    #[serde(default)]
    pub matches_played: u32,

    /// Team affiliation (team tournaments only)
    #[serde(default)]
    pub team_id: Option<TeamId>,

    /// Cached team name for display
    #[serde(default)]
    pub team_name: Option<String>,

    /// Knocked out of a cup tournament
    #[serde(default)]
    pub eliminated: bool,

    /// Opponents already met, in first-met order, without duplicates
    #[serde(default)]
    pub past_opponents: Vec<PlayerId>,

    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player with a zeroed record.
    pub fn new(name: String) -> Self {
        Self {
            id: EntityId::generate(),
            name,
            rating: None,
            score: Score::ZERO,
            wins: 0,
            losses: 0,
            draws: 0,
            matches_played: 0,
            team_id: None,
            team_name: None,
            eliminated: false,
            past_opponents: Vec::new(),
            added_at: Utc::now(),
        }
    }

    /// Builder method to set rating.
    pub fn with_rating(mut self, rating: u32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Builder method to set team affiliation.
    pub fn with_team(mut self, team: &Team) -> Self {
        self.team_id = Some(team.id.clone());
        self.team_name = Some(team.name.clone());
        self
    }

    pub fn has_played(&self, opponent: &PlayerId) -> bool {
        self.past_opponents.contains(opponent)
    }

    /// Record an opponent; self and duplicates are ignored.
    pub fn remember_opponent(&mut self, opponent: &PlayerId) {
        if *opponent != self.id && !self.has_played(opponent) {
            self.past_opponents.push(opponent.clone());
        }
    }

    /// Both players belong to the same team.
    pub fn shares_team_with(&self, other: &Player) -> bool {
        matches!((&self.team_id, &other.team_id), (Some(a), Some(b)) if a == b)
    }
}

/// Case-insensitive name comparison used for uniqueness checks.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
