//! Rounds and the matches played within them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EntityId, MatchId, PlayerId};

/// How a match was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum MatchResult {
    /// Decided over the board
    Win,
    Draw,
    /// Automatic win for the only player of a BYE match
    ByeWin,
    /// Awarded because the opponent was knocked out first
    ForfeitWin,
    /// A BYE whose recipient was knocked out before it counted
    EliminatedBye,
}

impl MatchResult {
    /// Results that carry a winner.
    pub fn is_decisive(self) -> bool {
        matches!(
            self,
            MatchResult::Win | MatchResult::ByeWin | MatchResult::ForfeitWin
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Draw => "draw",
            MatchResult::ByeWin => "bye-win",
            MatchResult::ForfeitWin => "forfeit-win",
            MatchResult::EliminatedBye => "eliminated-bye",
        }
    }
}

impl TryFrom<String> for MatchResult {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "win" => Ok(MatchResult::Win),
            "draw" => Ok(MatchResult::Draw),
            "bye-win" => Ok(MatchResult::ByeWin),
            "forfeit-win" => Ok(MatchResult::ForfeitWin),
            "eliminated-bye" => Ok(MatchResult::EliminatedBye),
            // Older exports spell a BYE as "<player id> wins (BYE)".
            other if other.ends_with("(BYE)") => Ok(MatchResult::ByeWin),
            other => Err(format!("unknown match result: {}", other)),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single board in a round. `player2_id == None` marks a BYE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,

    pub player1_id: PlayerId,

    #[serde(default)]
    pub player2_id: Option<PlayerId>,

    /// 1-based, unique within the round
    pub board_number: u32,

    #[serde(default)]
    pub result: Option<MatchResult>,

    #[serde(default)]
    pub winner_id: Option<PlayerId>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// `matches_played` already incremented for player 1
    #[serde(default)]
    pub player1_played: bool,

    /// `matches_played` already incremented for player 2
    #[serde(default)]
    pub player2_played: bool,
}

impl Match {
    /// A two-player match awaiting its result.
    pub fn paired(player1_id: PlayerId, player2_id: PlayerId, board_number: u32) -> Self {
        Self {
            id: EntityId::generate(),
            player1_id,
            player2_id: Some(player2_id),
            board_number,
            result: None,
            winner_id: None,
            start_time: Some(Utc::now()),
            end_time: None,
            player1_played: false,
            player2_played: false,
        }
    }

    /// A BYE board. Its win is applied by the ledger when the round is committed.
    pub fn bye(player_id: PlayerId, board_number: u32) -> Self {
        Self {
            id: EntityId::generate(),
            player1_id: player_id,
            player2_id: None,
            board_number,
            result: None,
            winner_id: None,
            start_time: Some(Utc::now()),
            end_time: None,
            player1_played: false,
            player2_played: false,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2_id.is_none()
    }

    /// A real match still waiting for its result. BYEs are never pending.
    pub fn is_pending(&self) -> bool {
        self.result.is_none() && !self.is_bye()
    }

    pub fn involves(&self, player_id: &PlayerId) -> bool {
        self.player1_id == *player_id || self.player2_id.as_ref() == Some(player_id)
    }

    /// The other side of the board, if `player_id` plays here and it is not a BYE.
    pub fn opponent_of(&self, player_id: &PlayerId) -> Option<&PlayerId> {
        if self.player1_id == *player_id {
            self.player2_id.as_ref()
        } else if self.player2_id.as_ref() == Some(player_id) {
            Some(&self.player1_id)
        } else {
            None
        }
    }

    /// Same two players, in either order.
    pub fn is_between(&self, a: &PlayerId, b: &PlayerId) -> bool {
        match &self.player2_id {
            Some(p2) => {
                (self.player1_id == *a && p2 == b) || (self.player1_id == *b && p2 == a)
            }
            None => false,
        }
    }
}

/// One round of play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// 1-based, equal to the round's position in the tournament
    pub round_number: u32,

    #[serde(default)]
    pub matches: Vec<Match>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Round {
    pub fn new(round_number: u32, matches: Vec<Match>) -> Self {
        Self {
            round_number,
            matches,
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }

    pub fn pending_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_pending()).count()
    }

    /// Every non-BYE match has a result.
    pub fn is_fully_recorded(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn next_board_number(&self) -> u32 {
        self.matches
            .iter()
            .map(|m| m.board_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn find_match(&self, match_id: &MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == *match_id)
    }

    pub fn includes_player(&self, player_id: &PlayerId) -> bool {
        self.matches.iter().any(|m| m.involves(player_id))
    }
}
