//! Score ledger: applies and corrects match results.
//!
//! Every match remembers the resolution last applied to it (`result` +
//! `winner_id`). Recording a new resolution applies only the difference
//! between the old and new effect on each player's counters, so results can
//! be corrected any number of times without drift:
//!
//! - draw: +0.5 and one draw for each side
//! - decisive (win, bye-win): +1 and a win for the winner, a loss for the loser
//! - forfeit-win: +1 and a win for the winner only; the eliminated side is
//!   untouched
//! - eliminated-bye: no effect
//!
//! `matches_played` is bumped at most once per side per match, guarded by the
//! match's `player1_played` / `player2_played` flags. A forfeit only counts
//! for the winner.

mod cascade;

pub use cascade::*;

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{EntityKind, Result, TournamentError};
use crate::models::{Match, MatchId, MatchResult, Player, PlayerId, Tournament, TournamentMode};

/// The result a caller reports for a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Draw,
    Winner(PlayerId),
}

/// A match resolution as stored on the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub result: MatchResult,
    pub winner: Option<PlayerId>,
}

impl Resolution {
    pub fn draw() -> Self {
        Self {
            result: MatchResult::Draw,
            winner: None,
        }
    }

    pub fn win(result: MatchResult, winner: PlayerId) -> Self {
        Self {
            result,
            winner: Some(winner),
        }
    }

    /// The resolution currently applied to a match, if any.
    pub fn of(m: &Match) -> Option<Self> {
        m.result.map(|result| Self {
            result,
            winner: m.winner_id.clone(),
        })
    }
}

/// Signed change to one player's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub half_points: i32,
    pub wins: i32,
    pub losses: i32,
    pub draws: i32,
}

impl StatDelta {
    pub fn is_zero(&self) -> bool {
        *self == StatDelta::default()
    }

    fn add(&mut self, other: StatDelta, sign: i32) {
        self.half_points += sign * other.half_points;
        self.wins += sign * other.wins;
        self.losses += sign * other.losses;
        self.draws += sign * other.draws;
    }

    /// Apply to a player, flooring every counter at zero.
    pub fn apply_to(&self, player: &mut Player) {
        player.score = player.score.shifted(self.half_points);
        player.wins = player.wins.saturating_add_signed(self.wins);
        player.losses = player.losses.saturating_add_signed(self.losses);
        player.draws = player.draws.saturating_add_signed(self.draws);
    }
}

const DRAW_EFFECT: StatDelta = StatDelta {
    half_points: 1,
    wins: 0,
    losses: 0,
    draws: 1,
};

const WIN_EFFECT: StatDelta = StatDelta {
    half_points: 2,
    wins: 1,
    losses: 0,
    draws: 0,
};

const LOSS_EFFECT: StatDelta = StatDelta {
    half_points: 0,
    wins: 0,
    losses: 1,
    draws: 0,
};

/// Counter effect of a resolution on the players of `m`.
pub fn effect_of(resolution: &Resolution, m: &Match) -> Vec<(PlayerId, StatDelta)> {
    let sides = std::iter::once(&m.player1_id).chain(m.player2_id.as_ref());

    match (resolution.result, &resolution.winner) {
        (MatchResult::Draw, _) => sides.map(|id| (id.clone(), DRAW_EFFECT)).collect(),
        (MatchResult::EliminatedBye, _) => Vec::new(),
        (MatchResult::ForfeitWin, Some(winner)) => vec![(winner.clone(), WIN_EFFECT)],
        (_, Some(winner)) => sides
            .map(|id| {
                let effect = if id == winner { WIN_EFFECT } else { LOSS_EFFECT };
                (id.clone(), effect)
            })
            .collect(),
        (_, None) => Vec::new(),
    }
}

/// Net per-player change when a match moves from `old` to `new`.
pub fn transition_delta(
    old: Option<&Resolution>,
    new: &Resolution,
    m: &Match,
) -> BTreeMap<PlayerId, StatDelta> {
    let mut net: BTreeMap<PlayerId, StatDelta> = BTreeMap::new();

    if let Some(old) = old {
        for (id, effect) in effect_of(old, m) {
            net.entry(id).or_default().add(effect, -1);
        }
    }
    for (id, effect) in effect_of(new, m) {
        net.entry(id).or_default().add(effect, 1);
    }

    net.retain(|_, delta| !delta.is_zero());
    net
}

/// What a single `record_result` call changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub match_id: MatchId,
    pub board_number: u32,
    pub result: MatchResult,
    pub winner: Option<PlayerId>,
    /// The previous resolution, when this call was a correction
    pub replaced: Option<Resolution>,
    /// Cup mode: what the knockout of the loser touched
    pub cascade: Option<CascadeReport>,
    /// Cup mode: a previous loser put back into contention by a correction
    pub reinstated: Option<PlayerId>,
}

/// Record (or correct) the result of a match in the current round.
///
/// Validates everything before touching state. In cup mode a decisive result
/// knocks the loser out and runs the elimination cascade as part of the same
/// call.
pub fn record_result(
    tournament: &mut Tournament,
    match_id: &MatchId,
    outcome: Outcome,
) -> Result<RecordReport> {
    let round_idx = tournament
        .rounds
        .len()
        .checked_sub(1)
        .ok_or(TournamentError::NoRound)?;
    let match_idx = tournament.rounds[round_idx]
        .matches
        .iter()
        .position(|m| m.id == *match_id)
        .ok_or_else(|| TournamentError::not_found(EntityKind::Match, match_id))?;

    let m = &tournament.rounds[round_idx].matches[match_idx];
    let Some(player2_id) = m.player2_id.clone() else {
        return Err(TournamentError::validation(format!(
            "Board #{} is a BYE; its result is fixed",
            m.board_number
        )));
    };

    let resolution = match outcome {
        Outcome::Draw => Resolution::draw(),
        Outcome::Winner(winner) => {
            if winner != m.player1_id && winner != player2_id {
                return Err(TournamentError::validation(format!(
                    "Winner {} does not play on board #{}",
                    winner, m.board_number
                )));
            }
            Resolution::win(MatchResult::Win, winner)
        }
    };

    let board_number = m.board_number;
    let previous = Resolution::of(m);
    let previous_loser = previous.as_ref().and_then(|r| loser_of(r, m));
    let loser = loser_of(&resolution, m);

    resolve_at(tournament, round_idx, match_idx, &resolution);
    info!(
        "Recorded {} on board #{} of round {}",
        resolution.result,
        board_number,
        round_idx + 1
    );

    let mut report = RecordReport {
        match_id: match_id.clone(),
        board_number,
        result: resolution.result,
        winner: resolution.winner.clone(),
        replaced: previous,
        cascade: None,
        reinstated: None,
    };

    if tournament.mode == TournamentMode::Cup {
        if let Some(prev) = previous_loser.filter(|p| Some(p) != loser.as_ref()) {
            if let Some(player) = tournament.player_mut(&prev) {
                player.eliminated = false;
                debug!("Reinstated {} after result correction", player.name);
            }
            report.reinstated = Some(prev);
        }
        if let Some(loser) = loser {
            report.cascade = Some(eliminate(tournament, &loser));
        }
    }

    tournament.touch();
    Ok(report)
}

/// The losing side of a decisive resolution on a two-player board.
fn loser_of(resolution: &Resolution, m: &Match) -> Option<PlayerId> {
    let winner = resolution.winner.as_ref()?;
    m.opponent_of(winner).cloned()
}

/// Move the match at (`round_idx`, `match_idx`) to `resolution`, updating
/// both players' counters by the net difference.
pub(crate) fn resolve_at(
    tournament: &mut Tournament,
    round_idx: usize,
    match_idx: usize,
    resolution: &Resolution,
) {
    let snapshot = tournament.rounds[round_idx].matches[match_idx].clone();
    let previous = Resolution::of(&snapshot);

    for (player_id, delta) in transition_delta(previous.as_ref(), resolution, &snapshot) {
        if let Some(player) = tournament.player_mut(&player_id) {
            delta.apply_to(player);
        }
    }

    if resolution.result == MatchResult::Win || resolution.result == MatchResult::Draw {
        if let Some(p2) = &snapshot.player2_id {
            if let Some(player) = tournament.player_mut(&snapshot.player1_id) {
                player.remember_opponent(p2);
            }
            if let Some(player) = tournament.player_mut(p2) {
                player.remember_opponent(&snapshot.player1_id);
            }
        }
    }

    let counts_for = |id: &PlayerId| match resolution.result {
        MatchResult::EliminatedBye => false,
        MatchResult::ForfeitWin => resolution.winner.as_ref() == Some(id),
        _ => true,
    };
    let mut count_p1 = false;
    let mut count_p2 = false;
    {
        let m = &mut tournament.rounds[round_idx].matches[match_idx];
        m.result = Some(resolution.result);
        m.winner_id = resolution.winner.clone();
        m.end_time = Some(Utc::now());

        if !m.player1_played && counts_for(&m.player1_id) {
            m.player1_played = true;
            count_p1 = true;
        }
        if let Some(p2) = &m.player2_id {
            if !m.player2_played && counts_for(p2) {
                m.player2_played = true;
                count_p2 = true;
            }
        }
    }

    if count_p1 {
        if let Some(player) = tournament.player_mut(&snapshot.player1_id) {
            player.matches_played += 1;
        }
    }
    if count_p2 {
        if let Some(player) = snapshot.player2_id.as_ref().and_then(|id| tournament.player_mut(id)) {
            player.matches_played += 1;
        }
    }
}

/// Award the BYE on a freshly committed board.
pub(crate) fn award_bye(tournament: &mut Tournament, round_idx: usize, match_idx: usize) {
    let player_id = tournament.rounds[round_idx].matches[match_idx]
        .player1_id
        .clone();
    resolve_at(
        tournament,
        round_idx,
        match_idx,
        &Resolution::win(MatchResult::ByeWin, player_id),
    );
}
