//! Manual pairing: insert a single match into the open round.

use tracing::info;

use super::PairingWarning;
use crate::error::{Result, TournamentError};
use crate::models::{Match, MatchId, PlayerId, Round, Tournament};

/// Outcome of a manual pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualPairReport {
    pub match_id: MatchId,
    pub round_number: u32,
    pub board_number: u32,
    /// True when no round was open and one had to be started
    pub opened_round: bool,
    pub warnings: Vec<PairingWarning>,
}

/// Pair two idle players on the next free board of the open round.
///
/// A repeat pairing is allowed but reported. In team tournaments teammates
/// are refused. If no round is open a new one is started, subject to the
/// round limit.
pub fn add_manual_pair(
    tournament: &mut Tournament,
    player1_id: &PlayerId,
    player2_id: &PlayerId,
) -> Result<ManualPairReport> {
    if player1_id == player2_id {
        return Err(TournamentError::validation(
            "A player cannot be paired with themselves",
        ));
    }

    let p1 = tournament.require_player(player1_id)?;
    let p2 = tournament.require_player(player2_id)?;

    if let Some(out) = [p1, p2].into_iter().find(|p| p.eliminated) {
        return Err(TournamentError::validation(format!(
            "{} has been eliminated",
            out.name
        )));
    }
    if tournament.is_team_tournament && p1.shares_team_with(p2) {
        return Err(TournamentError::validation(format!(
            "{} and {} are on the same team",
            p1.name, p2.name
        )));
    }

    let mut warnings = Vec::new();
    if p1.has_played(player2_id) {
        warnings.push(PairingWarning::Rematch {
            player1: p1.name.clone(),
            player2: p2.name.clone(),
        });
    }
    let (name1, name2) = (p1.name.clone(), p2.name.clone());

    let open_round = tournament.current_round().filter(|r| r.is_open());
    let opened_round = open_round.is_none();

    match open_round {
        Some(round) => {
            let busy = round.matches.iter().any(|m| {
                m.is_between(player1_id, player2_id)
                    || (m.is_pending() && (m.involves(player1_id) || m.involves(player2_id)))
            });
            if busy {
                return Err(TournamentError::validation(
                    "One or both players already have an unrecorded match in this round",
                ));
            }
        }
        None => {
            if let Some(limit) = tournament.num_rounds {
                if tournament.rounds.len() >= limit as usize {
                    return Err(TournamentError::RoundLimitReached { limit });
                }
            }
        }
    }

    if opened_round {
        let round_number = tournament.rounds.len() as u32 + 1;
        tournament.rounds.push(Round::new(round_number, Vec::new()));
    }

    let round_idx = tournament.rounds.len() - 1;
    let round = &mut tournament.rounds[round_idx];
    let board_number = round.next_board_number();
    let m = Match::paired(player1_id.clone(), player2_id.clone(), board_number);
    let match_id = m.id.clone();
    round.matches.push(m);
    let round_number = round.round_number;

    tournament.touch();
    info!(
        "Manual pair added: {} vs {} on board #{} of round {}",
        name1, name2, board_number, round_number
    );

    Ok(ManualPairReport {
        match_id,
        round_number,
        board_number,
        opened_round,
        warnings,
    })
}
