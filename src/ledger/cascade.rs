//! Cup-mode elimination cascade.

use tracing::{info, warn};

use super::{resolve_at, Resolution};
use crate::models::{MatchId, MatchResult, PlayerId, Tournament};

/// What knocking a player out touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    pub eliminated: PlayerId,
    /// Unresolved matches awarded to the opponent
    pub forfeits: Vec<MatchId>,
    /// Unresolved BYEs voided without a winner
    pub voided_byes: Vec<MatchId>,
}

/// Knock `loser` out and settle their other unresolved matches in the current round.
///
/// Runs to completion without failure points, so the cascade is never
/// half-applied.
pub fn eliminate(tournament: &mut Tournament, loser: &PlayerId) -> CascadeReport {
    let mut report = CascadeReport {
        eliminated: loser.clone(),
        forfeits: Vec::new(),
        voided_byes: Vec::new(),
    };

    match tournament.player_mut(loser) {
        Some(player) => {
            player.eliminated = true;
            info!("{} eliminated", player.name);
        }
        None => warn!("Eliminated player {} is not on the roster", loser),
    }

    let Some(round_idx) = tournament.rounds.len().checked_sub(1) else {
        return report;
    };

    let unresolved: Vec<usize> = tournament.rounds[round_idx]
        .matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.result.is_none() && m.involves(loser))
        .map(|(idx, _)| idx)
        .collect();

    for match_idx in unresolved {
        let m = &tournament.rounds[round_idx].matches[match_idx];
        let match_id = m.id.clone();

        match m.opponent_of(loser).cloned() {
            Some(opponent) => {
                resolve_at(
                    tournament,
                    round_idx,
                    match_idx,
                    &Resolution::win(MatchResult::ForfeitWin, opponent),
                );
                report.forfeits.push(match_id);
            }
            None => {
                resolve_at(
                    tournament,
                    round_idx,
                    match_idx,
                    &Resolution {
                        result: MatchResult::EliminatedBye,
                        winner: None,
                    },
                );
                report.voided_byes.push(match_id);
            }
        }
    }

    if !report.forfeits.is_empty() || !report.voided_byes.is_empty() {
        info!(
            "Cascade for {}: {} forfeit(s), {} voided BYE(s)",
            loser,
            report.forfeits.len(),
            report.voided_byes.len()
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{record_result, Outcome};
    use crate::models::{Match, Player, Round, Score, TournamentMode, TournamentStatus};

    fn cup_with(names: &[&str]) -> (Tournament, Vec<PlayerId>) {
        let mut t = Tournament::new("Cup".to_string(), TournamentMode::Cup, "3+2".to_string());
        let ids = names
            .iter()
            .map(|n| {
                let p = Player::new(n.to_string());
                let id = p.id.clone();
                t.players.push(p);
                id
            })
            .collect();
        t.status = TournamentStatus::Ongoing;
        (t, ids)
    }

    #[test]
    fn test_loss_forfeits_other_pending_match() {
        let (mut t, ids) = cup_with(&["A", "B", "C"]);
        let first = Match::paired(ids[0].clone(), ids[1].clone(), 1);
        let second = Match::paired(ids[1].clone(), ids[2].clone(), 2);
        let (first_id, second_id) = (first.id.clone(), second.id.clone());
        t.rounds.push(Round::new(1, vec![first, second]));
        let c_before = t.player(&ids[2]).unwrap().score;

        let report = record_result(&mut t, &first_id, Outcome::Winner(ids[0].clone())).unwrap();

        let cascade = report.cascade.unwrap();
        assert_eq!(cascade.forfeits, vec![second_id]);
        let c = t.player(&ids[2]).unwrap();
        assert_eq!(c.score.half_points(), c_before.half_points() + 2);
        assert_eq!(c.wins, 1);
        assert_eq!(t.rounds[0].matches[1].result, Some(MatchResult::ForfeitWin));
        assert_eq!(t.rounds[0].matches[1].winner_id, Some(ids[2].clone()));
        assert!(t.player(&ids[1]).unwrap().eliminated);
    }

    #[test]
    fn test_forfeit_counts_only_for_the_winner() {
        let (mut t, ids) = cup_with(&["A", "B", "C"]);
        let first = Match::paired(ids[0].clone(), ids[1].clone(), 1);
        let second = Match::paired(ids[1].clone(), ids[2].clone(), 2);
        let first_id = first.id.clone();
        t.rounds.push(Round::new(1, vec![first, second]));

        record_result(&mut t, &first_id, Outcome::Winner(ids[0].clone())).unwrap();

        let b = t.player(&ids[1]).unwrap();
        assert_eq!((b.wins, b.losses, b.matches_played), (0, 1, 1));
        let c = t.player(&ids[2]).unwrap();
        assert_eq!((c.wins, c.losses, c.matches_played), (1, 0, 1));
        assert!(c.past_opponents.is_empty());
        let forfeit = &t.rounds[0].matches[1];
        assert!(!forfeit.player1_played);
        assert!(forfeit.player2_played);
    }

    #[test]
    fn test_unresolved_bye_is_voided() {
        let (mut t, ids) = cup_with(&["A", "B"]);
        let bye = Match::bye(ids[1].clone(), 2);
        t.rounds.push(Round::new(
            1,
            vec![Match::paired(ids[0].clone(), ids[1].clone(), 1), bye],
        ));
        let match_id = t.rounds[0].matches[0].id.clone();

        let report = record_result(&mut t, &match_id, Outcome::Winner(ids[0].clone())).unwrap();

        let cascade = report.cascade.unwrap();
        assert_eq!(cascade.voided_byes.len(), 1);
        let voided = &t.rounds[0].matches[1];
        assert_eq!(voided.result, Some(MatchResult::EliminatedBye));
        assert_eq!(voided.winner_id, None);
        assert_eq!(t.player(&ids[1]).unwrap().score, Score::ZERO);
    }

    #[test]
    fn test_resolved_matches_are_left_alone() {
        let (mut t, ids) = cup_with(&["A", "B", "C"]);
        let mut settled = Match::paired(ids[1].clone(), ids[2].clone(), 2);
        settled.result = Some(MatchResult::Draw);
        t.rounds.push(Round::new(1, vec![settled.clone()]));

        let report = eliminate(&mut t, &ids[1]);

        assert!(report.forfeits.is_empty());
        assert_eq!(t.rounds[0].matches[0], settled);
    }
}
