//! Single-elimination bracket pairing.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{require_participants, PairingWarning, RoundPlan};
use crate::error::{Result, TournamentError};
use crate::models::{Player, Tournament};

pub(super) fn pair<R: Rng>(
    tournament: &Tournament,
    round_number: u32,
    rng: &mut R,
) -> Result<RoundPlan> {
    let mut remaining: Vec<&Player> = tournament.active_players().collect();

    if let [winner] = remaining.as_slice() {
        return Err(TournamentError::WinnerDecided {
            winner: winner.id.clone(),
        });
    }
    require_participants(remaining.len())?;

    remaining.shuffle(rng);
    let mut plan = RoundPlan::new(round_number);

    if remaining.len() % 2 == 1 {
        // Highest scorer sits out; ties go to whoever the shuffle put first.
        let top_score = remaining.iter().map(|p| p.score).max().unwrap_or_default();
        let bye_idx = remaining
            .iter()
            .position(|p| p.score == top_score)
            .unwrap_or(0);
        let bye_player = remaining.remove(bye_idx);
        plan.push_bye(bye_player.id.clone());
    }

    for pair in remaining.chunks_exact(2) {
        let (p1, p2) = (pair[0], pair[1]);
        if tournament.is_team_tournament && p1.shares_team_with(p2) {
            plan.warnings.push(PairingWarning::SameTeam {
                player1: p1.name.clone(),
                player2: p2.name.clone(),
            });
        }
        plan.push_pair(p1.id.clone(), p2.id.clone());
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Score, TournamentMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn cup(count: usize) -> Tournament {
        let mut t = Tournament::new("Cup".to_string(), TournamentMode::Cup, "3+0".to_string());
        for i in 0..count {
            t.players.push(Player::new(format!("P{}", i + 1)));
        }
        t
    }

    #[test]
    fn test_even_field_pairs_everyone_once() {
        let t = cup(8);
        let mut rng = StdRng::seed_from_u64(9);

        let plan = pair(&t, 1, &mut rng).unwrap();

        assert_eq!(plan.matches.len(), 4);
        let mut seen = HashSet::new();
        for m in &plan.matches {
            assert!(seen.insert(m.player1_id.clone()));
            assert!(seen.insert(m.player2_id.clone().unwrap()));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_odd_field_bye_goes_to_top_scorer() {
        let mut t = cup(5);
        t.players[3].score = Score::from_half_points(4);
        let leader = t.players[3].id.clone();
        let mut rng = StdRng::seed_from_u64(10);

        let plan = pair(&t, 2, &mut rng).unwrap();

        let byes: Vec<_> = plan.matches.iter().filter(|m| m.is_bye()).collect();
        assert_eq!(byes.len(), 1);
        assert_eq!(byes[0].player1_id, leader);
        assert_eq!(plan.matches.len(), 3);
    }

    #[test]
    fn test_eliminated_players_sit_out() {
        let mut t = cup(4);
        t.players[0].eliminated = true;
        t.players[1].eliminated = true;
        let mut rng = StdRng::seed_from_u64(11);

        let plan = pair(&t, 2, &mut rng).unwrap();

        assert_eq!(plan.matches.len(), 1);
        assert!(!plan.matches[0].involves(&t.players[0].id));
    }

    #[test]
    fn test_single_survivor_is_the_winner() {
        let mut t = cup(3);
        t.players[0].eliminated = true;
        t.players[2].eliminated = true;
        let mut rng = StdRng::seed_from_u64(12);

        let err = pair(&t, 3, &mut rng).unwrap_err();
        assert_eq!(
            err,
            TournamentError::WinnerDecided {
                winner: t.players[1].id.clone()
            }
        );
    }
}
