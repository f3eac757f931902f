//! Round-robin pairing by the circle method.
//!
//! The seating is fixed when the first round is drawn (padded with a BYE
//! seat for odd fields) and stored on the tournament. Seat 0 never moves.
//! The stored order is always the seating for the *next* round: after each
//! round the last rotating seat moves to the front of the rotating seats.
//! With `n` seats this gives `n - 1` rounds in which every pair of seats
//! meets exactly once.

use std::collections::HashSet;

use super::{require_participants, PairingWarning, RoundPlan};
use crate::error::{Result, TournamentError};
use crate::models::{Player, PlayerId, Seat, Tournament};

pub(super) fn pair(tournament: &Tournament, round_number: u32) -> Result<RoundPlan> {
    let active: Vec<&Player> = tournament.active_players().collect();

    let seating = match &tournament.rr_players_order {
        Some(seating) => seating.clone(),
        None => {
            require_participants(active.len())?;
            initial_seating(&active)
        }
    };

    let total_rounds = seating.len().saturating_sub(1) as u32;
    if round_number > total_rounds {
        return Err(TournamentError::RoundLimitReached {
            limit: total_rounds,
        });
    }

    let mut plan = RoundPlan::new(round_number);

    let scheduled: HashSet<&PlayerId> = seating
        .iter()
        .filter_map(|seat| match seat {
            Seat::Player(id) => Some(id),
            Seat::Bye => None,
        })
        .collect();
    for player in active.iter().filter(|p| !scheduled.contains(&p.id)) {
        plan.warnings.push(PairingWarning::UnscheduledPlayer {
            player_id: player.id.clone(),
            name: player.name.clone(),
        });
    }

    let fixed = &seating[0];
    let rotating = &seating[1..];

    seat_pairing(tournament, &mut plan, fixed, &rotating[0]);
    for i in 1..=rotating.len() / 2 {
        seat_pairing(tournament, &mut plan, &rotating[i], &rotating[rotating.len() - i]);
    }

    plan.next_seating = Some(advance(&seating));
    Ok(plan)
}

/// Active players in roster order, plus a BYE seat when the count is odd.
fn initial_seating(active: &[&Player]) -> Vec<Seat> {
    let mut seating: Vec<Seat> = active.iter().map(|p| Seat::Player(p.id.clone())).collect();
    if seating.len() % 2 == 1 {
        seating.push(Seat::Bye);
    }
    seating
}

/// Rotate every seat but the first one step: the last rotating seat moves to the front.
fn advance(seating: &[Seat]) -> Vec<Seat> {
    let mut next = seating.to_vec();
    if next.len() > 2 {
        next[1..].rotate_right(1);
    }
    next
}

/// Seat of a player still on the roster, or `None` for the BYE seat.
fn occupant<'a>(tournament: &'a Tournament, seat: &Seat) -> Option<&'a Player> {
    match seat {
        Seat::Player(id) => tournament.player(id),
        Seat::Bye => None,
    }
}

fn seat_pairing(tournament: &Tournament, plan: &mut RoundPlan, a: &Seat, b: &Seat) {
    match (occupant(tournament, a), occupant(tournament, b)) {
        (Some(p1), Some(p2)) => {
            if tournament.is_team_tournament && p1.shares_team_with(p2) {
                plan.warnings.push(PairingWarning::SameTeam {
                    player1: p1.name.clone(),
                    player2: p2.name.clone(),
                });
            }
            plan.push_pair(p1.id.clone(), p2.id.clone());
        }
        (Some(p), None) | (None, Some(p)) => plan.push_bye(p.id.clone()),
        (None, None) => {}
    }
}
