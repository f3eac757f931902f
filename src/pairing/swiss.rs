//! Swiss-style pairing: random or points ordering, then greedy no-rematch pairing.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use tracing::debug;

use super::{require_participants, PairingWarning, RoundPlan, SwissOrdering};
use crate::error::Result;
use crate::models::{Player, Tournament};
use crate::ranking;

pub(super) fn pair<R: Rng>(
    tournament: &Tournament,
    round_number: u32,
    ordering: SwissOrdering,
    rng: &mut R,
) -> Result<RoundPlan> {
    let mut candidates: Vec<&Player> = tournament.active_players().collect();
    require_participants(candidates.len())?;

    match ordering {
        SwissOrdering::Random => candidates.shuffle(rng),
        SwissOrdering::Points => candidates.sort_by(|a, b| ranking::compare(a, b)),
    }

    let mut plan = RoundPlan::new(round_number);

    if candidates.len() % 2 == 1 {
        let bye_idx = select_bye(tournament, &candidates);
        let bye_player = candidates.remove(bye_idx);
        debug!("BYE for {} in round {}", bye_player.name, round_number);
        plan.push_bye(bye_player.id.clone());
    }

    let mut queue: VecDeque<&Player> = candidates.into();
    while let Some(top) = queue.pop_front() {
        let opponent = queue.iter().position(|candidate| {
            !top.has_played(&candidate.id)
                && !(tournament.is_team_tournament && top.shares_team_with(candidate))
        });

        match opponent.and_then(|idx| queue.remove(idx)) {
            Some(opponent) => plan.push_pair(top.id.clone(), opponent.id.clone()),
            None => plan.warnings.push(PairingWarning::Unpaired {
                player_id: top.id.clone(),
                name: top.name.clone(),
            }),
        }
    }

    Ok(plan)
}

/// Index of the BYE recipient: fewest BYEs so far, then lowest score.
/// Earlier candidates win remaining ties.
fn select_bye(tournament: &Tournament, candidates: &[&Player]) -> usize {
    let mut best = 0;
    let mut best_key = (tournament.bye_count(&candidates[0].id), candidates[0].score);

    for (idx, player) in candidates.iter().enumerate().skip(1) {
        let key = (tournament.bye_count(&player.id), player.score);
        if key < best_key {
            best = idx;
            best_key = key;
        }
    }

    best
}
