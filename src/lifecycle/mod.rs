//! Lifecycle controller.
//!
//! [`TournamentDesk`] is the single entry point for mutating a tournament.
//! It gates each operation on the tournament's status
//! (`pending -> ongoing -> completed`), delegates to the pairing engine and
//! score ledger, and notifies its [`ChangeNotifier`] after every successful
//! change. The tournament itself is passed in by the caller; the desk keeps
//! no tournament state of its own.

mod roster;

pub use roster::*;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::{Result, TournamentError};
use crate::ledger::{self, Outcome, RecordReport};
use crate::models::{
    MatchId, PlayerId, StandingEntry, Tournament, TournamentMode, TournamentStatus,
};
use crate::notify::{ChangeNotifier, NoopNotifier};
use crate::pairing::{self, ManualPairReport, RoundReport, SwissOrdering};
use crate::ranking;

/// Settings for a new tournament.
#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub mode: TournamentMode,
    pub time_control: String,
    pub num_rounds: Option<u32>,
    pub is_team_tournament: bool,
}

/// Result of `start` / `end`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Tournament moved to ongoing and round 1 was drawn
    Started(RoundReport),
    /// Tournament completed with these final standings
    Ended(Vec<StandingEntry>),
    /// Already past this transition; nothing changed
    Unchanged(TournamentStatus),
}

/// Drives tournaments through their lifecycle.
pub struct TournamentDesk<N = NoopNotifier> {
    rng: StdRng,
    notifier: N,
}

impl TournamentDesk<NoopNotifier> {
    /// A desk with entropy-seeded shuffles and no notifications.
    pub fn new() -> Self {
        Self::with_notifier(NoopNotifier, None)
    }

    /// A desk whose shuffles replay identically for the same seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_notifier(NoopNotifier, Some(seed))
    }
}

impl Default for TournamentDesk<NoopNotifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ChangeNotifier> TournamentDesk<N> {
    pub fn with_notifier(notifier: N, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, notifier }
    }

    fn changed(&self, tournament: &Tournament) {
        self.notifier.notify_changed(tournament);
    }

    /// Validate settings and create a pending tournament.
    pub fn create_tournament(&self, settings: NewTournament) -> Result<Tournament> {
        let name = settings.name.trim();
        if name.is_empty() {
            return Err(TournamentError::validation("Tournament name cannot be empty"));
        }
        let time_control = settings.time_control.trim();
        if time_control.is_empty() {
            return Err(TournamentError::validation("Time control cannot be empty"));
        }
        if settings.num_rounds == Some(0) {
            return Err(TournamentError::validation(
                "Number of rounds must be a positive number or left unset",
            ));
        }

        let mut tournament =
            Tournament::new(name.to_string(), settings.mode, time_control.to_string());
        tournament.num_rounds = settings.num_rounds;
        tournament.is_team_tournament = settings.is_team_tournament;

        info!(
            "Created {} tournament '{}' ({})",
            tournament.mode, tournament.name, tournament.id
        );
        self.changed(&tournament);
        Ok(tournament)
    }

    /// Move a pending tournament to ongoing and draw round 1.
    ///
    /// Swiss opens with a random draw; round-robin and cup use their own method.
    pub fn start(&mut self, tournament: &mut Tournament) -> Result<Transition> {
        if tournament.status != TournamentStatus::Pending {
            info!("Tournament '{}' already {}", tournament.name, tournament.status);
            return Ok(Transition::Unchanged(tournament.status));
        }

        let active = tournament.active_players().count();
        if active < 2 {
            return Err(TournamentError::InsufficientParticipants {
                required: 2,
                found: active,
            });
        }
        if tournament.is_team_tournament && tournament.teams.len() < 2 {
            return Err(TournamentError::validation(
                "A team tournament needs at least two teams",
            ));
        }

        let plan = pairing::plan_round(tournament, SwissOrdering::Random, &mut self.rng)?;
        tournament.status = TournamentStatus::Ongoing;
        let report = pairing::commit_plan(tournament, plan);

        info!("Tournament '{}' started", tournament.name);
        self.changed(tournament);
        Ok(Transition::Started(report))
    }

    /// Draw the next round using the mode's standard method.
    pub fn generate_next_round(&mut self, tournament: &mut Tournament) -> Result<RoundReport> {
        self.generate_next_round_with(tournament, SwissOrdering::Points)
    }

    /// Draw the next round; `ordering` only affects swiss tournaments.
    pub fn generate_next_round_with(
        &mut self,
        tournament: &mut Tournament,
        ordering: SwissOrdering,
    ) -> Result<RoundReport> {
        let report = pairing::generate_round(tournament, ordering, &mut self.rng)?;
        if report.appended {
            self.changed(tournament);
        }
        Ok(report)
    }

    /// Record or correct a result in the current round.
    pub fn record_result(
        &mut self,
        tournament: &mut Tournament,
        match_id: &MatchId,
        outcome: Outcome,
    ) -> Result<RecordReport> {
        ensure_ongoing(tournament, "record a result")?;
        let report = ledger::record_result(tournament, match_id, outcome)?;
        self.changed(tournament);
        Ok(report)
    }

    /// Insert a manual pairing into the open round.
    pub fn add_manual_pair(
        &mut self,
        tournament: &mut Tournament,
        player1_id: &PlayerId,
        player2_id: &PlayerId,
    ) -> Result<ManualPairReport> {
        ensure_ongoing(tournament, "add a manual pairing")?;
        let report = pairing::add_manual_pair(tournament, player1_id, player2_id)?;
        self.changed(tournament);
        Ok(report)
    }

    /// Complete an ongoing tournament and freeze the final standings.
    pub fn end(&mut self, tournament: &mut Tournament) -> Result<Transition> {
        match tournament.status {
            TournamentStatus::Completed => {
                info!("Tournament '{}' already completed", tournament.name);
                return Ok(Transition::Unchanged(TournamentStatus::Completed));
            }
            TournamentStatus::Pending => {
                return Err(TournamentError::InvalidState {
                    action: "end the tournament",
                    status: TournamentStatus::Pending,
                });
            }
            TournamentStatus::Ongoing => {}
        }

        tournament.ensure_current_round_recorded()?;

        let now = Utc::now();
        if let Some(round) = tournament.current_round_mut() {
            if round.completed_at.is_none() {
                round.completed_at = Some(now);
            }
        }
        tournament.leaderboard = ranking::standings(&tournament.players);
        tournament.status = TournamentStatus::Completed;
        tournament.completed_at = Some(now);
        tournament.touch();

        info!(
            "Tournament '{}' completed after {} round(s)",
            tournament.name,
            tournament.rounds.len()
        );
        self.changed(tournament);
        Ok(Transition::Ended(tournament.leaderboard.clone()))
    }

    /// Current standings; the frozen leaderboard once completed.
    pub fn standings(&self, tournament: &Tournament) -> Vec<StandingEntry> {
        if tournament.status == TournamentStatus::Completed && !tournament.leaderboard.is_empty() {
            tournament.leaderboard.clone()
        } else {
            ranking::standings(&tournament.players)
        }
    }
}

fn ensure_ongoing(tournament: &Tournament, action: &'static str) -> Result<()> {
    if tournament.status != TournamentStatus::Ongoing {
        return Err(TournamentError::InvalidState {
            action,
            status: tournament.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchResult, Score};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::HashSet;

    fn settings(mode: TournamentMode) -> NewTournament {
        NewTournament {
            name: "Spring Open".to_string(),
            mode,
            time_control: "15+10".to_string(),
            num_rounds: None,
            is_team_tournament: false,
        }
    }

    fn field(desk: &mut TournamentDesk, mode: TournamentMode, count: usize) -> Tournament {
        let mut t = desk.create_tournament(settings(mode)).unwrap();
        for i in 0..count {
            desk.add_player(
                &mut t,
                PlayerDetails {
                    name: format!("Player {}", i + 1),
                    rating: Some(1500 + i as u32 * 10),
                    team_id: None,
                },
            )
            .unwrap();
        }
        t
    }

    /// Record every pending board of the current round as a win for player 1.
    fn record_round(desk: &mut TournamentDesk, t: &mut Tournament) {
        let pending: Vec<(MatchId, PlayerId)> = t
            .current_round()
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.is_pending())
            .map(|m| (m.id.clone(), m.player1_id.clone()))
            .collect();
        for (match_id, winner) in pending {
            desk.record_result(t, &match_id, Outcome::Winner(winner))
                .unwrap();
        }
    }

    fn pair_set(t: &Tournament, round_idx: usize) -> HashSet<(PlayerId, PlayerId)> {
        t.rounds[round_idx]
            .matches
            .iter()
            .filter_map(|m| {
                let p2 = m.player2_id.clone()?;
                let p1 = m.player1_id.clone();
                Some(if p1 < p2 { (p1, p2) } else { (p2, p1) })
            })
            .collect()
    }

    #[test]
    fn test_create_validates_settings() {
        let desk = TournamentDesk::with_seed(1);

        let mut blank = settings(TournamentMode::Swiss);
        blank.name = "  ".to_string();
        assert!(desk.create_tournament(blank).is_err());

        let mut no_clock = settings(TournamentMode::Swiss);
        no_clock.time_control = String::new();
        assert!(desk.create_tournament(no_clock).is_err());

        let mut zero_rounds = settings(TournamentMode::Swiss);
        zero_rounds.num_rounds = Some(0);
        assert!(desk.create_tournament(zero_rounds).is_err());

        let t = desk.create_tournament(settings(TournamentMode::Cup)).unwrap();
        assert_eq!(t.status, TournamentStatus::Pending);
        assert!(t.rounds.is_empty());
    }

    #[test]
    fn test_start_needs_two_players() {
        let mut desk = TournamentDesk::with_seed(2);
        let mut t = field(&mut desk, TournamentMode::Swiss, 1);

        let err = desk.start(&mut t).unwrap_err();
        assert_eq!(
            err,
            TournamentError::InsufficientParticipants {
                required: 2,
                found: 1
            }
        );
        assert_eq!(t.status, TournamentStatus::Pending);
    }

    #[test]
    fn test_team_start_needs_two_teams() {
        let mut desk = TournamentDesk::with_seed(2);
        let mut team_settings = settings(TournamentMode::Swiss);
        team_settings.is_team_tournament = true;
        let mut t = desk.create_tournament(team_settings).unwrap();
        let team = desk.add_team(&mut t, "Rooks").unwrap();
        for name in ["Ann", "Ben"] {
            desk.add_player(
                &mut t,
                PlayerDetails {
                    name: name.to_string(),
                    rating: None,
                    team_id: Some(team.clone()),
                },
            )
            .unwrap();
        }

        let err = desk.start(&mut t).unwrap_err();
        assert!(matches!(err, TournamentError::Validation(_)));
        assert_eq!(t.status, TournamentStatus::Pending);
        assert!(t.rounds.is_empty());
    }

    #[test]
    fn test_start_and_end_are_idempotent() {
        let mut desk = TournamentDesk::with_seed(3);
        let mut t = field(&mut desk, TournamentMode::Swiss, 2);

        assert!(matches!(desk.start(&mut t).unwrap(), Transition::Started(_)));
        assert_eq!(
            desk.start(&mut t).unwrap(),
            Transition::Unchanged(TournamentStatus::Ongoing)
        );
        assert_eq!(t.rounds.len(), 1);

        record_round(&mut desk, &mut t);
        assert!(matches!(desk.end(&mut t).unwrap(), Transition::Ended(_)));
        assert_eq!(
            desk.end(&mut t).unwrap(),
            Transition::Unchanged(TournamentStatus::Completed)
        );
        assert!(t.completed_at.is_some());
        assert!(t.rounds[0].completed_at.is_some());
    }

    #[test]
    fn test_operations_gated_on_status() {
        let mut desk = TournamentDesk::with_seed(4);
        let mut t = field(&mut desk, TournamentMode::Swiss, 2);

        assert!(matches!(
            desk.end(&mut t),
            Err(TournamentError::InvalidState { .. })
        ));
        assert!(matches!(
            desk.generate_next_round(&mut t),
            Err(TournamentError::InvalidState { .. })
        ));
        assert!(matches!(
            desk.record_result(&mut t, &MatchId::from("m"), Outcome::Draw),
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_end_requires_recorded_round() {
        let mut desk = TournamentDesk::with_seed(5);
        let mut t = field(&mut desk, TournamentMode::Swiss, 4);
        desk.start(&mut t).unwrap();

        let err = desk.end(&mut t).unwrap_err();
        assert!(matches!(err, TournamentError::IncompleteRound { round: 1, .. }));
        assert_eq!(t.status, TournamentStatus::Ongoing);
    }

    #[test]
    fn test_notifier_sees_each_change() {
        let calls = Cell::new(0);
        let mut desk = TournamentDesk::with_notifier(
            |_: &Tournament| calls.set(calls.get() + 1),
            Some(6),
        );
        let mut t = desk.create_tournament(settings(TournamentMode::Swiss)).unwrap();
        for name in ["A", "B"] {
            desk.add_player(
                &mut t,
                PlayerDetails {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        }
        desk.start(&mut t).unwrap();
        assert_eq!(calls.get(), 4);

        // Failed operations stay silent.
        assert!(desk.generate_next_round(&mut t).is_err());
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_swiss_five_players() {
        let mut desk = TournamentDesk::with_seed(42);
        let mut t = field(&mut desk, TournamentMode::Swiss, 5);

        let Transition::Started(first) = desk.start(&mut t).unwrap() else {
            panic!("tournament did not start");
        };
        assert_eq!(first.matches, 3);
        assert_eq!(first.byes.len(), 1);
        let full: Vec<_> = t.rounds[0].matches.iter().filter(|m| !m.is_bye()).collect();
        assert_eq!(full.len(), 2);
        let first_bye = first.byes[0].clone();
        assert_eq!(t.player(&first_bye).unwrap().score, Score::WIN);

        record_round(&mut desk, &mut t);
        let second = desk.generate_next_round(&mut t).unwrap();

        assert_eq!(second.round_number, 2);
        assert_eq!(second.byes.len(), 1);
        assert_ne!(second.byes[0], first_bye);
        let repeats: Vec<_> = pair_set(&t, 1).intersection(&pair_set(&t, 0)).cloned().collect();
        assert!(repeats.is_empty(), "rematches: {:?}", repeats);
    }

    #[test]
    fn test_round_robin_four_players_meet_once() {
        let mut desk = TournamentDesk::with_seed(7);
        let mut t = field(&mut desk, TournamentMode::RoundRobin, 4);
        desk.start(&mut t).unwrap();

        loop {
            record_round(&mut desk, &mut t);
            match desk.generate_next_round(&mut t) {
                Ok(_) => continue,
                Err(TournamentError::RoundLimitReached { limit }) => {
                    assert_eq!(limit, 3);
                    break;
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(t.rounds.len(), 3);
        let mut all = HashSet::new();
        for idx in 0..t.rounds.len() {
            for pair in pair_set(&t, idx) {
                assert!(all.insert(pair), "pair scheduled twice");
            }
        }
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_round_robin_odd_field_gives_one_bye_each() {
        let mut desk = TournamentDesk::with_seed(8);
        let mut t = field(&mut desk, TournamentMode::RoundRobin, 5);
        desk.start(&mut t).unwrap();
        for _ in 1..5 {
            record_round(&mut desk, &mut t);
            desk.generate_next_round(&mut t).unwrap();
        }

        assert_eq!(t.rounds.len(), 5);
        for player in &t.players {
            assert_eq!(t.bye_count(&player.id), 1, "{}", player.name);
        }
    }

    #[test]
    fn test_cup_eight_players_to_a_winner() {
        let mut desk = TournamentDesk::with_seed(9);
        let mut t = field(&mut desk, TournamentMode::Cup, 8);
        desk.start(&mut t).unwrap();

        let mut active_counts = vec![t.active_players().count()];
        loop {
            record_round(&mut desk, &mut t);
            active_counts.push(t.active_players().count());
            match desk.generate_next_round(&mut t) {
                Ok(_) => continue,
                Err(TournamentError::WinnerDecided { .. }) => break,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(active_counts, vec![8, 4, 2, 1]);
        let champion = t.active_players().next().unwrap().id.clone();

        let Transition::Ended(standings) = desk.end(&mut t).unwrap() else {
            panic!("tournament did not end");
        };
        assert_eq!(standings[0].player_id, champion);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(t.status, TournamentStatus::Completed);
        assert_eq!(desk.standings(&t), standings);
    }

    #[test]
    fn test_correcting_decisive_result_to_draw() {
        let mut desk = TournamentDesk::with_seed(10);
        let mut t = field(&mut desk, TournamentMode::Swiss, 2);
        desk.start(&mut t).unwrap();
        let m = t.rounds[0].matches[0].clone();
        let (winner, loser) = (m.player1_id.clone(), m.player2_id.clone().unwrap());
        desk.record_result(&mut t, &m.id, Outcome::Winner(winner.clone()))
            .unwrap();
        let w_before = t.player(&winner).unwrap().clone();
        let l_before = t.player(&loser).unwrap().clone();

        let report = desk.record_result(&mut t, &m.id, Outcome::Draw).unwrap();

        assert_eq!(report.result, MatchResult::Draw);
        let w = t.player(&winner).unwrap();
        let l = t.player(&loser).unwrap();
        assert_eq!(w.score.half_points(), w_before.score.half_points() - 1);
        assert_eq!(w.draws, w_before.draws + 1);
        assert_eq!(l.draws, l_before.draws + 1);
        assert_eq!(w.matches_played, w_before.matches_played);
        assert_eq!(l.matches_played, l_before.matches_played);
    }

    #[test]
    fn test_manual_pair_joins_recorded_round() {
        let mut desk = TournamentDesk::with_seed(11);
        let mut t = field(&mut desk, TournamentMode::Swiss, 3);
        let Transition::Started(first) = desk.start(&mut t).unwrap() else {
            panic!("tournament did not start");
        };
        record_round(&mut desk, &mut t);
        let bye = first.byes[0].clone();
        let other = t.players.iter().find(|p| p.id != bye).unwrap().id.clone();

        let report = desk.add_manual_pair(&mut t, &bye, &other).unwrap();

        assert!(!report.opened_round);
        assert_eq!(report.round_number, 1);
        assert_eq!(report.board_number, 3);
        assert!(report.warnings.is_empty());
        assert!(t.rounds[0].find_match(&report.match_id).unwrap().is_pending());
    }
}
