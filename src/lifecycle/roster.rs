//! Team and player management.

use tracing::info;

use super::TournamentDesk;
use crate::error::{EntityKind, Result, TournamentError};
use crate::models::{same_name, Player, PlayerId, Seat, Team, TeamId, Tournament};
use crate::notify::ChangeNotifier;

/// Fields for adding or editing a player.
#[derive(Debug, Clone, Default)]
pub struct PlayerDetails {
    pub name: String,
    pub rating: Option<u32>,
    pub team_id: Option<TeamId>,
}

impl<N: ChangeNotifier> TournamentDesk<N> {
    pub fn add_team(&mut self, tournament: &mut Tournament, name: &str) -> Result<TeamId> {
        ensure_roster_open(tournament)?;
        ensure_team_tournament(tournament)?;
        let name = validate_team_name(tournament, name, None)?;

        let team = Team::new(name);
        let id = team.id.clone();
        info!("Team '{}' added to '{}'", team.name, tournament.name);
        tournament.teams.push(team);
        tournament.touch();
        self.changed(tournament);
        Ok(id)
    }

    /// Rename a team and refresh the cached team name on its players.
    pub fn rename_team(
        &mut self,
        tournament: &mut Tournament,
        team_id: &TeamId,
        name: &str,
    ) -> Result<()> {
        ensure_roster_open(tournament)?;
        ensure_team_tournament(tournament)?;
        let name = validate_team_name(tournament, name, Some(team_id))?;

        let team = tournament
            .teams
            .iter_mut()
            .find(|t| t.id == *team_id)
            .ok_or_else(|| TournamentError::not_found(EntityKind::Team, team_id))?;
        team.name = name.clone();

        for player in tournament
            .players
            .iter_mut()
            .filter(|p| p.team_id.as_ref() == Some(team_id))
        {
            player.team_name = Some(name.clone());
        }

        tournament.touch();
        self.changed(tournament);
        Ok(())
    }

    /// Delete a team nobody plays for.
    pub fn remove_team(&mut self, tournament: &mut Tournament, team_id: &TeamId) -> Result<()> {
        ensure_roster_open(tournament)?;
        let idx = tournament
            .teams
            .iter()
            .position(|t| t.id == *team_id)
            .ok_or_else(|| TournamentError::not_found(EntityKind::Team, team_id))?;

        let members = tournament
            .players
            .iter()
            .filter(|p| p.team_id.as_ref() == Some(team_id))
            .count();
        if members > 0 {
            return Err(TournamentError::validation(format!(
                "Cannot delete team '{}': {} player(s) assigned",
                tournament.teams[idx].name, members
            )));
        }

        let team = tournament.teams.remove(idx);
        info!("Team '{}' removed from '{}'", team.name, tournament.name);
        tournament.touch();
        self.changed(tournament);
        Ok(())
    }

    pub fn add_player(
        &mut self,
        tournament: &mut Tournament,
        details: PlayerDetails,
    ) -> Result<PlayerId> {
        ensure_roster_open(tournament)?;
        let name = validate_player_name(tournament, &details.name, None)?;
        let team = resolve_team(tournament, details.team_id.as_ref())?;

        let mut player = Player::new(name);
        player.rating = details.rating;
        if let Some(team) = team {
            player = player.with_team(&team);
        }

        let id = player.id.clone();
        info!("Player '{}' added to '{}'", player.name, tournament.name);
        tournament.players.push(player);
        tournament.touch();
        self.changed(tournament);
        Ok(id)
    }

    /// Change a player's name, rating and team. The record is untouched.
    pub fn edit_player(
        &mut self,
        tournament: &mut Tournament,
        player_id: &PlayerId,
        details: PlayerDetails,
    ) -> Result<()> {
        ensure_roster_open(tournament)?;
        tournament.require_player(player_id)?;
        let name = validate_player_name(tournament, &details.name, Some(player_id))?;
        let team = resolve_team(tournament, details.team_id.as_ref())?;

        if let Some(player) = tournament.player_mut(player_id) {
            player.name = name;
            player.rating = details.rating;
            player.team_id = team.as_ref().map(|t| t.id.clone());
            player.team_name = team.map(|t| t.name);
        }

        tournament.touch();
        self.changed(tournament);
        Ok(())
    }

    /// Remove a player who has not appeared in any match.
    pub fn remove_player(&mut self, tournament: &mut Tournament, player_id: &PlayerId) -> Result<()> {
        ensure_roster_open(tournament)?;
        let idx = tournament
            .players
            .iter()
            .position(|p| p.id == *player_id)
            .ok_or_else(|| TournamentError::not_found(EntityKind::Player, player_id))?;

        if tournament.has_any_match(player_id) {
            return Err(TournamentError::validation(format!(
                "Cannot delete '{}': they have already been paired",
                tournament.players[idx].name
            )));
        }

        let player = tournament.players.remove(idx);
        if let Some(seating) = tournament.rr_players_order.as_mut() {
            seating.retain(|seat| *seat != Seat::Player(player.id.clone()));
        }
        info!("Player '{}' removed from '{}'", player.name, tournament.name);
        tournament.touch();
        self.changed(tournament);
        Ok(())
    }
}

fn ensure_roster_open(tournament: &Tournament) -> Result<()> {
    if !tournament.is_active() {
        return Err(TournamentError::InvalidState {
            action: "change the roster",
            status: tournament.status,
        });
    }
    Ok(())
}

fn ensure_team_tournament(tournament: &Tournament) -> Result<()> {
    if !tournament.is_team_tournament {
        return Err(TournamentError::validation(
            "Teams are only available in team tournaments",
        ));
    }
    Ok(())
}

fn validate_team_name(
    tournament: &Tournament,
    name: &str,
    editing: Option<&TeamId>,
) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::validation("Team name cannot be empty"));
    }
    let taken = tournament
        .teams
        .iter()
        .any(|t| Some(&t.id) != editing && same_name(&t.name, name));
    if taken {
        return Err(TournamentError::validation(format!(
            "A team named '{}' already exists",
            name
        )));
    }
    Ok(name.to_string())
}

fn validate_player_name(
    tournament: &Tournament,
    name: &str,
    editing: Option<&PlayerId>,
) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::validation("Player name cannot be empty"));
    }
    let taken = tournament
        .players
        .iter()
        .any(|p| Some(&p.id) != editing && same_name(&p.name, name));
    if taken {
        return Err(TournamentError::validation(format!(
            "A player named '{}' already exists",
            name
        )));
    }
    Ok(name.to_string())
}

/// Look up the requested team; team affiliation is ignored outside team tournaments.
fn resolve_team(tournament: &Tournament, team_id: Option<&TeamId>) -> Result<Option<Team>> {
    match team_id {
        Some(id) if tournament.is_team_tournament => tournament
            .team(id)
            .cloned()
            .map(Some)
            .ok_or_else(|| TournamentError::not_found(EntityKind::Team, id)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::NewTournament;
    use crate::models::{TournamentMode, TournamentStatus};

    fn setup(teams: bool) -> (TournamentDesk, Tournament) {
        let desk = TournamentDesk::with_seed(7);
        let t = desk
            .create_tournament(NewTournament {
                name: "Club Night".to_string(),
                mode: TournamentMode::Swiss,
                time_control: "10+0".to_string(),
                num_rounds: None,
                is_team_tournament: teams,
            })
            .unwrap();
        (desk, t)
    }

    fn details(name: &str) -> PlayerDetails {
        PlayerDetails {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_player_names_unique_case_insensitive() {
        let (mut desk, mut t) = setup(false);
        desk.add_player(&mut t, details("Magnus")).unwrap();

        let err = desk.add_player(&mut t, details("  magnus ")).unwrap_err();
        assert!(matches!(err, TournamentError::Validation(_)));
        assert!(desk.add_player(&mut t, details("   ")).is_err());
        assert_eq!(t.players.len(), 1);
    }

    #[test]
    fn test_edit_player_keeps_own_name_and_record() {
        let (mut desk, mut t) = setup(false);
        let id = desk.add_player(&mut t, details("Judit")).unwrap();
        desk.add_player(&mut t, details("Hou")).unwrap();
        t.players[0].wins = 3;

        desk.edit_player(
            &mut t,
            &id,
            PlayerDetails {
                name: "JUDIT".to_string(),
                rating: Some(2700),
                team_id: None,
            },
        )
        .unwrap();
        let p = t.player(&id).unwrap();
        assert_eq!(p.name, "JUDIT");
        assert_eq!(p.rating, Some(2700));
        assert_eq!(p.wins, 3);

        assert!(desk.edit_player(&mut t, &id, details("hou")).is_err());
    }

    #[test]
    fn test_team_lifecycle() {
        let (mut desk, mut t) = setup(true);
        let red = desk.add_team(&mut t, "Red").unwrap();
        assert!(desk.add_team(&mut t, "RED").is_err());

        let player = desk
            .add_player(
                &mut t,
                PlayerDetails {
                    name: "Ann".to_string(),
                    rating: None,
                    team_id: Some(red.clone()),
                },
            )
            .unwrap();
        assert_eq!(t.player(&player).unwrap().team_name.as_deref(), Some("Red"));

        desk.rename_team(&mut t, &red, "Crimson").unwrap();
        assert_eq!(
            t.player(&player).unwrap().team_name.as_deref(),
            Some("Crimson")
        );

        assert!(desk.remove_team(&mut t, &red).is_err());
        desk.remove_player(&mut t, &player).unwrap();
        desk.remove_team(&mut t, &red).unwrap();
        assert!(t.teams.is_empty());
    }

    #[test]
    fn test_teams_require_team_tournament() {
        let (mut desk, mut t) = setup(false);
        assert!(desk.add_team(&mut t, "Red").is_err());
    }

    #[test]
    fn test_unknown_team_is_not_found() {
        let (mut desk, mut t) = setup(true);
        let err = desk
            .add_player(
                &mut t,
                PlayerDetails {
                    name: "Ann".to_string(),
                    rating: None,
                    team_id: Some(TeamId::from("nope")),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TournamentError::NotFound {
                kind: EntityKind::Team,
                ..
            }
        ));
    }

    #[test]
    fn test_paired_player_cannot_be_removed() {
        let (mut desk, mut t) = setup(false);
        let a = desk.add_player(&mut t, details("A")).unwrap();
        desk.add_player(&mut t, details("B")).unwrap();
        desk.start(&mut t).unwrap();

        assert!(desk.remove_player(&mut t, &a).is_err());
        // Late entries are still allowed while ongoing.
        assert!(desk.add_player(&mut t, details("C")).is_ok());
    }

    #[test]
    fn test_removed_player_leaves_seating() {
        let (mut desk, mut t) = setup(false);
        let a = desk.add_player(&mut t, details("A")).unwrap();
        let b = desk.add_player(&mut t, details("B")).unwrap();
        t.rr_players_order = Some(vec![
            Seat::Player(a.clone()),
            Seat::Player(b.clone()),
            Seat::Bye,
        ]);

        desk.remove_player(&mut t, &b).unwrap();

        assert_eq!(t.rr_players_order, Some(vec![Seat::Player(a), Seat::Bye]));
        assert_eq!(t.players.len(), 1);
    }

    #[test]
    fn test_completed_roster_is_frozen() {
        let (mut desk, mut t) = setup(false);
        t.status = TournamentStatus::Completed;

        let err = desk.add_player(&mut t, details("Late")).unwrap_err();
        assert!(matches!(err, TournamentError::InvalidState { .. }));
    }
}
