//! Single-tournament JSON documents for export and import.

use serde_json::Value;
use tracing::{info, warn};

use super::StorageError;
use crate::models::{EntityId, Tournament, TournamentId, TournamentStatus};
use crate::ranking;

/// Keys an imported document cannot do without.
const REQUIRED_KEYS: [&str; 5] = ["id", "name", "mode", "players", "rounds"];

/// Serialize a tournament as a pretty-printed, self-contained document.
pub fn export_json(tournament: &Tournament) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(tournament)?)
}

/// Parse an exported document.
///
/// Optional fields fall back to their defaults. A completed tournament whose
/// stored leaderboard is missing or unreadable gets it rebuilt from its
/// players. A tournament whose id is already in `existing_ids` gets a fresh id.
pub fn import_json(json: &str, existing_ids: &[TournamentId]) -> Result<Tournament, StorageError> {
    let value: Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
        return Err(StorageError::InvalidDocument(
            "expected a JSON object".to_string(),
        ));
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(StorageError::InvalidDocument(format!(
            "missing {}",
            missing.join(", ")
        )));
    }
    for key in ["players", "rounds"] {
        if !object[key].is_array() {
            return Err(StorageError::InvalidDocument(format!(
                "'{}' must be a list",
                key
            )));
        }
    }

    let mut tournament: Tournament = serde_json::from_value(value)?;

    if tournament.status == TournamentStatus::Completed && tournament.leaderboard.is_empty() {
        tournament.leaderboard = ranking::standings(&tournament.players);
    }

    if existing_ids.contains(&tournament.id) {
        let fresh = EntityId::generate();
        warn!(
            "Imported tournament id {} already exists; using {}",
            tournament.id, fresh
        );
        tournament.id = fresh;
    }

    info!(
        "Imported '{}' ({} players, {} rounds)",
        tournament.name,
        tournament.players.len(),
        tournament.rounds.len()
    );
    Ok(tournament)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchResult, Player, PlayerId, Seat, TournamentMode};
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"{
        "id": "t-1",
        "name": "Legacy Open",
        "mode": "swiss",
        "status": "ongoing",
        "players": [
            {"id": "p-1", "name": "Ada", "score": 1},
            {"id": "p-2", "name": "Bo", "score": 1.5}
        ],
        "rounds": [
            {
                "roundNumber": 1,
                "matches": [
                    {"id": "m-1", "player1Id": "p-1", "player2Id": null,
                     "boardNumber": 1, "result": "p-1 wins (BYE)", "winnerId": "p-1"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_export_then_import_preserves_tournament() {
        let mut t = Tournament::new("Round Trip".to_string(), TournamentMode::Cup, "3+2".to_string());
        t.players.push(Player::new("Ada".to_string()));

        let json = export_json(&t).unwrap();
        assert!(json.contains("\"createdAt\""));

        let imported = import_json(&json, &[]).unwrap();
        assert_eq!(imported, t);
    }

    #[test]
    fn test_import_fills_defaults() {
        let t = import_json(MINIMAL, &[]).unwrap();

        assert_eq!(t.status, TournamentStatus::Ongoing);
        assert!(t.teams.is_empty());
        assert!(t.leaderboard.is_empty());
        assert_eq!(t.time_control, "");
        let ada = &t.players[0];
        assert!(ada.past_opponents.is_empty());
        assert_eq!(ada.score.half_points(), 2);
        assert_eq!(t.players[1].score.half_points(), 3);
        assert_eq!(t.rounds[0].matches[0].result, Some(MatchResult::ByeWin));
    }

    #[test]
    fn test_import_replaces_colliding_id() {
        let taken = vec![TournamentId::from("t-1")];

        let t = import_json(MINIMAL, &taken).unwrap();

        assert_ne!(t.id, taken[0]);
        assert_eq!(t.name, "Legacy Open");
    }

    #[test]
    fn test_import_rebuilds_player_shaped_leaderboard() {
        let json = r#"{
            "id": "t-2",
            "name": "Closed Cup",
            "mode": "cup",
            "status": "completed",
            "players": [
                {"id": "p-1", "name": "Ada", "score": 1, "wins": 1},
                {"id": "p-2", "name": "Bo", "score": 0, "losses": 1}
            ],
            "rounds": [],
            "leaderboard": [
                {"id": "p-1", "name": "Ada", "score": 1, "wins": 1},
                {"id": "p-2", "name": "Bo", "score": 0, "losses": 1}
            ]
        }"#;

        let t = import_json(json, &[]).unwrap();

        assert_eq!(t.leaderboard.len(), 2);
        assert_eq!(t.leaderboard[0].rank, 1);
        assert_eq!(t.leaderboard[0].player_id, PlayerId::from("p-1"));
        assert_eq!(t.leaderboard[0].wins, 1);
        assert_eq!(t.leaderboard[1].player_id, PlayerId::from("p-2"));
    }

    #[test]
    fn test_import_reads_player_shaped_seating() {
        let json = r#"{
            "id": "t-3",
            "name": "Odd Robin",
            "mode": "round-robin",
            "players": [
                {"id": "p-1", "name": "Ada"},
                {"id": "p-2", "name": "Bo"},
                {"id": "p-3", "name": "Cy"}
            ],
            "rounds": [],
            "rrPlayersOrder": [
                {"id": "p-1", "name": "Ada", "score": 0},
                {"id": "p-2", "name": "Bo", "score": 0},
                {"id": "p-3", "name": "Cy", "score": 0},
                {"id": "BYE_PLAYER", "name": "BYE", "isByeDummy": true}
            ]
        }"#;

        let t = import_json(json, &[]).unwrap();

        assert_eq!(
            t.rr_players_order,
            Some(vec![
                Seat::Player(PlayerId::from("p-1")),
                Seat::Player(PlayerId::from("p-2")),
                Seat::Player(PlayerId::from("p-3")),
                Seat::Bye,
            ])
        );

        let reimported = import_json(&export_json(&t).unwrap(), &[]).unwrap();
        assert_eq!(reimported.rr_players_order, t.rr_players_order);
    }

    #[test]
    fn test_import_rejects_missing_required_fields() {
        let err = import_json(r#"{"id": "x", "name": "No Mode", "players": []}"#, &[]).unwrap_err();
        match err {
            StorageError::InvalidDocument(msg) => assert_eq!(msg, "missing mode, rounds"),
            other => panic!("unexpected error: {}", other),
        }

        let err = import_json(
            r#"{"id": "x", "name": "n", "mode": "cup", "players": {}, "rounds": []}"#,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument(_)));

        assert!(matches!(
            import_json("[1, 2]", &[]),
            Err(StorageError::InvalidDocument(_))
        ));
        assert!(matches!(import_json("{", &[]), Err(StorageError::Json(_))));
    }
}
