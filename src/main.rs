use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tourney_desk::config::AppConfig;
use tourney_desk::ledger::Outcome;
use tourney_desk::lifecycle::{NewTournament, PlayerDetails, TournamentDesk, Transition};
use tourney_desk::models::{
    same_name, PlayerId, StandingEntry, TeamId, Tournament, TournamentMode, TournamentStatus,
};
use tourney_desk::notify::TracingNotifier;
use tourney_desk::pairing::{PairingWarning, RoundReport, SwissOrdering};
use tourney_desk::storage::{export_json, import_json, JsonlStore, TournamentStore};

#[derive(Parser)]
#[command(name = "tourney-desk")]
#[command(about = "Swiss, round-robin and cup tournament manager")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./tourney-desk.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    /// Pending or ongoing
    Active,
    Completed,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new tournament
    Create {
        name: String,

        /// swiss, round-robin or cup
        #[arg(long, default_value = "swiss")]
        mode: TournamentMode,

        /// Time control, e.g. "10+0" (default from config)
        #[arg(long)]
        time_control: Option<String>,

        /// Fixed number of rounds (default from config, unlimited if unset)
        #[arg(long)]
        rounds: Option<u32>,

        /// Players compete for teams
        #[arg(long)]
        teams: bool,
    },

    /// List tournaments
    List {
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
    },

    /// Show roster and rounds
    Show { tournament: String },

    /// Delete a tournament
    Delete { tournament: String },

    /// Add a team to a team tournament
    AddTeam { tournament: String, name: String },

    /// Rename a team
    RenameTeam {
        tournament: String,
        team: String,
        name: String,
    },

    /// Remove a team with no players
    RemoveTeam { tournament: String, team: String },

    /// Register a player
    AddPlayer {
        tournament: String,
        name: String,

        #[arg(long)]
        rating: Option<u32>,

        /// Team name or id
        #[arg(long)]
        team: Option<String>,
    },

    /// Change a player's name, rating or team
    EditPlayer {
        tournament: String,
        player: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        rating: Option<u32>,

        /// Team name or id
        #[arg(long)]
        team: Option<String>,
    },

    /// Remove a player who has not been paired yet
    RemovePlayer { tournament: String, player: String },

    /// Start the tournament and draw round 1
    Start { tournament: String },

    /// Draw the next round
    NextRound {
        tournament: String,

        /// Swiss ordering: random or points
        #[arg(long)]
        method: Option<SwissOrdering>,
    },

    /// Pair two players manually in the open round
    Pair {
        tournament: String,
        player1: String,
        player2: String,
    },

    /// Record a result on a board of the current round
    Record {
        tournament: String,

        #[arg(long)]
        board: u32,

        /// Winner name or id
        #[arg(long, conflicts_with = "draw", required_unless_present = "draw")]
        winner: Option<String>,

        #[arg(long)]
        draw: bool,
    },

    /// Complete the tournament
    End { tournament: String },

    /// Print current standings
    Standings { tournament: String },

    /// Write a tournament to a JSON document
    Export {
        tournament: String,

        /// Output file (default: <data_dir>/exports/<id>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Read a tournament from a JSON document
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::debug!("Starting tourney-desk v{}", env!("CARGO_PKG_VERSION"));

    let storage = config.storage();
    let mut store = JsonlStore::new(&storage);
    let mut desk = TournamentDesk::with_notifier(TracingNotifier, config.pairing.seed);

    match cli.command {
        Commands::Create {
            name,
            mode,
            time_control,
            rounds,
            teams,
        } => {
            let t = desk.create_tournament(NewTournament {
                name,
                mode,
                time_control: time_control.unwrap_or_else(|| config.defaults.time_control.clone()),
                num_rounds: rounds.or(config.defaults.num_rounds),
                is_team_tournament: teams,
            })?;
            store.save(&t)?;
            println!("Created {} tournament '{}' ({})", t.mode, t.name, t.id);
        }
        Commands::List { status } => {
            let tournaments = store.list_where(|t| match status {
                None => true,
                Some(StatusFilter::Active) => t.is_active(),
                Some(StatusFilter::Completed) => t.status == TournamentStatus::Completed,
            })?;
            if tournaments.is_empty() {
                println!("No tournaments found.");
            }
            for t in &tournaments {
                println!(
                    "{}  {:<30} {:<12} {:<10} {:>3} players  {:>2} rounds",
                    t.id,
                    t.name,
                    t.mode.to_string(),
                    t.status.to_string(),
                    t.players.len(),
                    t.rounds.len()
                );
            }
        }
        Commands::Show { tournament } => {
            let t = find_tournament(&store, &tournament)?;
            print_tournament(&t);
        }
        Commands::Delete { tournament } => {
            let t = find_tournament(&store, &tournament)?;
            store.delete(&t.id)?;
            println!("Deleted '{}'", t.name);
        }
        Commands::AddTeam { tournament, name } => {
            let mut t = find_tournament(&store, &tournament)?;
            let id = desk.add_team(&mut t, &name)?;
            store.save(&t)?;
            println!("Added team '{}' ({})", name.trim(), id);
        }
        Commands::RenameTeam {
            tournament,
            team,
            name,
        } => {
            let mut t = find_tournament(&store, &tournament)?;
            let team_id = find_team(&t, &team)?;
            desk.rename_team(&mut t, &team_id, &name)?;
            store.save(&t)?;
            println!("Renamed team to '{}'", name.trim());
        }
        Commands::RemoveTeam { tournament, team } => {
            let mut t = find_tournament(&store, &tournament)?;
            let team_id = find_team(&t, &team)?;
            desk.remove_team(&mut t, &team_id)?;
            store.save(&t)?;
            println!("Removed team '{}'", team);
        }
        Commands::AddPlayer {
            tournament,
            name,
            rating,
            team,
        } => {
            let mut t = find_tournament(&store, &tournament)?;
            let team_id = team.as_deref().map(|key| find_team(&t, key)).transpose()?;
            let id = desk.add_player(
                &mut t,
                PlayerDetails {
                    name,
                    rating,
                    team_id,
                },
            )?;
            store.save(&t)?;
            if let Some(p) = t.player(&id) {
                println!("Added player '{}' ({})", p.name, p.id);
            }
        }
        Commands::EditPlayer {
            tournament,
            player,
            name,
            rating,
            team,
        } => {
            let mut t = find_tournament(&store, &tournament)?;
            let player_id = find_player(&t, &player)?;
            let current = t.require_player(&player_id)?.clone();
            let team_id = match team {
                Some(key) => Some(find_team(&t, &key)?),
                None => current.team_id.clone(),
            };
            desk.edit_player(
                &mut t,
                &player_id,
                PlayerDetails {
                    name: name.unwrap_or(current.name),
                    rating: rating.or(current.rating),
                    team_id,
                },
            )?;
            store.save(&t)?;
            println!("Updated player {}", player_id);
        }
        Commands::RemovePlayer { tournament, player } => {
            let mut t = find_tournament(&store, &tournament)?;
            let player_id = find_player(&t, &player)?;
            desk.remove_player(&mut t, &player_id)?;
            store.save(&t)?;
            println!("Removed player {}", player_id);
        }
        Commands::Start { tournament } => {
            let mut t = find_tournament(&store, &tournament)?;
            match desk.start(&mut t)? {
                Transition::Started(report) => {
                    store.save(&t)?;
                    println!("Started '{}'", t.name);
                    print_round_report(&t, &report);
                }
                Transition::Unchanged(status) => println!("'{}' is already {}", t.name, status),
                Transition::Ended(_) => {}
            }
        }
        Commands::NextRound { tournament, method } => {
            let mut t = find_tournament(&store, &tournament)?;
            let report = match method {
                Some(ordering) => desk.generate_next_round_with(&mut t, ordering)?,
                None => desk.generate_next_round(&mut t)?,
            };
            store.save(&t)?;
            print_round_report(&t, &report);
        }
        Commands::Pair {
            tournament,
            player1,
            player2,
        } => {
            let mut t = find_tournament(&store, &tournament)?;
            let p1 = find_player(&t, &player1)?;
            let p2 = find_player(&t, &player2)?;
            let report = desk.add_manual_pair(&mut t, &p1, &p2)?;
            store.save(&t)?;
            println!(
                "Paired on board #{} of round {}",
                report.board_number, report.round_number
            );
            print_warnings(&report.warnings);
        }
        Commands::Record {
            tournament,
            board,
            winner,
            draw,
        } => {
            let mut t = find_tournament(&store, &tournament)?;
            let match_id = t
                .current_round()
                .and_then(|r| r.matches.iter().find(|m| m.board_number == board))
                .map(|m| m.id.clone())
                .with_context(|| format!("No board #{} in the current round", board))?;
            let outcome = match (winner, draw) {
                (_, true) => Outcome::Draw,
                (Some(key), false) => Outcome::Winner(find_player(&t, &key)?),
                (None, false) => bail!("Give either --winner or --draw"),
            };
            let report = desk.record_result(&mut t, &match_id, outcome)?;
            store.save(&t)?;

            let winner_name = report
                .winner
                .as_ref()
                .and_then(|id| t.player(id))
                .map(|p| p.name.as_str());
            match winner_name {
                Some(name) => println!("Board #{}: {} wins", report.board_number, name),
                None => println!("Board #{}: draw", report.board_number),
            }
            if let Some(cascade) = &report.cascade {
                println!("  {} eliminated", player_name(&t, &cascade.eliminated));
                if !cascade.forfeits.is_empty() {
                    println!("  {} pending match(es) awarded by forfeit", cascade.forfeits.len());
                }
            }
            if let Some(reinstated) = &report.reinstated {
                println!("  {} reinstated", player_name(&t, reinstated));
            }
        }
        Commands::End { tournament } => {
            let mut t = find_tournament(&store, &tournament)?;
            match desk.end(&mut t)? {
                Transition::Ended(standings) => {
                    store.save(&t)?;
                    println!("'{}' completed. Final standings:", t.name);
                    print_standings(&standings);
                }
                Transition::Unchanged(status) => println!("'{}' is already {}", t.name, status),
                Transition::Started(_) => {}
            }
        }
        Commands::Standings { tournament } => {
            let t = find_tournament(&store, &tournament)?;
            print_standings(&desk.standings(&t));
        }
        Commands::Export { tournament, output } => {
            let t = find_tournament(&store, &tournament)?;
            let path =
                output.unwrap_or_else(|| storage.exports_dir().join(format!("{}.json", t.id)));
            write_document(&path, &export_json(&t)?)?;
            println!("Exported '{}' to {:?}", t.name, path);
        }
        Commands::Import { path } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let t = import_json(&json, &store.ids()?)?;
            store.save(&t)?;
            println!("Imported '{}' ({})", t.name, t.id);
        }
    }

    Ok(())
}

/// Look a tournament up by id, then by case-insensitive name.
fn find_tournament(store: &JsonlStore, key: &str) -> Result<Tournament> {
    let all = store.list()?;
    if let Some(t) = all.iter().find(|t| t.id.as_str() == key) {
        return Ok(t.clone());
    }
    let mut named: Vec<Tournament> = all.into_iter().filter(|t| same_name(&t.name, key)).collect();
    match named.len() {
        0 => bail!("No tournament matches '{}'", key),
        1 => Ok(named.remove(0)),
        n => bail!("{} tournaments are named '{}'; use the id", n, key),
    }
}

fn find_player(t: &Tournament, key: &str) -> Result<PlayerId> {
    t.players
        .iter()
        .find(|p| p.id.as_str() == key || same_name(&p.name, key))
        .map(|p| p.id.clone())
        .with_context(|| format!("No player matches '{}'", key))
}

fn find_team(t: &Tournament, key: &str) -> Result<TeamId> {
    t.teams
        .iter()
        .find(|team| team.id.as_str() == key || same_name(&team.name, key))
        .map(|team| team.id.clone())
        .with_context(|| format!("No team matches '{}'", key))
}

fn write_document(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))
}

fn player_name(t: &Tournament, id: &PlayerId) -> String {
    t.player(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn print_warnings(warnings: &[PairingWarning]) {
    for warning in warnings {
        println!("  warning: {}", warning);
    }
}

fn print_round_report(t: &Tournament, report: &RoundReport) {
    if !report.appended {
        println!("No matches could be generated for round {}", report.round_number);
        print_warnings(&report.warnings);
        return;
    }
    println!("Round {}:", report.round_number);
    if let Some(round) = t.rounds.last() {
        for m in &round.matches {
            match &m.player2_id {
                Some(p2) => println!(
                    "  #{:<3} {} vs {}",
                    m.board_number,
                    player_name(t, &m.player1_id),
                    player_name(t, p2)
                ),
                None => println!("  #{:<3} {} (BYE)", m.board_number, player_name(t, &m.player1_id)),
            }
        }
    }
    print_warnings(&report.warnings);
}

fn print_standings(standings: &[StandingEntry]) {
    for entry in standings {
        let team = entry
            .team_name
            .as_deref()
            .map(|name| format!("  [{}]", name))
            .unwrap_or_default();
        println!(
            "{:>3}. {:<24} {:>5}  +{} ={} -{}{}",
            entry.rank,
            entry.name,
            entry.score.to_string(),
            entry.wins,
            entry.draws,
            entry.losses,
            team
        );
    }
}

fn print_tournament(t: &Tournament) {
    println!("{} ({})", t.name, t.id);
    println!(
        "  mode: {}  status: {}  time control: {}  rounds: {}",
        t.mode,
        t.status,
        t.time_control,
        t.num_rounds
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    if !t.teams.is_empty() {
        let names: Vec<&str> = t.teams.iter().map(|team| team.name.as_str()).collect();
        println!("  teams: {}", names.join(", "));
    }

    println!("Players:");
    for p in &t.players {
        let status = if p.eliminated { "  (eliminated)" } else { "" };
        let rating = p.rating.map(|r| format!(" [{}]", r)).unwrap_or_default();
        println!("  {}{}  {} pts{}", p.name, rating, p.score, status);
    }

    for round in &t.rounds {
        println!("Round {}:", round.round_number);
        for m in &round.matches {
            let result = match (&m.result, &m.winner_id) {
                (Some(result), Some(winner)) => format!("{} ({})", player_name(t, winner), result),
                (Some(result), None) => result.to_string(),
                (None, _) => "pending".to_string(),
            };
            let pairing = match &m.player2_id {
                Some(p2) => format!("{} vs {}", player_name(t, &m.player1_id), player_name(t, p2)),
                None => format!("{} (BYE)", player_name(t, &m.player1_id)),
            };
            println!("  #{:<3} {:<40} {}", m.board_number, pairing, result);
        }
    }
}
