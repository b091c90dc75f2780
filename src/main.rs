//! Command-line host for the court rotation engine, backed by a JSON state file.

use std::{io, path::PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use court_rotation::{
    config::AppConfig,
    dao::club_store::JsonFileStore,
    dto::{
        court::{CourtView, SeatView},
        player::PlayerView,
    },
    state::{
        AppState,
        club::{CourtId, PlayerId, Position, Rank, Slot, Team},
        commands::{Command, CommandOutcome},
    },
};

#[derive(Debug, Parser)]
#[command(name = "court-rotation", version, about = "Badminton court rotation")]
struct Cli {
    /// State file; overrides the configured location.
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    /// Print views as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List every player.
    Players,
    /// List players not seated on any court.
    Available,
    /// Show every court.
    Courts,
    /// Show finished games.
    History,
    /// Show whether the club can play, with history totals.
    Status,
    /// Register a player.
    AddPlayer {
        /// Display name.
        name: String,
        /// Beginner, Mid or Pro.
        rank: Rank,
    },
    /// Rename a player or change their rank.
    EditPlayer {
        /// Player name or id.
        player: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New rank.
        #[arg(long)]
        rank: Option<Rank>,
    },
    /// Remove a player.
    DeletePlayer {
        /// Player name or id.
        player: String,
    },
    /// Register a court.
    AddCourt {
        /// Display name.
        name: String,
    },
    /// Remove a court.
    DeleteCourt {
        /// Court name or id.
        court: String,
    },
    /// Seat a player, e.g. `assign "Court 1" Ana team1:0`.
    Assign {
        /// Court name or id.
        court: String,
        /// Player name or id.
        player: String,
        /// Slot as `team1:0`, `team1:1`, `team2:0` or `team2:1`.
        #[arg(value_parser = parse_slot)]
        slot: Slot,
    },
    /// Empty a slot.
    Unassign {
        /// Court name or id.
        court: String,
        /// Slot as `teamN:P`.
        #[arg(value_parser = parse_slot)]
        slot: Slot,
    },
    /// Replace the player on a slot with the best balancing free player.
    Change {
        /// Court name or id.
        court: String,
        /// Slot as `teamN:P`.
        #[arg(value_parser = parse_slot)]
        slot: Slot,
    },
    /// Start the game on a court.
    Start {
        /// Court name or id.
        court: String,
    },
    /// Pause the game on a court.
    Pause {
        /// Court name or id.
        court: String,
    },
    /// Resume the game on a court.
    Resume {
        /// Court name or id.
        court: String,
    },
    /// End the game on a court.
    End {
        /// Court name or id.
        court: String,
        /// Shuttlecocks to record instead of the running count.
        #[arg(long)]
        shuttlecocks: Option<u32>,
    },
    /// Count one more shuttlecock.
    ShuttleUp {
        /// Court name or id.
        court: String,
    },
    /// Take one shuttlecock back.
    ShuttleDown {
        /// Court name or id.
        court: String,
    },
    /// Seat the best balanced foursome on a court.
    AutoAssign {
        /// Court name or id.
        court: String,
    },
    /// Fill the empty slots of a court.
    AutoFill {
        /// Court name or id.
        court: String,
    },
    /// Clear game counters, sessions and history.
    ResetGames,
    /// Delete everything.
    HardReset {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if let Some(path) = cli.state {
        config = config.with_storage_path(path);
    }
    let store = JsonFileStore::new(config.storage_path(), config.storage_namespace());
    info!(path = %store.path().display(), "using state file");

    let mut state = AppState::new(config)
        .with_store(store)
        .context("loading club state")?;

    run(&mut state, cli.command, cli.json)
}

/// Configure tracing to write to stderr so stdout only carries results.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(state: &mut AppState, command: CliCommand, json: bool) -> anyhow::Result<()> {
    let command = match command {
        CliCommand::Players => return print_view(&state.player_views()[..], json, print_players),
        CliCommand::Available => {
            return print_view(&state.available_players()[..], json, print_players);
        }
        CliCommand::Courts => return print_view(&state.court_views()[..], json, print_courts),
        CliCommand::History => {
            return print_view(&state.history_entries()[..], json, |rows| {
                for row in rows {
                    println!(
                        "{} | {} | {} & {} vs {} & {} | {} | {} shuttlecocks",
                        row.ended_at,
                        row.court_name,
                        row.team1[0],
                        row.team1[1],
                        row.team2[0],
                        row.team2[1],
                        row.duration,
                        row.shuttlecock_count
                    );
                }
            });
        }
        CliCommand::Status => {
            let status = (state.readiness(), state.history_summary());
            return print_view(&status, json, |(readiness, summary)| {
                println!("{readiness:?}");
                println!(
                    "{} games played, {} shuttlecocks used",
                    summary.total_games, summary.total_shuttlecocks
                );
            });
        }
        CliCommand::AddPlayer { name, rank } => Command::AddPlayer { name, rank },
        CliCommand::EditPlayer { player, name, rank } => {
            let id = resolve_player(state, &player)?;
            let Some(mut record) = state.club().players.get(&id).cloned() else {
                bail!("player `{player}` not found");
            };
            if let Some(name) = name {
                record.name = name;
            }
            if let Some(rank) = rank {
                record.rank = rank;
            }
            Command::UpdatePlayer(record)
        }
        CliCommand::DeletePlayer { player } => {
            Command::DeletePlayer(resolve_player(state, &player)?)
        }
        CliCommand::AddCourt { name } => Command::AddCourt { name },
        CliCommand::DeleteCourt { court } => Command::DeleteCourt(resolve_court(state, &court)?),
        CliCommand::Assign {
            court,
            player,
            slot,
        } => Command::AssignPlayer {
            court_id: resolve_court(state, &court)?,
            player_id: resolve_player(state, &player)?,
            slot,
        },
        CliCommand::Unassign { court, slot } => Command::RemovePlayer {
            court_id: resolve_court(state, &court)?,
            slot,
        },
        CliCommand::Change { court, slot } => Command::ChangePlayer {
            court_id: resolve_court(state, &court)?,
            slot,
        },
        CliCommand::Start { court } => Command::StartSession(resolve_court(state, &court)?),
        CliCommand::Pause { court } => Command::PauseSession(resolve_court(state, &court)?),
        CliCommand::Resume { court } => Command::ResumeSession(resolve_court(state, &court)?),
        CliCommand::End {
            court,
            shuttlecocks,
        } => Command::EndSession {
            court_id: resolve_court(state, &court)?,
            shuttlecock_count: shuttlecocks,
        },
        CliCommand::ShuttleUp { court } => {
            Command::IncrementShuttlecock(resolve_court(state, &court)?)
        }
        CliCommand::ShuttleDown { court } => {
            Command::DecrementShuttlecock(resolve_court(state, &court)?)
        }
        CliCommand::AutoAssign { court } => Command::AutoAssign(resolve_court(state, &court)?),
        CliCommand::AutoFill { court } => Command::AutoFill(resolve_court(state, &court)?),
        CliCommand::ResetGames => Command::GameReset,
        CliCommand::HardReset { yes } => {
            if !yes {
                bail!("hard reset deletes every player, court and game; pass --yes to confirm");
            }
            Command::HardReset
        }
    };

    let label = command.label();
    let outcome = state
        .execute(command)
        .with_context(|| format!("{label} failed"))?;
    describe(state, &outcome);
    Ok(())
}

fn print_view<T: Serialize + ?Sized>(
    view: &T,
    json: bool,
    text: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        text(view);
    }
    Ok(())
}

fn print_players(rows: &[PlayerView]) {
    for row in rows {
        println!(
            "{} | {} | {} games | {}",
            row.name,
            row.rank,
            row.game_count,
            row.court_name.as_deref().unwrap_or("available")
        );
    }
}

fn seat_label(seat: &Option<SeatView>) -> String {
    match seat {
        Some(SeatView {
            name: Some(name),
            rank: Some(rank),
            ..
        }) => format!("{name} ({rank})"),
        Some(seat) => format!("unknown player {}", seat.player_id),
        None => "-".into(),
    }
}

fn print_courts(views: &[CourtView]) {
    for view in views {
        println!("{} [{:?}]", view.name, view.status);
        println!(
            "  team 1 ({}): {} / {}",
            view.team1_strength,
            seat_label(&view.team1[0]),
            seat_label(&view.team1[1])
        );
        println!(
            "  team 2 ({}): {} / {}",
            view.team2_strength,
            seat_label(&view.team2[0]),
            seat_label(&view.team2[1])
        );
        if let Some(elapsed) = &view.elapsed {
            println!(
                "  playing for {elapsed}, {} shuttlecocks",
                view.shuttlecock_count
            );
        }
    }
}

fn describe(state: &AppState, outcome: &CommandOutcome) {
    let name_of = |id: &PlayerId| {
        state
            .club()
            .players
            .get(id)
            .map_or_else(|| id.to_string(), |player| player.name.clone())
    };
    match outcome {
        CommandOutcome::Player(player) => {
            println!("{} ({}) [{}]", player.name, player.rank, player.id)
        }
        CommandOutcome::Court(court) => println!("{} [{}]", court.name, court.id),
        CommandOutcome::Lineup(lineup) => {
            let side = |team: &[Option<PlayerId>; 2]| {
                team.iter()
                    .map(|seat| seat.as_ref().map_or_else(|| "-".to_owned(), &name_of))
                    .collect::<Vec<_>>()
                    .join(" & ")
            };
            println!("{} vs {}", side(&lineup.team1), side(&lineup.team2));
        }
        CommandOutcome::Unseated(Some(id)) => println!("{} left the court", name_of(id)),
        CommandOutcome::Unseated(None) => println!("slot was already empty"),
        CommandOutcome::Substituted(id) => println!("{} joins the court", name_of(id)),
        CommandOutcome::History(record) => println!(
            "game on {} archived with {} shuttlecocks",
            record.court_name, record.shuttlecock_count
        ),
        CommandOutcome::Shuttlecocks(count) => println!("{count} shuttlecocks"),
        CommandOutcome::Done => println!("ok"),
    }
}

fn parse_slot(value: &str) -> Result<Slot, String> {
    let (team, position) = value
        .split_once(':')
        .ok_or_else(|| format!("expected `teamN:P`, got `{value}`"))?;
    let team = match team.trim().to_ascii_lowercase().as_str() {
        "team1" | "1" => Team::Team1,
        "team2" | "2" => Team::Team2,
        other => return Err(format!("unknown team `{other}`")),
    };
    let position = position
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(|index| Position::try_from(index).ok())
        .ok_or_else(|| format!("slot position must be 0 or 1, got `{position}`"))?;
    Ok(Slot::new(team, position))
}

/// Find a record by id, or by case-insensitive name when the name is unambiguous.
fn resolve<'a>(
    kind: &str,
    needle: &str,
    entries: impl Iterator<Item = (Uuid, &'a str)>,
) -> anyhow::Result<Uuid> {
    let entries: Vec<_> = entries.collect();
    if let Ok(id) = needle.parse::<Uuid>() {
        if entries.iter().any(|(candidate, _)| *candidate == id) {
            return Ok(id);
        }
    }
    let matches: Vec<_> = entries
        .iter()
        .filter(|(_, name)| name.eq_ignore_ascii_case(needle.trim()))
        .collect();
    match matches.as_slice() {
        [(id, _)] => Ok(*id),
        [] => bail!("no {kind} named `{needle}`"),
        _ => bail!("several {kind}s are named `{needle}`; use the id"),
    }
}

fn resolve_player(state: &AppState, needle: &str) -> anyhow::Result<PlayerId> {
    resolve(
        "player",
        needle,
        state.players().map(|player| (player.id, player.name.as_str())),
    )
}

fn resolve_court(state: &AppState, needle: &str) -> anyhow::Result<CourtId> {
    resolve(
        "court",
        needle,
        state.courts().map(|court| (court.id, court.name.as_str())),
    )
}
