//! Engine state and the facade hosts talk to.

/// Time sources.
pub mod clock;
/// Domain model.
pub mod club;
/// Command and outcome types.
pub mod commands;
/// Per-court lifecycle phases.
pub mod session_machine;

use rand::{RngCore, SeedableRng, rngs::StdRng};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::{club_store::ClubStore, models::ClubEntity},
    dto::{
        court::{CourtView, Readiness},
        history::{HistoryEntryView, HistorySummary},
        player::PlayerView,
        roster::{CourtInput, PlayerInput},
    },
    error::ServiceError,
    services::{
        assignment_service, query_service, reset_service, roster_service, session_service,
    },
};

use self::{
    clock::{Clock, SystemClock},
    club::{
        ClubState, Court, CourtId, CourtSession, HistoryRecord, Lineup, Player, PlayerId, Rank,
        Slot,
    },
    commands::{Command, CommandOutcome},
};

/// Inputs a command may need besides the state itself.
struct CommandContext<'a> {
    now: OffsetDateTime,
    pool_size: usize,
    rng: &'a mut dyn RngCore,
}

/// The engine: owns the club state and runs every command against it.
///
/// Commands work on a copy of the state. The copy replaces the current state, and is saved to
/// the store when one is installed, only if the whole command succeeded.
pub struct AppState {
    club: ClubState,
    config: AppConfig,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
    store: Option<Box<dyn ClubStore>>,
}

impl AppState {
    /// Engine with an empty club, the system clock and an OS-seeded random source.
    pub fn new(config: AppConfig) -> Self {
        Self {
            club: ClubState::default(),
            config,
            clock: Box::new(SystemClock),
            rng: Box::new(StdRng::from_os_rng()),
            store: None,
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the random source used to break auto-assign ties.
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Install a store, loading whatever it holds. Every later command is saved to it.
    pub fn with_store(mut self, store: impl ClubStore + 'static) -> Result<Self, ServiceError> {
        if let Some(entity) = store.load()? {
            self.club = ClubState::try_from(entity)?;
            info!(
                players = self.club.players.len(),
                courts = self.club.courts.len(),
                sessions = self.club.sessions.len(),
                history = self.club.history.len(),
                "club state loaded"
            );
        } else {
            info!("no saved club state; starting empty");
        }
        self.store = Some(Box::new(store));
        Ok(self)
    }

    /// Current state.
    pub fn club(&self) -> &ClubState {
        &self.club
    }

    /// Configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current time according to the engine clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    fn run_command<T, F>(&mut self, label: &'static str, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut ClubState, CommandContext<'_>) -> Result<T, ServiceError>,
    {
        let mut scratch = self.club.clone();
        let context = CommandContext {
            now: self.clock.now(),
            pool_size: self.config.candidate_pool_size(),
            rng: self.rng.as_mut(),
        };

        let value = match work(&mut scratch, context) {
            Ok(value) => value,
            Err(err) => {
                warn!(command = label, error = %err, "command rejected");
                return Err(err);
            }
        };

        if scratch == self.club {
            debug!(command = label, "command left the state unchanged");
            return Ok(value);
        }

        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save(&ClubEntity::from(&scratch)) {
                warn!(
                    command = label,
                    error = %err,
                    "failed to save club state; command discarded"
                );
                return Err(err.into());
            }
        }

        self.club = scratch;
        debug!(command = label, "command applied");
        Ok(value)
    }

    /// Run any command.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, ServiceError> {
        match command {
            Command::AddPlayer { name, rank } => {
                self.add_player(&name, rank).map(CommandOutcome::Player)
            }
            Command::UpdatePlayer(player) => self.update_player(player).map(|updated| {
                updated.map_or(CommandOutcome::Done, CommandOutcome::Player)
            }),
            Command::DeletePlayer(id) => self.delete_player(id).map(CommandOutcome::Player),
            Command::AddCourt { name } => self.add_court(&name).map(CommandOutcome::Court),
            Command::DeleteCourt(id) => self.delete_court(id).map(CommandOutcome::Court),
            Command::AssignPlayer {
                court_id,
                player_id,
                slot,
            } => self
                .assign_player(court_id, player_id, slot)
                .map(CommandOutcome::Lineup),
            Command::RemovePlayer { court_id, slot } => self
                .remove_player(court_id, slot)
                .map(CommandOutcome::Unseated),
            Command::ChangePlayer { court_id, slot } => self
                .change_player(court_id, slot)
                .map(CommandOutcome::Substituted),
            Command::StartSession(court_id) => {
                self.start_session(court_id).map(|()| CommandOutcome::Done)
            }
            Command::PauseSession(court_id) => {
                self.pause_session(court_id).map(|()| CommandOutcome::Done)
            }
            Command::ResumeSession(court_id) => {
                self.resume_session(court_id).map(|()| CommandOutcome::Done)
            }
            Command::EndSession {
                court_id,
                shuttlecock_count,
            } => self
                .end_session(court_id, shuttlecock_count)
                .map(CommandOutcome::History),
            Command::IncrementShuttlecock(court_id) => self
                .increment_shuttlecock(court_id)
                .map(CommandOutcome::Shuttlecocks),
            Command::DecrementShuttlecock(court_id) => self
                .decrement_shuttlecock(court_id)
                .map(CommandOutcome::Shuttlecocks),
            Command::AutoAssign(court_id) => {
                self.auto_assign(court_id).map(CommandOutcome::Lineup)
            }
            Command::AutoFill(court_id) => self.auto_fill(court_id).map(CommandOutcome::Lineup),
            Command::HardReset => self.hard_reset().map(|()| CommandOutcome::Done),
            Command::GameReset => self.game_reset().map(|()| CommandOutcome::Done),
        }
    }

    /// Register a player.
    pub fn add_player(&mut self, name: &str, rank: Rank) -> Result<Player, ServiceError> {
        let input = PlayerInput::new(name, rank);
        self.run_command("add_player", |club, _| {
            roster_service::add_player(club, input)
        })
    }

    /// Replace the player with the same id; `None` when no such player exists.
    pub fn update_player(&mut self, player: Player) -> Result<Option<Player>, ServiceError> {
        self.run_command("update_player", |club, _| {
            roster_service::update_player(club, player)
        })
    }

    /// Remove a player, seated or not.
    pub fn delete_player(&mut self, player_id: PlayerId) -> Result<Player, ServiceError> {
        self.run_command("delete_player", |club, _| {
            roster_service::delete_player(club, player_id)
        })
    }

    /// Register a court.
    pub fn add_court(&mut self, name: &str) -> Result<Court, ServiceError> {
        let input = CourtInput::new(name);
        self.run_command("add_court", |club, _| roster_service::add_court(club, input))
    }

    /// Remove a court and its session.
    pub fn delete_court(&mut self, court_id: CourtId) -> Result<Court, ServiceError> {
        self.run_command("delete_court", |club, _| {
            roster_service::delete_court(club, court_id)
        })
    }

    /// Seat a player on an empty slot.
    pub fn assign_player(
        &mut self,
        court_id: CourtId,
        player_id: PlayerId,
        slot: Slot,
    ) -> Result<Lineup, ServiceError> {
        self.run_command("assign_player", |club, _| {
            session_service::assign_player(club, court_id, player_id, slot)
        })
    }

    /// Empty a slot.
    pub fn remove_player(
        &mut self,
        court_id: CourtId,
        slot: Slot,
    ) -> Result<Option<PlayerId>, ServiceError> {
        self.run_command("remove_player", |club, _| {
            session_service::remove_player(club, court_id, slot)
        })
    }

    /// Swap the player on a slot for the best balancing free player.
    pub fn change_player(
        &mut self,
        court_id: CourtId,
        slot: Slot,
    ) -> Result<PlayerId, ServiceError> {
        self.run_command("change_player", |club, _| {
            assignment_service::change_player(club, court_id, slot)
        })
    }

    /// Start the game on a full court.
    pub fn start_session(&mut self, court_id: CourtId) -> Result<(), ServiceError> {
        self.run_command("start_session", |club, context| {
            session_service::start_session(club, court_id, context.now)
        })
    }

    /// Pause a running game.
    pub fn pause_session(&mut self, court_id: CourtId) -> Result<(), ServiceError> {
        self.run_command("pause_session", |club, context| {
            session_service::pause_session(club, court_id, context.now)
        })
    }

    /// Resume a paused game.
    pub fn resume_session(&mut self, court_id: CourtId) -> Result<(), ServiceError> {
        self.run_command("resume_session", |club, _| {
            session_service::resume_session(club, court_id)
        })
    }

    /// End a game, recording `shuttlecock_count` or the session's own count.
    pub fn end_session(
        &mut self,
        court_id: CourtId,
        shuttlecock_count: Option<u32>,
    ) -> Result<HistoryRecord, ServiceError> {
        self.run_command("end_session", |club, context| {
            let count = shuttlecock_count.unwrap_or_else(|| {
                club.session(court_id)
                    .map_or(0, |session| session.shuttlecock_count)
            });
            session_service::end_session(club, court_id, count, context.now)
        })
    }

    /// Count one more shuttlecock.
    pub fn increment_shuttlecock(&mut self, court_id: CourtId) -> Result<u32, ServiceError> {
        self.run_command("increment_shuttlecock", |club, _| {
            session_service::increment_shuttlecock(club, court_id)
        })
    }

    /// Take one shuttlecock back.
    pub fn decrement_shuttlecock(&mut self, court_id: CourtId) -> Result<u32, ServiceError> {
        self.run_command("decrement_shuttlecock", |club, _| {
            session_service::decrement_shuttlecock(club, court_id)
        })
    }

    /// Seat the best balanced foursome.
    pub fn auto_assign(&mut self, court_id: CourtId) -> Result<Lineup, ServiceError> {
        self.run_command("auto_assign", |club, context| {
            assignment_service::auto_assign(club, court_id, context.pool_size, context.rng)
        })
    }

    /// Fill the empty slots of a court.
    pub fn auto_fill(&mut self, court_id: CourtId) -> Result<Lineup, ServiceError> {
        self.run_command("auto_fill", |club, context| {
            assignment_service::auto_fill(club, court_id, context.pool_size, context.rng)
        })
    }

    /// Forget everything.
    pub fn hard_reset(&mut self) -> Result<(), ServiceError> {
        self.run_command("hard_reset", |club, _| {
            reset_service::hard_reset(club);
            Ok(())
        })
    }

    /// Clear counters, sessions and history; keep players and courts.
    pub fn game_reset(&mut self) -> Result<(), ServiceError> {
        self.run_command("game_reset", |club, _| {
            reset_service::game_reset(club);
            Ok(())
        })
    }

    /// Registered players.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.club.players.values()
    }

    /// Registered courts.
    pub fn courts(&self) -> impl Iterator<Item = &Court> {
        self.club.courts.values()
    }

    /// Live sessions.
    pub fn active_sessions(&self) -> impl Iterator<Item = &CourtSession> {
        self.club.sessions.values()
    }

    /// Finished games, most recent first.
    pub fn history(&self) -> &[HistoryRecord] {
        &self.club.history
    }

    /// Rows of the players not seated anywhere.
    pub fn available_players(&self) -> Vec<PlayerView> {
        query_service::available_players(&self.club)
    }

    /// Roster rows.
    pub fn player_views(&self) -> Vec<PlayerView> {
        query_service::players(&self.club)
    }

    /// Card of one court.
    pub fn court_view(&self, court_id: CourtId) -> Result<CourtView, ServiceError> {
        query_service::court_view(&self.club, court_id, self.now())
    }

    /// Cards of every court.
    pub fn court_views(&self) -> Vec<CourtView> {
        query_service::court_views(&self.club, self.now())
    }

    /// Running time of the game on a court.
    pub fn elapsed(&self, court_id: CourtId) -> Option<String> {
        self.club
            .session(court_id)
            .and_then(|session| query_service::elapsed(session, self.now()))
    }

    /// History totals.
    pub fn history_summary(&self) -> HistorySummary {
        query_service::history_summary(&self.club)
    }

    /// History rows.
    pub fn history_entries(&self) -> Vec<HistoryEntryView> {
        query_service::history_entries(&self.club)
    }

    /// Whether the club can play.
    pub fn readiness(&self) -> Readiness {
        query_service::readiness(&self.club)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use time::{Duration, macros::datetime};

    use super::*;
    use crate::{
        dao::{
            club_store::{JsonFileStore, MemoryStore},
            storage::{StorageError, StorageResult},
        },
        state::{clock::ManualClock, club::Team, session_machine::SessionPhase},
    };

    const START: OffsetDateTime = datetime!(2024-05-04 18:00:00 UTC);

    fn engine() -> (AppState, ManualClock) {
        let clock = ManualClock::new(START);
        let state = AppState::new(AppConfig::default())
            .with_clock(clock.clone())
            .with_rng(StdRng::seed_from_u64(42));
        (state, clock)
    }

    struct BrokenStore;

    impl ClubStore for BrokenStore {
        fn load(&self) -> StorageResult<Option<ClubEntity>> {
            Ok(None)
        }

        fn save(&mut self, _state: &ClubEntity) -> StorageResult<()> {
            Err(StorageError::unavailable(
                "disk full".into(),
                io::Error::other("no space left"),
            ))
        }
    }

    #[test]
    fn rejected_commands_leave_the_state_untouched() {
        let (mut state, _) = engine();
        let court = state.add_court("Court 1").unwrap().id;
        for name in ["Ana", "Ben", "Cat"] {
            state.add_player(name, Rank::Mid).unwrap();
        }
        let before = state.club().clone();

        let err = state.auto_assign(court).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientPlayers { .. }));
        assert!(state.start_session(court).is_err());
        assert_eq!(state.club(), &before);
    }

    #[test]
    fn two_courts_four_players_scenario() {
        let (mut state, _) = engine();
        state.add_court("Court 1").unwrap();
        state.add_court("Court 2").unwrap();
        for (name, rank) in [
            ("Ana", Rank::Beginner),
            ("Ben", Rank::Mid),
            ("Cat", Rank::Mid),
            ("Dan", Rank::Pro),
        ] {
            state.add_player(name, rank).unwrap();
        }
        let court = state.courts().next().unwrap().id;

        let outcome = state.execute(Command::AutoAssign(court)).unwrap();
        let CommandOutcome::Lineup(lineup) = outcome else {
            panic!("expected a line-up, got {outcome:?}");
        };

        let strength = |team: [Option<PlayerId>; 2]| -> u32 {
            team.iter()
                .map(|id| state.club().rank_value_of(id.unwrap()))
                .sum()
        };
        assert_eq!(strength(lineup.team1), strength(lineup.team2));
        assert_eq!(
            SessionPhase::of(state.club().session(court)),
            SessionPhase::Ready
        );
        assert!(state.available_players().is_empty());
        assert!(!state.court_view(court).unwrap().can_auto_assign);
    }

    #[test]
    fn full_game_through_commands() {
        let (mut state, clock) = engine();
        let court = state.add_court("Court 1").unwrap().id;
        let ids: Vec<_> = ["Ana", "Ben", "Cat", "Dan"]
            .into_iter()
            .map(|name| state.add_player(name, Rank::Mid).unwrap().id)
            .collect();
        for (slot, id) in Slot::ALL.into_iter().zip(&ids) {
            state
                .execute(Command::AssignPlayer {
                    court_id: court,
                    player_id: *id,
                    slot,
                })
                .unwrap();
        }

        state.execute(Command::StartSession(court)).unwrap();
        assert_eq!(
            state.execute(Command::IncrementShuttlecock(court)).unwrap(),
            CommandOutcome::Shuttlecocks(1)
        );
        clock.advance(Duration::seconds(125));
        assert_eq!(state.elapsed(court).as_deref(), Some("02:05"));

        let outcome = state
            .execute(Command::EndSession {
                court_id: court,
                shuttlecock_count: None,
            })
            .unwrap();
        let CommandOutcome::History(record) = outcome else {
            panic!("expected a history record, got {outcome:?}");
        };
        assert_eq!(record.shuttlecock_count, 1);
        assert_eq!(record.end_time, START + Duration::seconds(125));
        assert_eq!(state.history_summary().total_games, 1);
        assert!(state.players().all(|player| player.game_count == 1));
        assert_eq!(state.active_sessions().count(), 0);
    }

    #[test]
    fn explicit_shuttlecock_count_wins() {
        let (mut state, _) = engine();
        let court = state.add_court("Court 1").unwrap().id;
        for name in ["Ana", "Ben", "Cat", "Dan"] {
            state.add_player(name, Rank::Pro).unwrap();
        }
        state.auto_assign(court).unwrap();
        state.start_session(court).unwrap();

        let record = state.end_session(court, Some(6)).unwrap();
        assert_eq!(record.shuttlecock_count, 6);
    }

    #[test]
    fn state_survives_a_reload() {
        let store = MemoryStore::new();
        let (state, _) = engine();
        let mut state = state.with_store(store.clone()).unwrap();
        let court = state.add_court("Court 1").unwrap().id;
        for (name, rank) in [
            ("Ana", Rank::Beginner),
            ("Ben", Rank::Beginner),
            ("Cat", Rank::Pro),
            ("Dan", Rank::Pro),
        ] {
            state.add_player(name, rank).unwrap();
        }
        state.auto_assign(court).unwrap();
        state.start_session(court).unwrap();
        state.pause_session(court).unwrap();

        let reloaded = AppState::new(AppConfig::default())
            .with_store(store.clone())
            .unwrap();
        assert_eq!(reloaded.club(), state.club());

        let document = store.document().unwrap();
        assert!(document.contains("\"activeSessions\""));
        assert!(document.contains("\"isPaused\":true"));
    }

    #[test]
    fn played_games_survive_a_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let clock = ManualClock::new(datetime!(2024-05-04 20:00:00.123456789 +02:00));
        let mut state = AppState::new(AppConfig::default())
            .with_clock(clock.clone())
            .with_rng(StdRng::seed_from_u64(7))
            .with_store(JsonFileStore::new(&path, "badminton-store"))
            .unwrap();
        let court1 = state.add_court("Court 1").unwrap().id;
        let court2 = state.add_court("Court 2").unwrap().id;
        for (name, rank) in [
            ("Ana", Rank::Beginner),
            ("Ben", Rank::Beginner),
            ("Cat", Rank::Mid),
            ("Dan", Rank::Mid),
            ("Eve", Rank::Pro),
            ("Fay", Rank::Pro),
            ("Gus", Rank::Mid),
            ("Hal", Rank::Beginner),
        ] {
            state.add_player(name, rank).unwrap();
        }

        state.auto_assign(court1).unwrap();
        state.start_session(court1).unwrap();
        state.increment_shuttlecock(court1).unwrap();
        clock.advance(Duration::minutes(21));
        state.end_session(court1, None).unwrap();

        state.auto_fill(court2).unwrap();
        state.start_session(court2).unwrap();
        clock.advance(Duration::minutes(5));
        state.pause_session(court2).unwrap();

        assert_eq!(state.history().len(), 1);
        assert_eq!(
            state
                .club()
                .players
                .values()
                .filter(|player| player.last_game_time.is_some())
                .count(),
            4
        );
        let available = state.available_players();
        assert_eq!(available.len(), 4);
        assert!(available.iter().all(|row| row.court_name.is_none()));

        let reloaded = AppState::new(AppConfig::default())
            .with_store(JsonFileStore::new(&path, "badminton-store"))
            .unwrap();
        assert_eq!(reloaded.club(), state.club());

        let document = std::fs::read_to_string(&path).unwrap();
        assert!(document.contains("\"sessionHistory\""));
        assert!(document.contains("+02:00"));
    }

    #[test]
    fn failed_save_discards_the_command() {
        let (state, _) = engine();
        let mut state = state.with_store(BrokenStore).unwrap();

        let err = state.add_court("Court 1").unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(state.courts().count(), 0);
    }

    #[test]
    fn change_player_is_allowed_while_paused() {
        let (mut state, _) = engine();
        let court = state.add_court("Court 1").unwrap().id;
        for name in ["Ana", "Ben", "Cat", "Dan", "Eve"] {
            state.add_player(name, Rank::Mid).unwrap();
        }
        state.auto_assign(court).unwrap();
        state.start_session(court).unwrap();
        let slot = Slot::new(Team::Team2, club::Position::First);

        assert!(matches!(
            state.change_player(court, slot),
            Err(ServiceError::GuardViolation(_))
        ));

        state.pause_session(court).unwrap();
        let newcomer = state.change_player(court, slot).unwrap();
        assert_eq!(
            state.club().session(court).unwrap().lineup.get(slot),
            Some(newcomer)
        );
        state.resume_session(court).unwrap();
    }

    #[test]
    fn game_reset_through_execute() {
        let (mut state, _) = engine();
        let court = state.add_court("Court 1").unwrap().id;
        for name in ["Ana", "Ben", "Cat", "Dan"] {
            state.add_player(name, Rank::Mid).unwrap();
        }
        state.auto_assign(court).unwrap();
        state.start_session(court).unwrap();
        state.end_session(court, None).unwrap();

        assert_eq!(
            state.execute(Command::GameReset).unwrap(),
            CommandOutcome::Done
        );
        assert_eq!(state.players().count(), 4);
        assert!(state.history().is_empty());

        state.execute(Command::HardReset).unwrap();
        assert_eq!(state.club(), &ClubState::default());
    }
}
