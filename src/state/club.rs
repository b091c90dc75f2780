use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    models::{
        ClubEntity, CourtEntity, HistoryRecordEntity, HistoryTeamsEntity, LineupEntity,
        PlayerEntity, SessionEntity,
    },
    storage::StorageError,
};

/// Identifier of a registered player.
pub type PlayerId = Uuid;
/// Identifier of a registered court.
pub type CourtId = Uuid;

/// Self-declared skill level of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Rank value 1.
    Beginner,
    /// Rank value 2.
    Mid,
    /// Rank value 3.
    Pro,
}

impl Rank {
    /// Numeric strength used when balancing teams.
    pub fn value(self) -> u32 {
        match self {
            Rank::Beginner => 1,
            Rank::Mid => 2,
            Rank::Pro => 3,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::Beginner => "Beginner",
            Rank::Mid => "Mid",
            Rank::Pro => "Pro",
        };
        f.write_str(label)
    }
}

/// Error returned when a rank label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rank `{0}` (expected Beginner, Mid or Pro)")]
pub struct UnknownRank(pub String);

impl FromStr for Rank {
    type Err = UnknownRank;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Rank::Beginner),
            "mid" => Ok(Rank::Mid),
            "pro" => Ok(Rank::Pro),
            _ => Err(UnknownRank(s.to_owned())),
        }
    }
}

/// One of the two sides of a doubles match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// First team (left column of a court card).
    Team1,
    /// Second team.
    Team2,
}

/// Position of a player inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Slot 0.
    First,
    /// Slot 1.
    Second,
}

impl Position {
    fn index(self) -> usize {
        match self {
            Position::First => 0,
            Position::Second => 1,
        }
    }
}

impl TryFrom<u8> for Position {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Position::First),
            1 => Ok(Position::Second),
            other => Err(other),
        }
    }
}

/// Address of one of the four places on a court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    /// Team owning the slot.
    pub team: Team,
    /// Position within the team.
    pub position: Position,
}

impl Slot {
    /// Every slot in fill order: team 1 before team 2, position 0 before 1.
    pub const ALL: [Slot; 4] = [
        Slot::new(Team::Team1, Position::First),
        Slot::new(Team::Team1, Position::Second),
        Slot::new(Team::Team2, Position::First),
        Slot::new(Team::Team2, Position::Second),
    ];

    /// Build a slot address.
    pub const fn new(team: Team, position: Position) -> Self {
        Self { team, position }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let team = match self.team {
            Team::Team1 => "team1",
            Team::Team2 => "team2",
        };
        write!(f, "{team}[{}]", self.position.index())
    }
}

/// Registered club member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier, never reassigned.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Skill level used for balancing.
    pub rank: Rank,
    /// Number of finished games.
    pub game_count: u32,
    /// End time of the last finished game, if any.
    pub last_game_time: Option<OffsetDateTime>,
}

impl Player {
    /// Build a fresh player with no games played.
    pub fn new(name: String, rank: Rank) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            rank,
            game_count: 0,
            last_game_time: None,
        }
    }
}

/// Playing court.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Court {
    /// Stable identifier.
    pub id: CourtId,
    /// Display name.
    pub name: String,
}

impl Court {
    /// Build a court with a fresh identifier.
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// The four places of a court, each empty or holding a player id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineup {
    /// Team 1 places.
    pub team1: [Option<PlayerId>; 2],
    /// Team 2 places.
    pub team2: [Option<PlayerId>; 2],
}

impl Lineup {
    fn team(&self, team: Team) -> &[Option<PlayerId>; 2] {
        match team {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }

    fn team_mut(&mut self, team: Team) -> &mut [Option<PlayerId>; 2] {
        match team {
            Team::Team1 => &mut self.team1,
            Team::Team2 => &mut self.team2,
        }
    }

    /// Occupant of a slot.
    pub fn get(&self, slot: Slot) -> Option<PlayerId> {
        self.team(slot.team)[slot.position.index()]
    }

    /// Overwrite a slot.
    pub fn set(&mut self, slot: Slot, player: Option<PlayerId>) {
        self.team_mut(slot.team)[slot.position.index()] = player;
    }

    /// Occupied slots with their player, in fill order.
    pub fn occupants(&self) -> impl Iterator<Item = (Slot, PlayerId)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|id| (slot, id)))
    }

    /// Empty slots in fill order.
    pub fn vacant_slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_none())
            .collect()
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.occupants().count()
    }

    /// Whether all four slots are filled.
    pub fn is_full(&self) -> bool {
        self.occupied_count() == Slot::ALL.len()
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    /// Whether the player sits anywhere in this lineup.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.occupants().any(|(_, id)| id == player)
    }
}

/// Occupancy of one court, from the first assignment until the game ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtSession {
    /// Identifier of this session instance.
    pub id: Uuid,
    /// Court the session runs on.
    pub court_id: CourtId,
    /// Current line-up.
    pub lineup: Lineup,
    /// Set when the game starts.
    pub start_time: Option<OffsetDateTime>,
    /// Set while the game is paused.
    pub pause_time: Option<OffsetDateTime>,
    /// Game started and paused.
    pub is_paused: bool,
    /// Game started.
    pub is_active: bool,
    /// Always unset while the session is live; kept for the persisted layout.
    pub end_time: Option<OffsetDateTime>,
    /// Shuttlecocks used so far.
    pub shuttlecock_count: u32,
}

impl CourtSession {
    /// Empty, not yet started session for a court.
    pub fn new(court_id: CourtId) -> Self {
        Self {
            id: Uuid::new_v4(),
            court_id,
            lineup: Lineup::default(),
            start_time: None,
            pause_time: None,
            is_paused: false,
            is_active: false,
            end_time: None,
            shuttlecock_count: 0,
        }
    }

    /// Whether the line-up may be edited (not started, or paused).
    pub fn is_editable(&self) -> bool {
        !self.is_active || self.is_paused
    }
}

/// Both teams of a finished game, as full player records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTeams {
    /// Team 1 players.
    pub team1: [Player; 2],
    /// Team 2 players.
    pub team2: [Player; 2],
}

/// Immutable record of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Record identifier.
    pub id: Uuid,
    /// Court the game was played on.
    pub court_id: CourtId,
    /// Court name at the time the game ended.
    pub court_name: String,
    /// Player records as they were before the game was counted.
    pub players: HistoryTeams,
    /// When the game started.
    pub start_time: OffsetDateTime,
    /// When the game ended.
    pub end_time: OffsetDateTime,
    /// Shuttlecocks used.
    pub shuttlecock_count: u32,
}

/// Whole club state: roster, courts, live sessions and finished games.
///
/// Commands never edit this value in place: they work on a clone that replaces the original only
/// when the whole command succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubState {
    /// Registered players in registration order.
    pub players: IndexMap<PlayerId, Player>,
    /// Registered courts in creation order.
    pub courts: IndexMap<CourtId, Court>,
    /// Live sessions keyed by court.
    pub sessions: IndexMap<CourtId, CourtSession>,
    /// Finished games, most recent first.
    pub history: Vec<HistoryRecord>,
}

impl ClubState {
    /// Session running on a court, if any.
    pub fn session(&self, court_id: CourtId) -> Option<&CourtSession> {
        self.sessions.get(&court_id)
    }

    /// Mutable session running on a court, if any.
    pub fn session_mut(&mut self, court_id: CourtId) -> Option<&mut CourtSession> {
        self.sessions.get_mut(&court_id)
    }

    /// Session of a court, created empty when the court has none yet.
    pub fn ensure_session(&mut self, court_id: CourtId) -> &mut CourtSession {
        self.sessions
            .entry(court_id)
            .or_insert_with(|| CourtSession::new(court_id))
    }

    /// Court where the player currently sits, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<(CourtId, Slot)> {
        self.sessions.values().find_map(|session| {
            session
                .lineup
                .occupants()
                .find(|(_, id)| *id == player)
                .map(|(slot, _)| (session.court_id, slot))
        })
    }

    /// Players not sitting on any court, in registration order.
    pub fn available_players(&self) -> Vec<&Player> {
        self.players
            .values()
            .filter(|player| self.seat_of(player.id).is_none())
            .collect()
    }

    /// Rank value of a seated id; ids without a player record count as zero.
    pub fn rank_value_of(&self, player: PlayerId) -> u32 {
        self.players
            .get(&player)
            .map(|player| player.rank.value())
            .unwrap_or(0)
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rank: value.rank,
            game_count: value.game_count,
            last_game_time: value.last_game_time,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            name: value.name,
            rank: value.rank,
            game_count: value.game_count,
            last_game_time: value.last_game_time,
        }
    }
}

impl From<CourtEntity> for Court {
    fn from(value: CourtEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<Court> for CourtEntity {
    fn from(value: Court) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<LineupEntity> for Lineup {
    fn from(value: LineupEntity) -> Self {
        Self {
            team1: value.team1,
            team2: value.team2,
        }
    }
}

impl From<Lineup> for LineupEntity {
    fn from(value: Lineup) -> Self {
        Self {
            team1: value.team1,
            team2: value.team2,
        }
    }
}

impl From<SessionEntity> for CourtSession {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            court_id: value.court_id,
            lineup: value.players.into(),
            start_time: value.start_time,
            pause_time: value.pause_time,
            is_paused: value.is_paused,
            is_active: value.is_active,
            end_time: value.end_time,
            shuttlecock_count: value.shuttlecock_count,
        }
    }
}

impl From<CourtSession> for SessionEntity {
    fn from(value: CourtSession) -> Self {
        Self {
            id: value.id,
            court_id: value.court_id,
            players: value.lineup.into(),
            start_time: value.start_time,
            end_time: value.end_time,
            shuttlecock_count: value.shuttlecock_count,
            is_active: value.is_active,
            is_paused: value.is_paused,
            pause_time: value.pause_time,
        }
    }
}

impl From<HistoryRecordEntity> for HistoryRecord {
    fn from(value: HistoryRecordEntity) -> Self {
        let HistoryTeamsEntity { team1, team2 } = value.players;
        Self {
            id: value.id,
            court_id: value.court_id,
            court_name: value.court_name,
            players: HistoryTeams {
                team1: team1.map(Into::into),
                team2: team2.map(Into::into),
            },
            start_time: value.start_time,
            end_time: value.end_time,
            shuttlecock_count: value.shuttlecock_count,
        }
    }
}

impl From<HistoryRecord> for HistoryRecordEntity {
    fn from(value: HistoryRecord) -> Self {
        let HistoryTeams { team1, team2 } = value.players;
        Self {
            id: value.id,
            court_id: value.court_id,
            court_name: value.court_name,
            players: HistoryTeamsEntity {
                team1: team1.map(Into::into),
                team2: team2.map(Into::into),
            },
            start_time: value.start_time,
            end_time: value.end_time,
            shuttlecock_count: value.shuttlecock_count,
        }
    }
}

impl From<&ClubState> for ClubEntity {
    fn from(value: &ClubState) -> Self {
        Self {
            players: value.players.values().cloned().map(Into::into).collect(),
            courts: value.courts.values().cloned().map(Into::into).collect(),
            active_sessions: value.sessions.values().cloned().map(Into::into).collect(),
            session_history: value.history.iter().cloned().map(Into::into).collect(),
        }
    }
}

impl TryFrom<ClubEntity> for ClubState {
    type Error = StorageError;

    /// Rehydrate persisted state, refusing snapshots that break the seating invariants.
    fn try_from(value: ClubEntity) -> Result<Self, Self::Error> {
        let players = value
            .players
            .into_iter()
            .map(|entity| (entity.id, Player::from(entity)))
            .collect();
        let courts = value
            .courts
            .into_iter()
            .map(|entity| (entity.id, Court::from(entity)))
            .collect();

        let mut sessions: IndexMap<CourtId, CourtSession> = IndexMap::new();
        for entity in value.active_sessions {
            let session = CourtSession::from(entity);
            if session.is_active && session.start_time.is_none() {
                return Err(StorageError::corrupted(format!(
                    "session `{}` is active without a start time",
                    session.id
                )));
            }
            if session.is_paused && !session.is_active {
                return Err(StorageError::corrupted(format!(
                    "session `{}` is paused without being active",
                    session.id
                )));
            }
            for (_, player) in session.lineup.occupants() {
                let seated_twice = session
                    .lineup
                    .occupants()
                    .filter(|(_, other)| *other == player)
                    .count()
                    > 1
                    || sessions.values().any(|other| other.lineup.contains(player));
                if seated_twice {
                    return Err(StorageError::corrupted(format!(
                        "player `{player}` is seated more than once"
                    )));
                }
            }
            if sessions.insert(session.court_id, session).is_some() {
                return Err(StorageError::corrupted(
                    "a court has more than one session".into(),
                ));
            }
        }

        Ok(Self {
            players,
            courts,
            sessions,
            history: value
                .session_history
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }
}
