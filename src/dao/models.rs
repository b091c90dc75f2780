use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeAs, NoneAsEmptyString, SerializeAs, serde_as};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::state::club::Rank;

/// Version written next to the persisted state.
pub const STATE_VERSION: u32 = 0;

/// `serde_with` adapter storing timestamps as RFC 3339 (ISO-8601) strings.
pub struct Rfc3339Timestamp;

impl SerializeAs<OffsetDateTime> for Rfc3339Timestamp {
    fn serialize_as<S>(source: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = source.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> DeserializeAs<'de, OffsetDateTime> for Rfc3339Timestamp {
    fn deserialize_as<D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

/// Like [`Rfc3339Timestamp`] for optional values, with an empty string standing for "unset".
///
/// Accepts `null` as well when reading.
pub struct BlankableTimestamp;

impl SerializeAs<Option<OffsetDateTime>> for BlankableTimestamp {
    fn serialize_as<S>(source: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match source {
            Some(timestamp) => Rfc3339Timestamp::serialize_as(timestamp, serializer),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> DeserializeAs<'de, Option<OffsetDateTime>> for BlankableTimestamp {
    fn deserialize_as<D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => OffsetDateTime::parse(&raw, &Rfc3339)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Registered player as persisted.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Skill level (`Beginner`, `Mid` or `Pro`).
    pub rank: Rank,
    /// Finished games.
    pub game_count: u32,
    /// End of the last finished game, `null` when never played.
    #[serde_as(as = "Option<Rfc3339Timestamp>")]
    pub last_game_time: Option<OffsetDateTime>,
}

/// Court as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourtEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// Four court places; an empty place is stored as `""`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineupEntity {
    /// Team 1 places.
    #[serde_as(as = "[NoneAsEmptyString; 2]")]
    pub team1: [Option<Uuid>; 2],
    /// Team 2 places.
    #[serde_as(as = "[NoneAsEmptyString; 2]")]
    pub team2: [Option<Uuid>; 2],
}

/// Live court session as persisted.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Session identifier.
    pub id: Uuid,
    /// Court the session belongs to.
    pub court_id: Uuid,
    /// Current line-up.
    pub players: LineupEntity,
    /// Start of the game, `""` until started.
    #[serde_as(as = "BlankableTimestamp")]
    pub start_time: Option<OffsetDateTime>,
    /// Always `null` for live sessions.
    #[serde_as(as = "Option<Rfc3339Timestamp>")]
    pub end_time: Option<OffsetDateTime>,
    /// Shuttlecocks used so far.
    pub shuttlecock_count: u32,
    /// Whether the game started.
    pub is_active: bool,
    /// Whether the game is paused.
    #[serde(default)]
    pub is_paused: bool,
    /// When the pause began.
    #[serde(default)]
    #[serde_as(as = "Option<Rfc3339Timestamp>")]
    pub pause_time: Option<OffsetDateTime>,
}

/// Player records of both teams in a finished game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryTeamsEntity {
    /// Team 1 players.
    pub team1: [PlayerEntity; 2],
    /// Team 2 players.
    pub team2: [PlayerEntity; 2],
}

/// Finished game as persisted.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecordEntity {
    /// Record identifier.
    pub id: Uuid,
    /// Court the game was played on.
    pub court_id: Uuid,
    /// Court name when the game ended.
    pub court_name: String,
    /// Player snapshots.
    pub players: HistoryTeamsEntity,
    /// Start of the game.
    #[serde_as(as = "Rfc3339Timestamp")]
    pub start_time: OffsetDateTime,
    /// End of the game.
    #[serde_as(as = "Rfc3339Timestamp")]
    pub end_time: OffsetDateTime,
    /// Shuttlecocks used.
    pub shuttlecock_count: u32,
}

/// The whole persisted tuple.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClubEntity {
    /// Roster in registration order.
    #[serde(default)]
    pub players: Vec<PlayerEntity>,
    /// Courts in creation order.
    #[serde(default)]
    pub courts: Vec<CourtEntity>,
    /// Live sessions.
    #[serde(default)]
    pub active_sessions: Vec<SessionEntity>,
    /// Finished games, most recent first.
    #[serde(default)]
    pub session_history: Vec<HistoryRecordEntity>,
}

/// Wrapper stored under the namespace key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedEnvelope {
    /// The persisted tuple.
    pub state: ClubEntity,
    /// Layout version.
    #[serde(default)]
    pub version: u32,
}

impl PersistedEnvelope {
    /// Wrap a state with the current layout version.
    pub fn new(state: ClubEntity) -> Self {
        Self {
            state,
            version: STATE_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn session_layout_uses_blank_strings_for_unset_values() {
        let court_id = Uuid::new_v4();
        let player = Uuid::new_v4();
        let session = SessionEntity {
            id: Uuid::nil(),
            court_id,
            players: LineupEntity {
                team1: [Some(player), None],
                team2: [None, None],
            },
            start_time: None,
            end_time: None,
            shuttlecock_count: 0,
            is_active: false,
            is_paused: false,
            pause_time: None,
        };

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["startTime"], json!(""));
        assert_eq!(value["endTime"], json!(null));
        assert_eq!(value["players"]["team1"], json!([player.to_string(), ""]));
        assert_eq!(value["players"]["team2"], json!(["", ""]));
        assert_eq!(value["courtId"], json!(court_id.to_string()));
    }

    #[test]
    fn reads_browser_style_iso_timestamps() {
        let raw = json!({
            "id": "0b6f7a3e-6b1a-4a55-9d43-2f3cf8c1d3a1",
            "name": "Ana",
            "rank": "Pro",
            "gameCount": 3,
            "lastGameTime": "2024-05-04T18:30:12.345Z"
        });

        let player: PlayerEntity = serde_json::from_value(raw).unwrap();
        assert_eq!(player.rank, Rank::Pro);
        assert_eq!(
            player.last_game_time,
            Some(datetime!(2024-05-04 18:30:12.345 UTC))
        );
    }

    #[test]
    fn sessions_without_pause_fields_still_load() {
        let raw = json!({
            "id": "6a3c4c8e-7d43-4f0c-8f5e-0d9c0e3c2b11",
            "courtId": "b0d3a3b1-1c2e-4f7a-9b8c-3e2f1a0d9c8b",
            "players": { "team1": ["", ""], "team2": ["", ""] },
            "startTime": "",
            "endTime": null,
            "shuttlecockCount": 0,
            "isActive": false
        });

        let session: SessionEntity = serde_json::from_value(raw).unwrap();
        assert!(!session.is_paused);
        assert_eq!(session.pause_time, None);
        assert_eq!(session.start_time, None);
    }
}
