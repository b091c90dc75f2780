use serde::Serialize;
use uuid::Uuid;

use crate::state::club::Rank;

/// Roster row: a player with where they currently sit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Skill level.
    pub rank: Rank,
    /// Finished games.
    pub game_count: u32,
    /// End of the last finished game, RFC 3339.
    pub last_game_time: Option<String>,
    /// Name of the court the player sits on, if seated.
    pub court_name: Option<String>,
}
