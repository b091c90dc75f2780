use serde::Serialize;
use uuid::Uuid;

use crate::{
    dto::phase::{CourtStatus, VisibleSessionPhase},
    state::club::Rank,
};

/// An occupied slot resolved against the roster.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    /// Seated player id.
    pub player_id: Uuid,
    /// Player name, `None` when the record was deleted while seated.
    pub name: Option<String>,
    /// Player rank, `None` when the record was deleted while seated.
    pub rank: Option<Rank>,
}

/// Everything a court card shows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourtView {
    /// Court identifier.
    pub court_id: Uuid,
    /// Court name.
    pub name: String,
    /// Lifecycle phase.
    pub phase: VisibleSessionPhase,
    /// Status badge.
    pub status: CourtStatus,
    /// Live session id, if the court has one.
    pub session_id: Option<Uuid>,
    /// Team 1 slots.
    pub team1: [Option<SeatView>; 2],
    /// Team 2 slots.
    pub team2: [Option<SeatView>; 2],
    /// Sum of team 1 rank values.
    pub team1_strength: u32,
    /// Sum of team 2 rank values.
    pub team2_strength: u32,
    /// Absolute strength difference.
    pub balance: u32,
    /// Shuttlecocks used so far.
    pub shuttlecock_count: u32,
    /// Game start, RFC 3339.
    pub started_at: Option<String>,
    /// Pause start, RFC 3339.
    pub paused_at: Option<String>,
    /// Running time as `MM:SS`.
    pub elapsed: Option<String>,
    /// Whether auto-assign has enough free players.
    pub can_auto_assign: bool,
    /// Whether auto-fill has an empty slot and a free player.
    pub can_auto_fill: bool,
    /// Whether slots may be edited.
    pub slots_editable: bool,
}

/// Whether the club can start playing at all.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Readiness {
    /// No court registered yet.
    NoCourts,
    /// Fewer than four players registered.
    NotEnoughPlayers {
        /// Registered players.
        have: usize,
    },
    /// At least one court and four players.
    Ready,
}
