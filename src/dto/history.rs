use serde::Serialize;
use uuid::Uuid;

/// Totals over every finished game.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    /// Finished games.
    pub total_games: usize,
    /// Shuttlecocks used across those games.
    pub total_shuttlecocks: u64,
}

/// One row of the game history table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    /// Record identifier.
    pub id: Uuid,
    /// Court name when the game ended.
    pub court_name: String,
    /// Team 1 player names.
    pub team1: [String; 2],
    /// Team 2 player names.
    pub team2: [String; 2],
    /// Game start, RFC 3339.
    pub started_at: String,
    /// Game end, RFC 3339.
    pub ended_at: String,
    /// Game length, `MM:SS` or `H:MM:SS`.
    pub duration: String,
    /// Shuttlecocks used.
    pub shuttlecock_count: u32,
}
