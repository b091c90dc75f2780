use crate::state::club::{
    Court, CourtId, HistoryRecord, Lineup, Player, PlayerId, Rank, Slot,
};

/// Every intent a host can send to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register a player.
    AddPlayer {
        /// Display name, trimmed before validation.
        name: String,
        /// Skill level.
        rank: Rank,
    },
    /// Replace the player record with the same id.
    UpdatePlayer(Player),
    /// Remove a player.
    DeletePlayer(PlayerId),
    /// Register a court.
    AddCourt {
        /// Display name, trimmed before validation.
        name: String,
    },
    /// Remove a court and its session.
    DeleteCourt(CourtId),
    /// Seat a player on an empty slot.
    AssignPlayer {
        /// Target court.
        court_id: CourtId,
        /// Player to seat.
        player_id: PlayerId,
        /// Target slot.
        slot: Slot,
    },
    /// Empty a slot.
    RemovePlayer {
        /// Target court.
        court_id: CourtId,
        /// Slot to clear.
        slot: Slot,
    },
    /// Swap the player on a slot for the best balancing free player.
    ChangePlayer {
        /// Target court.
        court_id: CourtId,
        /// Slot to refill.
        slot: Slot,
    },
    /// Start the game on a full court.
    StartSession(CourtId),
    /// Pause a running game.
    PauseSession(CourtId),
    /// Resume a paused game.
    ResumeSession(CourtId),
    /// End a game and archive it.
    EndSession {
        /// Target court.
        court_id: CourtId,
        /// Shuttlecocks to record; the session's own count when `None`.
        shuttlecock_count: Option<u32>,
    },
    /// Count one more shuttlecock.
    IncrementShuttlecock(CourtId),
    /// Take one shuttlecock back.
    DecrementShuttlecock(CourtId),
    /// Seat the best balanced foursome.
    AutoAssign(CourtId),
    /// Fill the empty slots.
    AutoFill(CourtId),
    /// Forget everything.
    HardReset,
    /// Clear counters, sessions and history, keep players and courts.
    GameReset,
}

impl Command {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddPlayer { .. } => "add_player",
            Command::UpdatePlayer(_) => "update_player",
            Command::DeletePlayer(_) => "delete_player",
            Command::AddCourt { .. } => "add_court",
            Command::DeleteCourt(_) => "delete_court",
            Command::AssignPlayer { .. } => "assign_player",
            Command::RemovePlayer { .. } => "remove_player",
            Command::ChangePlayer { .. } => "change_player",
            Command::StartSession(_) => "start_session",
            Command::PauseSession(_) => "pause_session",
            Command::ResumeSession(_) => "resume_session",
            Command::EndSession { .. } => "end_session",
            Command::IncrementShuttlecock(_) => "increment_shuttlecock",
            Command::DecrementShuttlecock(_) => "decrement_shuttlecock",
            Command::AutoAssign(_) => "auto_assign",
            Command::AutoFill(_) => "auto_fill",
            Command::HardReset => "hard_reset",
            Command::GameReset => "game_reset",
        }
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Player created, updated or deleted.
    Player(Player),
    /// Court created or deleted.
    Court(Court),
    /// Line-up after a seating change.
    Lineup(Lineup),
    /// Player who left the cleared slot, if it was occupied.
    Unseated(Option<PlayerId>),
    /// Player brought in by a change.
    Substituted(PlayerId),
    /// Record of the game that just ended.
    History(HistoryRecord),
    /// Shuttlecock count after the change.
    Shuttlecocks(u32),
    /// Nothing to report.
    Done,
}
