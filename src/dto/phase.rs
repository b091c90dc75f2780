use serde::Serialize;

use crate::state::session_machine::SessionPhase;

/// Court phase exposed to presentation layers.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// Nobody on the court.
    Empty,
    /// Some players assigned.
    Filling,
    /// Four players assigned, game not started.
    Ready,
    /// Game in progress.
    Active,
    /// Game paused.
    Paused,
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Empty => VisibleSessionPhase::Empty,
            SessionPhase::Filling { .. } => VisibleSessionPhase::Filling,
            SessionPhase::Ready => VisibleSessionPhase::Ready,
            SessionPhase::Active => VisibleSessionPhase::Active,
            SessionPhase::Paused { .. } => VisibleSessionPhase::Paused,
        }
    }
}

/// Badge shown on a court card.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum CourtStatus {
    /// No game running.
    Inactive,
    /// Game running.
    Active,
    /// Game paused.
    Paused,
}

impl From<SessionPhase> for CourtStatus {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Active => CourtStatus::Active,
            SessionPhase::Paused { .. } => CourtStatus::Paused,
            SessionPhase::Empty | SessionPhase::Filling { .. } | SessionPhase::Ready => {
                CourtStatus::Inactive
            }
        }
    }
}
