use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::session_machine::{InvalidTransition, SessionEvent, SessionPhase},
};

/// Errors that can occur in service layer operations.
///
/// Every variant is a recoverable rejection: the command that produced it left the club state
/// untouched, and the message is meant to be shown to whoever issued the command.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A player is already seated, or the target slot is taken.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The court's game is in progress and must be paused first.
    #[error("session in progress: {0}")]
    GuardViolation(String),
    /// The session lacks players, or has no game running.
    #[error("incomplete session: {0}")]
    Incomplete(String),
    /// Not enough free players for the requested assignment.
    #[error("not enough available players: need {needed}, only {available} available")]
    InsufficientPlayers {
        /// Players the operation needs.
        needed: usize,
        /// Players currently free.
        available: usize,
    },
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The new state could not be persisted.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {err}"))
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        match (err.from, err.event) {
            (SessionPhase::Active, SessionEvent::SlotAssigned | SessionEvent::SlotCleared) => {
                ServiceError::GuardViolation(
                    "pause the game before changing players".into(),
                )
            }
            (SessionPhase::Empty | SessionPhase::Filling { .. }, SessionEvent::Start) => {
                ServiceError::Incomplete(
                    "all player slots must be filled to start a session".into(),
                )
            }
            (SessionPhase::Paused { .. }, SessionEvent::Resume) => ServiceError::Incomplete(
                "all player slots must be filled to resume the session".into(),
            ),
            (
                SessionPhase::Empty | SessionPhase::Filling { .. } | SessionPhase::Ready,
                SessionEvent::End,
            ) => ServiceError::Incomplete("no game is in progress on this court".into()),
            (SessionPhase::Active | SessionPhase::Paused { .. }, SessionEvent::Start) => {
                ServiceError::InvalidState("the game has already started".into())
            }
            _ => ServiceError::InvalidState(err.to_string()),
        }
    }
}
