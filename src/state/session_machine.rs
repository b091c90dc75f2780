use thiserror::Error;

use crate::state::club::CourtSession;

/// Phases a court goes through between two games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session, or a session with every slot empty.
    Empty,
    /// Some slots filled, game not started.
    Filling {
        /// Number of filled slots (1 to 3).
        occupied: u8,
    },
    /// All four slots filled, game not started.
    Ready,
    /// Game in progress; the line-up is locked.
    Active,
    /// Game paused; the line-up may be edited again.
    Paused {
        /// Slots vacated during the pause.
        vacancies: u8,
    },
}

impl SessionPhase {
    /// Derive the phase of a court from its session, if it has one.
    pub fn of(session: Option<&CourtSession>) -> Self {
        let Some(session) = session else {
            return SessionPhase::Empty;
        };

        let occupied = session.lineup.occupied_count() as u8;
        match (session.is_active, session.is_paused) {
            (true, true) => SessionPhase::Paused {
                vacancies: 4 - occupied,
            },
            (true, false) => SessionPhase::Active,
            (false, _) => match occupied {
                0 => SessionPhase::Empty,
                4 => SessionPhase::Ready,
                occupied => SessionPhase::Filling { occupied },
            },
        }
    }

    /// Whether slots may be written in this phase.
    pub fn accepts_lineup_changes(self) -> bool {
        !matches!(self, SessionPhase::Active)
    }
}

/// Events that move a court between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A player took an empty slot.
    SlotAssigned,
    /// A slot was emptied.
    SlotCleared,
    /// The game starts.
    Start,
    /// The game is paused.
    Pause,
    /// The paused game continues.
    Resume,
    /// The game is over; the session is archived and removed.
    End,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the court was in when the event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Compute the phase reached by applying `event` in phase `from`.
///
/// Ending a game leads back to [`SessionPhase::Empty`]: the session is removed and the next
/// assignment creates a fresh one.
pub fn transition(
    from: SessionPhase,
    event: SessionEvent,
) -> Result<SessionPhase, InvalidTransition> {
    let next = match (from, event) {
        (SessionPhase::Empty, SessionEvent::SlotAssigned) => SessionPhase::Filling { occupied: 1 },
        (SessionPhase::Filling { occupied: 3 }, SessionEvent::SlotAssigned) => SessionPhase::Ready,
        (SessionPhase::Filling { occupied }, SessionEvent::SlotAssigned) => SessionPhase::Filling {
            occupied: occupied + 1,
        },
        (SessionPhase::Paused { vacancies }, SessionEvent::SlotAssigned) if vacancies > 0 => {
            SessionPhase::Paused {
                vacancies: vacancies - 1,
            }
        }
        (SessionPhase::Filling { occupied: 1 }, SessionEvent::SlotCleared) => SessionPhase::Empty,
        (SessionPhase::Filling { occupied }, SessionEvent::SlotCleared) => SessionPhase::Filling {
            occupied: occupied - 1,
        },
        (SessionPhase::Ready, SessionEvent::SlotCleared) => SessionPhase::Filling { occupied: 3 },
        (SessionPhase::Paused { vacancies }, SessionEvent::SlotCleared) if vacancies < 4 => {
            SessionPhase::Paused {
                vacancies: vacancies + 1,
            }
        }
        (SessionPhase::Ready, SessionEvent::Start) => SessionPhase::Active,
        (SessionPhase::Active, SessionEvent::Pause) => SessionPhase::Paused { vacancies: 0 },
        (SessionPhase::Paused { vacancies: 0 }, SessionEvent::Resume) => SessionPhase::Active,
        (SessionPhase::Active | SessionPhase::Paused { .. }, SessionEvent::End) => {
            SessionPhase::Empty
        }
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}
