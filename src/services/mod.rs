//! Operations over the club state.
//!
//! Every function works on a `&mut ClubState` that the caller treats as a scratch copy: on
//! error the copy may be half-written and must be thrown away.

pub mod assignment_service;
pub mod query_service;
pub mod reset_service;
pub mod roster_service;
pub mod session_service;

use crate::{
    error::ServiceError,
    state::{
        club::{ClubState, Court, CourtId, Player, PlayerId},
        session_machine::SessionPhase,
    },
};

fn require_court(club: &ClubState, court_id: CourtId) -> Result<&Court, ServiceError> {
    club.courts
        .get(&court_id)
        .ok_or_else(|| ServiceError::NotFound(format!("court `{court_id}` not found")))
}

fn require_player(club: &ClubState, player_id: PlayerId) -> Result<&Player, ServiceError> {
    club.players
        .get(&player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))
}

/// Phase of a known court, rejecting courts whose game is running.
fn editable_phase(club: &ClubState, court_id: CourtId) -> Result<SessionPhase, ServiceError> {
    require_court(club, court_id)?;
    let phase = SessionPhase::of(club.session(court_id));
    if !phase.accepts_lineup_changes() {
        return Err(ServiceError::GuardViolation(
            "pause the game before changing players".into(),
        ));
    }
    Ok(phase)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::state::club::{ClubState, Court, CourtId, Player, PlayerId, Rank, Slot};

    /// Register players with the given ranks, returning their ids in order.
    pub fn add_players(club: &mut ClubState, ranks: &[Rank]) -> Vec<PlayerId> {
        ranks
            .iter()
            .enumerate()
            .map(|(index, rank)| {
                let player = Player::new(format!("Player {}", index + 1), *rank);
                let id = player.id;
                club.players.insert(id, player);
                id
            })
            .collect()
    }

    /// Register a court.
    pub fn add_court(club: &mut ClubState, name: &str) -> CourtId {
        let court = Court::new(name.into());
        let id = court.id;
        club.courts.insert(id, court);
        id
    }

    /// Seat four players on a court in fill order.
    pub fn seat_all(club: &mut ClubState, court_id: CourtId, players: &[PlayerId]) {
        let session = club.ensure_session(court_id);
        for (slot, player) in Slot::ALL.into_iter().zip(players) {
            session.lineup.set(slot, Some(*player));
        }
    }
}
