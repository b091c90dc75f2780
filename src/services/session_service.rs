//! Court session lifecycle: seating players, starting, pausing, resuming and ending games,
//! and counting shuttlecocks.

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::{editable_phase, require_court, require_player},
    state::{
        club::{
            ClubState, CourtId, CourtSession, HistoryRecord, HistoryTeams, Lineup, Player,
            PlayerId, Slot,
        },
        session_machine::{SessionEvent, SessionPhase, transition},
    },
};

fn live_session_mut(
    club: &mut ClubState,
    court_id: CourtId,
) -> Result<&mut CourtSession, ServiceError> {
    club.session_mut(court_id)
        .ok_or_else(|| ServiceError::NotFound(format!("court `{court_id}` has no session")))
}

/// Session of a court whose game has started, paused or not.
fn started_session_mut(
    club: &mut ClubState,
    court_id: CourtId,
) -> Result<&mut CourtSession, ServiceError> {
    require_court(club, court_id)?;
    match club.session_mut(court_id) {
        Some(session) if session.is_active => Ok(session),
        _ => Err(ServiceError::Incomplete(
            "no game is in progress on this court".into(),
        )),
    }
}

fn apply(
    club: &ClubState,
    court_id: CourtId,
    event: SessionEvent,
) -> Result<SessionPhase, ServiceError> {
    require_court(club, court_id)?;
    Ok(transition(SessionPhase::of(club.session(court_id)), event)?)
}

/// Seat a free player on an empty slot, opening a session when the court has none.
pub fn assign_player(
    club: &mut ClubState,
    court_id: CourtId,
    player_id: PlayerId,
    slot: Slot,
) -> Result<Lineup, ServiceError> {
    let phase = editable_phase(club, court_id)?;
    require_player(club, player_id)?;
    if let Some((seated_on, seat)) = club.seat_of(player_id) {
        return Err(ServiceError::Conflict(format!(
            "player `{player_id}` already sits on {seat} of court `{seated_on}`"
        )));
    }
    if club
        .session(court_id)
        .and_then(|session| session.lineup.get(slot))
        .is_some()
    {
        return Err(ServiceError::Conflict(format!("slot {slot} is already taken")));
    }

    transition(phase, SessionEvent::SlotAssigned)?;
    let session = club.ensure_session(court_id);
    session.lineup.set(slot, Some(player_id));

    debug!(court_id = %court_id, player_id = %player_id, %slot, "player seated");
    Ok(session.lineup.clone())
}

/// Empty a slot and return who sat there. Clearing an empty slot changes nothing.
///
/// A session that was never started and ends up with nobody on it is dropped.
pub fn remove_player(
    club: &mut ClubState,
    court_id: CourtId,
    slot: Slot,
) -> Result<Option<PlayerId>, ServiceError> {
    let phase = editable_phase(club, court_id)?;
    let Some(session) = club.session_mut(court_id) else {
        return Ok(None);
    };
    let Some(previous) = session.lineup.get(slot) else {
        return Ok(None);
    };

    let next = transition(phase, SessionEvent::SlotCleared)?;
    session.lineup.set(slot, None);

    if next == SessionPhase::Empty {
        club.sessions.shift_remove(&court_id);
        debug!(court_id = %court_id, "empty session dropped");
    }
    debug!(court_id = %court_id, player_id = %previous, %slot, "player unseated");
    Ok(Some(previous))
}

/// Start the game on a full court.
pub fn start_session(
    club: &mut ClubState,
    court_id: CourtId,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    apply(club, court_id, SessionEvent::Start)?;
    let session = live_session_mut(club, court_id)?;
    session.is_active = true;
    session.is_paused = false;
    session.pause_time = None;
    session.start_time = Some(now);

    info!(court_id = %court_id, session_id = %session.id, "game started");
    Ok(())
}

/// Pause a running game; the line-up becomes editable.
pub fn pause_session(
    club: &mut ClubState,
    court_id: CourtId,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    apply(club, court_id, SessionEvent::Pause)?;
    let session = live_session_mut(club, court_id)?;
    session.is_paused = true;
    session.pause_time = Some(now);

    info!(court_id = %court_id, session_id = %session.id, "game paused");
    Ok(())
}

/// Resume a paused game. Every slot must be filled again.
pub fn resume_session(club: &mut ClubState, court_id: CourtId) -> Result<(), ServiceError> {
    apply(club, court_id, SessionEvent::Resume)?;
    let session = live_session_mut(club, court_id)?;
    session.is_paused = false;
    session.pause_time = None;

    info!(court_id = %court_id, session_id = %session.id, "game resumed");
    Ok(())
}

fn snapshot(club: &ClubState, seat: Option<PlayerId>) -> Result<Player, ServiceError> {
    let id = seat.ok_or_else(|| {
        ServiceError::Incomplete("all player slots must be filled to end the game".into())
    })?;
    require_player(club, id).cloned()
}

/// End the game: archive it at the top of the history and count it for its four players.
///
/// The record holds the players as they were before the game was counted.
pub fn end_session(
    club: &mut ClubState,
    court_id: CourtId,
    shuttlecock_count: u32,
    now: OffsetDateTime,
) -> Result<HistoryRecord, ServiceError> {
    apply(club, court_id, SessionEvent::End)?;
    let court_name = require_court(club, court_id)?.name.clone();
    let session = club
        .session(court_id)
        .ok_or_else(|| ServiceError::NotFound(format!("court `{court_id}` has no session")))?;
    let start_time = session.start_time.ok_or_else(|| {
        ServiceError::InvalidState("the game on this court has no start time".into())
    })?;
    let lineup = session.lineup.clone();

    let players = HistoryTeams {
        team1: [
            snapshot(club, lineup.team1[0])?,
            snapshot(club, lineup.team1[1])?,
        ],
        team2: [
            snapshot(club, lineup.team2[0])?,
            snapshot(club, lineup.team2[1])?,
        ],
    };
    let record = HistoryRecord {
        id: Uuid::new_v4(),
        court_id,
        court_name,
        players,
        start_time,
        end_time: now,
        shuttlecock_count,
    };

    club.sessions.shift_remove(&court_id);
    for (_, player_id) in lineup.occupants() {
        if let Some(player) = club.players.get_mut(&player_id) {
            player.game_count = player.game_count.saturating_add(1);
            player.last_game_time = Some(now);
        }
    }
    club.history.insert(0, record.clone());

    info!(
        court_id = %court_id,
        history_id = %record.id,
        shuttlecocks = shuttlecock_count,
        "game ended"
    );
    Ok(record)
}

/// Count one more shuttlecock on a started game and return the new count.
pub fn increment_shuttlecock(club: &mut ClubState, court_id: CourtId) -> Result<u32, ServiceError> {
    let session = started_session_mut(club, court_id)?;
    session.shuttlecock_count = session.shuttlecock_count.saturating_add(1);
    debug!(court_id = %court_id, count = session.shuttlecock_count, "shuttlecock added");
    Ok(session.shuttlecock_count)
}

/// Take one shuttlecock back, never going below zero, and return the new count.
pub fn decrement_shuttlecock(club: &mut ClubState, court_id: CourtId) -> Result<u32, ServiceError> {
    let session = started_session_mut(club, court_id)?;
    session.shuttlecock_count = session.shuttlecock_count.saturating_sub(1);
    debug!(court_id = %court_id, count = session.shuttlecock_count, "shuttlecock removed");
    Ok(session.shuttlecock_count)
}

#[cfg(test)]
mod tests {
    use time::{Duration, macros::datetime};

    use super::*;
    use crate::{
        services::test_support::{add_court, add_players, seat_all},
        state::club::{Position, Rank, Team},
    };

    const NOW: OffsetDateTime = datetime!(2024-05-04 18:00:00 UTC);

    fn started_court() -> (ClubState, CourtId, Vec<PlayerId>) {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Beginner, Rank::Mid, Rank::Mid, Rank::Pro]);
        let court = add_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);
        start_session(&mut club, court, NOW).unwrap();
        (club, court, ids)
    }

    #[test]
    fn first_assignment_opens_a_session() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid]);
        let court = add_court(&mut club, "Court 1");

        let lineup = assign_player(&mut club, court, ids[0], Slot::ALL[1]).unwrap();

        assert_eq!(lineup.get(Slot::ALL[1]), Some(ids[0]));
        assert_eq!(
            SessionPhase::of(club.session(court)),
            SessionPhase::Filling { occupied: 1 }
        );
    }

    #[test]
    fn a_player_sits_in_one_slot_only() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid, Rank::Pro]);
        let court1 = add_court(&mut club, "Court 1");
        let court2 = add_court(&mut club, "Court 2");
        assign_player(&mut club, court1, ids[0], Slot::ALL[0]).unwrap();

        let elsewhere = assign_player(&mut club, court2, ids[0], Slot::ALL[0]).unwrap_err();
        assert!(matches!(elsewhere, ServiceError::Conflict(_)));
        let same_court = assign_player(&mut club, court1, ids[0], Slot::ALL[3]).unwrap_err();
        assert!(matches!(same_court, ServiceError::Conflict(_)));
        let taken = assign_player(&mut club, court1, ids[1], Slot::ALL[0]).unwrap_err();
        assert!(matches!(taken, ServiceError::Conflict(_)));

        assert!(club.session(court2).is_none());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid]);
        let court = add_court(&mut club, "Court 1");

        assert!(matches!(
            assign_player(&mut club, Uuid::new_v4(), ids[0], Slot::ALL[0]),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            assign_player(&mut club, court, Uuid::new_v4(), Slot::ALL[0]),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn lineup_is_locked_until_paused() {
        let (mut club, court, ids) = started_court();
        let extra = add_players(&mut club, &[Rank::Pro])[0];

        assert!(matches!(
            remove_player(&mut club, court, Slot::ALL[0]),
            Err(ServiceError::GuardViolation(_))
        ));

        pause_session(&mut club, court, NOW + Duration::minutes(5)).unwrap();
        assert_eq!(
            remove_player(&mut club, court, Slot::ALL[0]).unwrap(),
            Some(ids[0])
        );
        assign_player(&mut club, court, extra, Slot::ALL[0]).unwrap();
        assert_eq!(
            club.session(court).unwrap().lineup.get(Slot::ALL[0]),
            Some(extra)
        );
    }

    #[test]
    fn clearing_the_last_player_drops_an_unstarted_session() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid]);
        let court = add_court(&mut club, "Court 1");
        let slot = Slot::new(Team::Team2, Position::Second);
        assign_player(&mut club, court, ids[0], slot).unwrap();

        assert_eq!(remove_player(&mut club, court, slot).unwrap(), Some(ids[0]));
        assert!(club.session(court).is_none());
        assert_eq!(remove_player(&mut club, court, slot).unwrap(), None);
    }

    #[test]
    fn start_requires_a_full_court() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid; 3]);
        let court = add_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);

        let err = start_session(&mut club, court, NOW).unwrap_err();
        assert!(matches!(err, ServiceError::Incomplete(_)));
        assert!(!club.session(court).unwrap().is_active);
        assert!(club.session(court).unwrap().start_time.is_none());
    }

    #[test]
    fn start_stamps_the_session() {
        let (mut club, court, _) = started_court();
        let session = club.session(court).unwrap();
        assert!(session.is_active);
        assert_eq!(session.start_time, Some(NOW));

        assert!(matches!(
            start_session(&mut club, court, NOW),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn pause_and_resume_toggle_the_flags() {
        let (mut club, court, _) = started_court();
        let paused_at = NOW + Duration::minutes(3);

        assert!(matches!(
            resume_session(&mut club, court),
            Err(ServiceError::InvalidState(_))
        ));
        pause_session(&mut club, court, paused_at).unwrap();
        let session = club.session(court).unwrap();
        assert!(session.is_paused);
        assert_eq!(session.pause_time, Some(paused_at));
        assert!(matches!(
            pause_session(&mut club, court, paused_at),
            Err(ServiceError::InvalidState(_))
        ));

        resume_session(&mut club, court).unwrap();
        let session = club.session(court).unwrap();
        assert!(!session.is_paused);
        assert_eq!(session.pause_time, None);
    }

    #[test]
    fn resume_needs_every_slot_filled() {
        let (mut club, court, _) = started_court();
        pause_session(&mut club, court, NOW).unwrap();
        remove_player(&mut club, court, Slot::ALL[2]).unwrap();

        let err = resume_session(&mut club, court).unwrap_err();
        assert!(matches!(err, ServiceError::Incomplete(_)));
        assert!(club.session(court).unwrap().is_paused);
    }

    #[test]
    fn ending_a_game_counts_it_for_every_player() {
        let (mut club, court, ids) = started_court();
        let end = NOW + Duration::minutes(21);

        let record = end_session(&mut club, court, 3, end).unwrap();

        assert!(club.session(court).is_none());
        assert_eq!(club.history.len(), 1);
        assert_eq!(club.history[0], record);
        assert_eq!(record.shuttlecock_count, 3);
        assert_eq!(record.start_time, NOW);
        assert_eq!(record.end_time, end);
        assert_eq!(record.court_name, "Court 1");
        for id in &ids {
            let player = &club.players[id];
            assert_eq!(player.game_count, 1);
            assert_eq!(player.last_game_time, Some(end));
        }
        assert_eq!(record.players.team1[0].id, ids[0]);
        assert_eq!(record.players.team1[0].game_count, 0);
        assert_eq!(record.players.team2[1].last_game_time, None);
    }

    #[test]
    fn newest_game_is_first_in_history() {
        let (mut club, court, ids) = started_court();
        let first = end_session(&mut club, court, 1, NOW + Duration::minutes(10)).unwrap();
        seat_all(&mut club, court, &ids);
        start_session(&mut club, court, NOW + Duration::minutes(11)).unwrap();
        let second = end_session(&mut club, court, 2, NOW + Duration::minutes(30)).unwrap();

        assert_eq!(club.history, vec![second, first]);
        assert_eq!(club.players[&ids[0]].game_count, 2);
    }

    #[test]
    fn ending_requires_a_started_game() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid; 4]);
        let court = add_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);

        let err = end_session(&mut club, court, 0, NOW).unwrap_err();
        assert!(matches!(err, ServiceError::Incomplete(_)));
        assert!(club.history.is_empty());
    }

    #[test]
    fn ending_with_a_vanished_player_aborts() {
        let (mut club, court, ids) = started_court();
        club.players.shift_remove(&ids[1]);
        let before = club.clone();

        let err = end_session(&mut club, court, 0, NOW).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(club, before);
    }

    #[test]
    fn shuttlecock_count_never_goes_negative() {
        let (mut club, court, _) = started_court();
        assert_eq!(decrement_shuttlecock(&mut club, court).unwrap(), 0);
        assert_eq!(increment_shuttlecock(&mut club, court).unwrap(), 1);
        assert_eq!(increment_shuttlecock(&mut club, court).unwrap(), 2);
        assert_eq!(decrement_shuttlecock(&mut club, court).unwrap(), 1);

        pause_session(&mut club, court, NOW).unwrap();
        assert_eq!(increment_shuttlecock(&mut club, court).unwrap(), 2);
    }

    #[test]
    fn shuttlecocks_need_a_started_game() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid; 4]);
        let court = add_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);

        assert!(matches!(
            increment_shuttlecock(&mut club, court),
            Err(ServiceError::Incomplete(_))
        ));
        assert_eq!(club.session(court).unwrap().shuttlecock_count, 0);
    }
}
