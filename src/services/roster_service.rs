//! Player and court registration.

use tracing::{debug, warn};
use validator::Validate;

use crate::{
    dto::roster::{CourtInput, PlayerInput},
    error::ServiceError,
    services::require_court,
    state::{
        club::{ClubState, Court, CourtId, Player, PlayerId},
        session_machine::SessionPhase,
    },
};

/// Register a new player with no games played.
pub fn add_player(club: &mut ClubState, input: PlayerInput) -> Result<Player, ServiceError> {
    input.validate()?;
    let player = Player::new(input.name, input.rank);
    debug!(player_id = %player.id, name = %player.name, rank = %player.rank, "player added");
    club.players.insert(player.id, player.clone());
    Ok(player)
}

/// Replace the record sharing the player's id. Unknown ids are ignored and yield `None`.
pub fn update_player(
    club: &mut ClubState,
    mut player: Player,
) -> Result<Option<Player>, ServiceError> {
    let input = PlayerInput::new(&player.name, player.rank);
    input.validate()?;
    player.name = input.name;

    let Some(existing) = club.players.get_mut(&player.id) else {
        debug!(player_id = %player.id, "update ignored for unknown player");
        return Ok(None);
    };
    *existing = player.clone();
    debug!(player_id = %player.id, "player updated");
    Ok(Some(player))
}

/// Remove a player. Seated players are removed too; their slot keeps the dangling id until
/// the slot is edited or the game ends.
pub fn delete_player(club: &mut ClubState, player_id: PlayerId) -> Result<Player, ServiceError> {
    let Some(player) = club.players.shift_remove(&player_id) else {
        return Err(ServiceError::NotFound(format!(
            "player `{player_id}` not found"
        )));
    };
    if let Some((court_id, slot)) = club.seat_of(player_id) {
        warn!(
            player_id = %player_id,
            court_id = %court_id,
            %slot,
            "deleted a player who is still seated"
        );
    }
    debug!(player_id = %player_id, "player deleted");
    Ok(player)
}

/// Register a new court.
pub fn add_court(club: &mut ClubState, input: CourtInput) -> Result<Court, ServiceError> {
    input.validate()?;
    let court = Court::new(input.name);
    debug!(court_id = %court.id, name = %court.name, "court added");
    club.courts.insert(court.id, court.clone());
    Ok(court)
}

/// Remove a court and its session. Refused while a game is being played on it.
pub fn delete_court(club: &mut ClubState, court_id: CourtId) -> Result<Court, ServiceError> {
    require_court(club, court_id)?;
    if SessionPhase::of(club.session(court_id)) == SessionPhase::Active {
        return Err(ServiceError::GuardViolation(
            "cannot delete a court while a game is in progress".into(),
        ));
    }

    club.sessions.shift_remove(&court_id);
    let court = club
        .courts
        .shift_remove(&court_id)
        .ok_or_else(|| ServiceError::NotFound(format!("court `{court_id}` not found")))?;
    debug!(court_id = %court_id, "court deleted");
    Ok(court)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::test_support::{add_court as seed_court, add_players, seat_all},
        state::club::Rank,
    };

    #[test]
    fn add_player_trims_and_starts_fresh() {
        let mut club = ClubState::default();
        let player = add_player(&mut club, PlayerInput::new("  Ana ", Rank::Pro)).unwrap();

        assert_eq!(player.name, "Ana");
        assert_eq!(player.game_count, 0);
        assert_eq!(player.last_game_time, None);
        assert_eq!(club.players.get(&player.id), Some(&player));
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut club = ClubState::default();
        let err = add_player(&mut club, PlayerInput::new("   ", Rank::Mid)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = add_court(&mut club, CourtInput::new("")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(club.players.is_empty() && club.courts.is_empty());
    }

    #[test]
    fn update_replaces_existing_and_ignores_unknown() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Beginner]);

        let mut edited = club.players[&ids[0]].clone();
        edited.name = " Ben ".into();
        edited.rank = Rank::Mid;
        let updated = update_player(&mut club, edited).unwrap().unwrap();
        assert_eq!(updated.name, "Ben");
        assert_eq!(club.players[&ids[0]].rank, Rank::Mid);

        let stranger = Player::new("Zed".into(), Rank::Pro);
        assert_eq!(update_player(&mut club, stranger).unwrap(), None);
        assert_eq!(club.players.len(), 1);
    }

    #[test]
    fn deleting_a_seated_player_is_allowed() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid; 4]);
        let court = seed_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);

        delete_player(&mut club, ids[0]).unwrap();

        assert!(!club.players.contains_key(&ids[0]));
        assert!(club.session(court).unwrap().lineup.contains(ids[0]));
        assert!(matches!(
            delete_player(&mut club, ids[0]),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn courts_with_a_running_game_cannot_be_deleted() {
        let mut club = ClubState::default();
        let ids = add_players(&mut club, &[Rank::Mid; 4]);
        let court = seed_court(&mut club, "Court 1");
        seat_all(&mut club, court, &ids);
        club.session_mut(court).unwrap().is_active = true;
        club.session_mut(court).unwrap().start_time = Some(time::OffsetDateTime::UNIX_EPOCH);

        assert!(matches!(
            delete_court(&mut club, court),
            Err(ServiceError::GuardViolation(_))
        ));

        club.session_mut(court).unwrap().is_paused = true;
        delete_court(&mut club, court).unwrap();
        assert!(club.courts.is_empty());
        assert!(club.sessions.is_empty());
    }

    #[test]
    fn deleting_an_unknown_court_is_not_found() {
        let mut club = ClubState::default();
        assert!(matches!(
            delete_court(&mut club, uuid::Uuid::new_v4()),
            Err(ServiceError::NotFound(_))
        ));
    }
}
