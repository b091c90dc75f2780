//! Club-wide resets.

use tracing::info;

use crate::state::club::ClubState;

/// Forget everything: players, courts, live sessions and history.
pub fn hard_reset(club: &mut ClubState) {
    *club = ClubState::default();
    info!("club state wiped");
}

/// Start a new club day: players and courts stay, their counters, live sessions and history go.
pub fn game_reset(club: &mut ClubState) {
    for player in club.players.values_mut() {
        player.game_count = 0;
        player.last_game_time = None;
    }
    club.sessions.clear();
    club.history.clear();
    info!(
        players = club.players.len(),
        courts = club.courts.len(),
        "game counters reset"
    );
}
