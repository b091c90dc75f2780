//! Read-only projections of the club state. Nothing here mutates the state.

use time::OffsetDateTime;

use crate::{
    dto::{
        court::{CourtView, Readiness, SeatView},
        format_duration, format_elapsed, format_timestamp,
        history::{HistoryEntryView, HistorySummary},
        player::PlayerView,
    },
    error::ServiceError,
    services::{assignment_service::PLAYERS_PER_GAME, require_court},
    state::{
        club::{ClubState, Court, CourtId, CourtSession, Player, PlayerId},
        session_machine::SessionPhase,
    },
};

fn player_view(club: &ClubState, player: &Player) -> PlayerView {
    PlayerView {
        id: player.id,
        name: player.name.clone(),
        rank: player.rank,
        game_count: player.game_count,
        last_game_time: player.last_game_time.map(format_timestamp),
        court_name: club
            .seat_of(player.id)
            .and_then(|(court_id, _)| club.courts.get(&court_id))
            .map(|court| court.name.clone()),
    }
}

/// Whole roster in registration order.
pub fn players(club: &ClubState) -> Vec<PlayerView> {
    club.players
        .values()
        .map(|player| player_view(club, player))
        .collect()
}

/// Players not seated anywhere, in registration order.
pub fn available_players(club: &ClubState) -> Vec<PlayerView> {
    club.available_players()
        .into_iter()
        .map(|player| player_view(club, player))
        .collect()
}

/// Running time of a started game as `MM:SS`.
pub fn elapsed(session: &CourtSession, now: OffsetDateTime) -> Option<String> {
    session
        .start_time
        .filter(|_| session.is_active)
        .map(|start| format_elapsed(start, now))
}

fn build_court_view(club: &ClubState, court: &Court, now: OffsetDateTime) -> CourtView {
    let session = club.session(court.id);
    let phase = SessionPhase::of(session);
    let lineup = session
        .map(|session| session.lineup.clone())
        .unwrap_or_default();

    let seat = |id: Option<PlayerId>| {
        id.map(|player_id| {
            let player = club.players.get(&player_id);
            SeatView {
                player_id,
                name: player.map(|player| player.name.clone()),
                rank: player.map(|player| player.rank),
            }
        })
    };
    let strength = |team: [Option<PlayerId>; 2]| {
        team.iter()
            .flatten()
            .map(|id| club.rank_value_of(*id))
            .sum::<u32>()
    };
    let team1_strength = strength(lineup.team1);
    let team2_strength = strength(lineup.team2);
    let available = club.available_players().len();
    let editable = phase.accepts_lineup_changes();

    CourtView {
        court_id: court.id,
        name: court.name.clone(),
        phase: phase.into(),
        status: phase.into(),
        session_id: session.map(|session| session.id),
        team1: lineup.team1.map(&seat),
        team2: lineup.team2.map(&seat),
        team1_strength,
        team2_strength,
        balance: team1_strength.abs_diff(team2_strength),
        shuttlecock_count: session.map_or(0, |session| session.shuttlecock_count),
        started_at: session
            .and_then(|session| session.start_time)
            .map(format_timestamp),
        paused_at: session
            .and_then(|session| session.pause_time)
            .map(format_timestamp),
        elapsed: session.and_then(|session| elapsed(session, now)),
        can_auto_assign: editable && available >= PLAYERS_PER_GAME,
        can_auto_fill: editable
            && match session {
                None => available >= PLAYERS_PER_GAME,
                Some(_) => available > 0 && !lineup.is_full(),
            },
        slots_editable: editable,
    }
}

/// Card of one court.
pub fn court_view(
    club: &ClubState,
    court_id: CourtId,
    now: OffsetDateTime,
) -> Result<CourtView, ServiceError> {
    let court = require_court(club, court_id)?;
    Ok(build_court_view(club, court, now))
}

/// Cards of every court in creation order.
pub fn court_views(club: &ClubState, now: OffsetDateTime) -> Vec<CourtView> {
    club.courts
        .values()
        .map(|court| build_court_view(club, court, now))
        .collect()
}

/// Totals over the history.
pub fn history_summary(club: &ClubState) -> HistorySummary {
    HistorySummary {
        total_games: club.history.len(),
        total_shuttlecocks: club
            .history
            .iter()
            .map(|record| u64::from(record.shuttlecock_count))
            .sum(),
    }
}

/// History rows, most recent first.
pub fn history_entries(club: &ClubState) -> Vec<HistoryEntryView> {
    club.history
        .iter()
        .map(|record| HistoryEntryView {
            id: record.id,
            court_name: record.court_name.clone(),
            team1: record.players.team1.clone().map(|player| player.name),
            team2: record.players.team2.clone().map(|player| player.name),
            started_at: format_timestamp(record.start_time),
            ended_at: format_timestamp(record.end_time),
            duration: format_duration(record.start_time, record.end_time),
            shuttlecock_count: record.shuttlecock_count,
        })
        .collect()
}

/// Whether the club has what it takes to play a game.
pub fn readiness(club: &ClubState) -> Readiness {
    if club.courts.is_empty() {
        Readiness::NoCourts
    } else if club.players.len() < PLAYERS_PER_GAME {
        Readiness::NotEnoughPlayers {
            have: club.players.len(),
        }
    } else {
        Readiness::Ready
    }
}
