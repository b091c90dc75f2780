//! Automatic seating: balanced auto-assign, greedy auto-fill and single-slot replacement.
//!
//! Every strategy draws from the same queue: free players ordered by fewest games played,
//! then by longest wait since their last game, players who never played first.

use std::cmp::Ordering;

use rand::{RngCore, seq::IndexedRandom};
use tracing::debug;

use crate::{
    error::ServiceError,
    services::editable_phase,
    state::{
        club::{ClubState, CourtId, Lineup, Player, PlayerId, Slot, Team},
        session_machine::{SessionEvent, transition},
    },
};

/// Players needed for one doubles game.
pub const PLAYERS_PER_GAME: usize = 4;

/// The three ways of splitting four players into two pairs.
const SPLITS: [([usize; 2], [usize; 2]); 3] =
    [([0, 1], [2, 3]), ([0, 2], [1, 3]), ([0, 3], [1, 2])];

/// Free players in the order they should be called onto a court.
pub fn priority_order(club: &ClubState) -> Vec<&Player> {
    let mut queue = club.available_players();
    // `None` sorts before any time, so players who never played come first.
    queue.sort_by_key(|player| (player.game_count, player.last_game_time));
    queue
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamStrengths {
    team1: u32,
    team2: u32,
}

impl TeamStrengths {
    fn of(club: &ClubState, lineup: &Lineup, skip: Option<Slot>) -> Self {
        lineup
            .occupants()
            .filter(|(slot, _)| Some(*slot) != skip)
            .fold(Self::default(), |strengths, (slot, id)| {
                strengths.with(slot.team, club.rank_value_of(id))
            })
    }

    fn with(self, team: Team, value: u32) -> Self {
        match team {
            Team::Team1 => Self {
                team1: self.team1 + value,
                ..self
            },
            Team::Team2 => Self {
                team2: self.team2 + value,
                ..self
            },
        }
    }

    fn balance(self) -> u32 {
        self.team1.abs_diff(self.team2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pairing {
    team1: [PlayerId; 2],
    team2: [PlayerId; 2],
    balance: u32,
    total_games: u32,
}

impl Pairing {
    fn score(&self) -> (u32, u32) {
        (self.balance, self.total_games)
    }

    fn lineup(&self) -> Lineup {
        Lineup {
            team1: self.team1.map(Some),
            team2: self.team2.map(Some),
        }
    }
}

/// Every split of every four-player group that ties for the best score.
fn best_pairings(candidates: &[&Player]) -> Vec<Pairing> {
    let mut best: Vec<Pairing> = Vec::new();
    let n = candidates.len();

    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    let group = [candidates[a], candidates[b], candidates[c], candidates[d]];
                    let total_games: u32 = group.iter().map(|player| player.game_count).sum();
                    let strength =
                        |side: [usize; 2]| side.iter().map(|i| group[*i].rank.value()).sum::<u32>();

                    for (left, right) in SPLITS {
                        let pairing = Pairing {
                            team1: left.map(|i| group[i].id),
                            team2: right.map(|i| group[i].id),
                            balance: strength(left).abs_diff(strength(right)),
                            total_games,
                        };
                        match best.first().map(|current| pairing.score().cmp(&current.score())) {
                            Some(Ordering::Greater) => {}
                            Some(Ordering::Equal) => best.push(pairing),
                            Some(Ordering::Less) | None => {
                                best.clear();
                                best.push(pairing);
                            }
                        }
                    }
                }
            }
        }
    }

    best
}

/// Seat the best balanced foursome on a court, replacing whoever sat there.
///
/// The search covers the `pool_size` players at the head of the queue. Among the splits with
/// the smallest strength difference, those with the fewest games played in total win; the
/// remaining ties are broken by `rng`.
pub fn auto_assign(
    club: &mut ClubState,
    court_id: CourtId,
    pool_size: usize,
    rng: &mut dyn RngCore,
) -> Result<Lineup, ServiceError> {
    editable_phase(club, court_id)?;
    let queue = priority_order(club);
    if queue.len() < PLAYERS_PER_GAME {
        return Err(ServiceError::InsufficientPlayers {
            needed: PLAYERS_PER_GAME,
            available: queue.len(),
        });
    }

    let pool = &queue[..queue.len().min(pool_size.max(PLAYERS_PER_GAME))];
    let pairings = best_pairings(pool);
    let chosen = *pairings
        .choose(rng)
        .ok_or_else(|| ServiceError::InvalidState("no team split could be formed".into()))?;

    debug!(
        court_id = %court_id,
        pool = pool.len(),
        balance = chosen.balance,
        total_games = chosen.total_games,
        ties = pairings.len(),
        "auto-assign picked teams"
    );

    let lineup = chosen.lineup();
    club.ensure_session(court_id).lineup = lineup.clone();
    Ok(lineup)
}

fn open_slot(lineup: &Lineup, team: Team) -> Option<Slot> {
    lineup
        .vacant_slots()
        .into_iter()
        .find(|slot| slot.team == team)
}

/// Fill the empty slots of a court from the head of the queue, weakest player first, each on
/// the side that keeps the teams closest. Courts without a session get a full auto-assign.
pub fn auto_fill(
    club: &mut ClubState,
    court_id: CourtId,
    pool_size: usize,
    rng: &mut dyn RngCore,
) -> Result<Lineup, ServiceError> {
    let mut phase = editable_phase(club, court_id)?;
    let Some(session) = club.session(court_id) else {
        return auto_assign(club, court_id, pool_size, rng);
    };

    let mut lineup = session.lineup.clone();
    let vacancies = lineup.vacant_slots().len();
    if vacancies == 0 {
        return Err(ServiceError::InvalidState(
            "every slot on this court is already taken".into(),
        ));
    }

    let queue = priority_order(club);
    if queue.len() < vacancies {
        return Err(ServiceError::InsufficientPlayers {
            needed: vacancies,
            available: queue.len(),
        });
    }
    let mut picks: Vec<(PlayerId, u32)> = queue
        .iter()
        .take(vacancies)
        .map(|player| (player.id, player.rank.value()))
        .collect();
    picks.sort_by_key(|(_, value)| *value);

    let mut strengths = TeamStrengths::of(club, &lineup, None);
    for (player_id, value) in picks {
        let (team, slot) = [Team::Team1, Team::Team2]
            .into_iter()
            .filter_map(|team| open_slot(&lineup, team).map(|slot| (team, slot)))
            .min_by_key(|(team, _)| strengths.with(*team, value).balance())
            .ok_or_else(|| ServiceError::InvalidState("no open slot left".into()))?;

        phase = transition(phase, SessionEvent::SlotAssigned)?;
        lineup.set(slot, Some(player_id));
        strengths = strengths.with(team, value);
        debug!(court_id = %court_id, player_id = %player_id, %slot, "auto-fill seated player");
    }

    club.ensure_session(court_id).lineup = lineup.clone();
    Ok(lineup)
}

/// Swap the player on `slot` for the free player that best evens out the teams, and return
/// the newcomer. The first player in roster order wins ties.
pub fn change_player(
    club: &mut ClubState,
    court_id: CourtId,
    slot: Slot,
) -> Result<PlayerId, ServiceError> {
    editable_phase(club, court_id)?;
    let Some(session) = club
        .session(court_id)
        .filter(|session| session.lineup.get(slot).is_some())
    else {
        return Err(ServiceError::InvalidInput(format!(
            "slot {slot} has no player to change"
        )));
    };

    let strengths = TeamStrengths::of(club, &session.lineup, Some(slot));
    let replacement = club
        .available_players()
        .into_iter()
        .min_by_key(|player| strengths.with(slot.team, player.rank.value()).balance())
        .map(|player| player.id)
        .ok_or(ServiceError::InsufficientPlayers {
            needed: 1,
            available: 0,
        })?;

    let session = club.ensure_session(court_id);
    let previous = session.lineup.get(slot);
    session.lineup.set(slot, Some(replacement));
    debug!(
        court_id = %court_id,
        %slot,
        previous = ?previous,
        replacement = %replacement,
        "player changed"
    );
    Ok(replacement)
}
