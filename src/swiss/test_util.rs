//! Helpers for checking pairing invariants and generating tournament
//! histories. Used by the unit tests, the benchmarks and the fuzz targets.
use std::collections::HashMap;

use rand::Rng;

use super::errors::PairingError;
use super::model::{PlayerId, RoundPairings, StandingsRow};
use super::pairing::PairingEngine;
use super::store::TournamentStore;

/// Panics unless `round` is a legal round for `standings`.
///
/// - Every player in the standings is either paired exactly once or has the
///   bye, and nobody else shows up.
/// - There is a bye exactly when the headcount is odd.
/// - The first player of each pairing is ranked above the second.
/// - Every rematch listed is one of the pairings.
pub fn assert_valid_round(standings: &[StandingsRow], round: &RoundPairings) {
    let rank: HashMap<PlayerId, usize> = standings
        .iter()
        .enumerate()
        .map(|(idx, row)| (row.id, idx))
        .collect();

    let mut seen: HashMap<PlayerId, usize> = HashMap::new();
    for pairing in &round.pairings {
        *seen.entry(pairing.id1).or_default() += 1;
        *seen.entry(pairing.id2).or_default() += 1;

        let r1 = rank.get(&pairing.id1);
        let r2 = rank.get(&pairing.id2);
        assert!(
            r1.is_some() && r2.is_some(),
            "Pairing {:?} contains a player not in the standings",
            pairing
        );
        assert!(
            r1 < r2,
            "Pairing {:?} should list the higher ranked player first",
            pairing
        );
    }
    if let Some(bye) = &round.bye {
        assert!(rank.contains_key(&bye.id), "Bye {:?} not in standings", bye);
        assert!(
            !round.pairings.iter().any(|p| p.involves(bye.id)),
            "Player {} has the bye and is also paired",
            bye.id
        );
        *seen.entry(bye.id).or_default() += 1;
    }

    assert_eq!(
        standings.len() % 2 == 1,
        round.bye.is_some(),
        "A bye must be given exactly when the player count is odd"
    );
    assert_eq!(seen.len(), standings.len(), "Every player must be placed");
    for (id, count) in seen {
        assert_eq!(count, 1, "Player {} appears {} times in one round", id, count);
    }
    for rematch in &round.rematches {
        assert!(
            round.pairings.contains(rematch),
            "Rematch {:?} is not one of the pairings",
            rematch
        );
    }
}

/// Pair one round through `engine` and report a random winner for every
/// pairing.
pub fn play_random_round<S: TournamentStore, R: Rng>(
    engine: &PairingEngine,
    store: &mut S,
    rng: &mut R,
) -> Result<RoundPairings, PairingError> {
    let round = engine.pair_round(store)?;
    for pairing in &round.pairings {
        let (winner, loser) = if rng.gen_bool(0.5) {
            (pairing.id1, pairing.id2)
        } else {
            (pairing.id2, pairing.id1)
        };
        store.report_match(winner, Some(loser))?;
    }
    Ok(round)
}

/// Register `num_players` players and play `num_rounds` random rounds.
///
/// Returns every round that was played, in order.
pub fn random_history<S: TournamentStore, R: Rng>(
    engine: &PairingEngine,
    store: &mut S,
    rng: &mut R,
    num_players: usize,
    num_rounds: usize,
) -> Result<Vec<RoundPairings>, PairingError> {
    for idx in 0..num_players {
        store.register_player(&format!("Player-{idx}"))?;
    }
    (0..num_rounds)
        .map(|_| play_random_round(engine, store, rng))
        .collect()
}
