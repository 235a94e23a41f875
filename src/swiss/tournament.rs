use std::collections::BTreeSet;

use tracing::{event, Level};

use super::errors::{PairingError, StoreError};
use super::model::{PlayerId, RoundPairings, StandingsRow};
use super::pairing::{self, PairingEngine};
use super::store::TournamentStore;

/// A Swiss tournament: a store of players and matches plus the engine that
/// pairs them.
///
/// # Example
///
/// ```
/// use rs_swiss::swiss::{store::MemoryStore, Tournament};
///
/// let mut tournament = Tournament::new(MemoryStore::new());
/// let a = tournament.register_player("Bruno Walton").unwrap();
/// let b = tournament.register_player("Boots O'Neal").unwrap();
/// tournament.report_match(a, Some(b)).unwrap();
///
/// let standings = tournament.player_standings().unwrap();
/// assert_eq!(standings[0].id, a);
/// assert!(tournament.check_rematch(b, a).unwrap());
/// ```
#[derive(Debug)]
pub struct Tournament<S> {
    store: S,
    engine: PairingEngine,
}

impl<S: TournamentStore> Tournament<S> {
    /// A tournament using the default pairing configuration
    pub fn new(store: S) -> Self {
        Self::with_engine(store, PairingEngine::default())
    }

    pub fn with_engine(store: S, engine: PairingEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn engine(&self) -> &PairingEngine {
        &self.engine
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Remove all match records, keeping the players.
    pub fn delete_matches(&mut self) -> Result<(), StoreError> {
        self.store.reset_matches()
    }

    /// Remove all players along with their matches.
    pub fn delete_players(&mut self) -> Result<(), StoreError> {
        self.store.reset_players()
    }

    pub fn count_players(&self) -> Result<usize, StoreError> {
        self.store.count_players()
    }

    pub fn register_player(&mut self, name: &str) -> Result<PlayerId, StoreError> {
        self.store.register_player(name)
    }

    /// Players sorted by wins. The first row is the leader, or one of the
    /// leaders if there is a tie.
    pub fn player_standings(&self) -> Result<Vec<StandingsRow>, StoreError> {
        self.store.standings()
    }

    /// Record a result. Pass `None` as the loser to record a bye.
    pub fn report_match(
        &mut self,
        winner: PlayerId,
        loser: Option<PlayerId>,
    ) -> Result<(), StoreError> {
        event!(Level::DEBUG, %winner, ?loser, "Reporting match");
        self.store.report_match(winner, loser)
    }

    /// Pair the next round. On an odd headcount the bye is recorded as part
    /// of the same transaction.
    pub fn swiss_pairings(&mut self) -> Result<RoundPairings, PairingError> {
        self.engine.pair_round(&mut self.store)
    }

    pub fn check_rematch(&self, a: PlayerId, b: PlayerId) -> Result<bool, StoreError> {
        pairing::check_rematch(&self.store, a, b)
    }

    pub fn has_bye(&self, player: PlayerId) -> Result<bool, StoreError> {
        self.store.has_bye(player)
    }

    pub fn top_opponent(
        &self,
        player: PlayerId,
        paired: &BTreeSet<PlayerId>,
    ) -> Result<Option<StandingsRow>, StoreError> {
        pairing::top_opponent(&self.store, player, paired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swiss::pairing::{ByeOrder, PairingEngineBuilder};
    use crate::swiss::store::MemoryStore;
    use crate::swiss::test_util::assert_valid_round;

    fn tournament_with(names: &[&str]) -> (Tournament<MemoryStore>, Vec<PlayerId>) {
        let mut tournament = Tournament::new(MemoryStore::new());
        let ids = names
            .iter()
            .map(|name| tournament.register_player(name).unwrap())
            .collect();
        (tournament, ids)
    }

    #[test]
    fn test_delete_and_count() {
        let (mut tournament, ids) = tournament_with(&["Chandra Nalaar", "Jace Beleren"]);
        assert_eq!(tournament.count_players().unwrap(), 2);
        tournament.report_match(ids[0], Some(ids[1])).unwrap();
        tournament.delete_matches().unwrap();
        assert_eq!(tournament.count_players().unwrap(), 2);
        tournament.delete_players().unwrap();
        assert_eq!(tournament.count_players().unwrap(), 0);
    }

    #[test]
    fn test_pairings_after_one_round() {
        let (mut tournament, ids) =
            tournament_with(&["Twilight Sparkle", "Fluttershy", "Applejack", "Pinkie Pie"]);
        tournament.report_match(ids[0], Some(ids[1])).unwrap();
        tournament.report_match(ids[2], Some(ids[3])).unwrap();

        let round = tournament.swiss_pairings().unwrap();
        let pairs: BTreeSet<BTreeSet<PlayerId>> = round
            .pairings
            .iter()
            .map(|p| [p.id1, p.id2].into_iter().collect())
            .collect();
        let expected: BTreeSet<BTreeSet<PlayerId>> = [
            [ids[0], ids[2]].into_iter().collect(),
            [ids[1], ids[3]].into_iter().collect(),
        ]
        .into_iter()
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test_log::test]
    fn test_five_players_lowest_ranked_bye() {
        let engine = PairingEngineBuilder::new()
            .bye_order(ByeOrder::LowestRanked)
            .build()
            .unwrap();
        let mut tournament = Tournament::with_engine(MemoryStore::new(), engine);
        let ids: Vec<_> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|name| tournament.register_player(name).unwrap())
            .collect();

        let standings = tournament.player_standings().unwrap();
        let round = tournament.swiss_pairings().unwrap();

        assert_eq!(round.bye.as_ref().map(|p| p.id), Some(ids[4]));
        assert!(tournament.has_bye(ids[4]).unwrap());
        assert_eq!(round.pairings.len(), 2);
        assert_eq!((round.pairings[0].id1, round.pairings[0].id2), (ids[0], ids[1]));
        assert_eq!((round.pairings[1].id1, round.pairings[1].id2), (ids[2], ids[3]));
        assert_valid_round(&standings, &round);

        // The bye shows up as a win for E
        let standings = tournament.player_standings().unwrap();
        assert_eq!(standings[0].id, ids[4]);
        assert_eq!(standings[0].wins, 1);
        assert_eq!(standings[0].matches_played, 1);
    }

    #[test]
    fn test_no_players_is_invalid_state() {
        let mut tournament = Tournament::new(MemoryStore::new());
        assert!(matches!(
            tournament.swiss_pairings(),
            Err(PairingError::InvalidState(_))
        ));
    }
}
