use std::collections::{BTreeSet, HashMap};

use tracing::{debug, event, instrument, trace, warn, Level};

use crate::swiss::errors::{PairingError, StoreError};
use crate::swiss::model::{MatchRecord, Pairing, PlayerId, RoundPairings, StandingsRow};
use crate::swiss::store::TournamentStore;

use super::config::{ByeOrder, PairingConfig, RematchPolicy};

/// Computes the pairings for the next round of a Swiss tournament.
///
/// Players are taken in standings order. Each unpaired player is matched
/// with the best ranked player left that they haven't met yet. When that
/// greedy pass would force a rematch further down the table, a bounded
/// backtracking search looks for a round with no rematches at all. If there
/// isn't one, [`RematchPolicy`] decides between allowing the greedy round
/// with its rematches or failing.
#[derive(Debug, Clone, Default)]
pub struct PairingEngine {
    config: PairingConfig,
}

impl PairingEngine {
    pub fn new(config: PairingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Pair the next round and record the bye, if there is one.
    ///
    /// Reading the standings, reading the history and writing the bye all
    /// happen in a single [`TournamentStore::atomically`] call. If pairing
    /// fails no bye is recorded.
    #[instrument(level = "debug", skip(self, store))]
    pub fn pair_round<S: TournamentStore>(
        &self,
        store: &mut S,
    ) -> Result<RoundPairings, PairingError> {
        store.atomically(|store| {
            let standings = store.standings()?;
            let history = store.matches()?;
            let round = self.plan_round(&standings, &history)?;
            if let Some(bye) = &round.bye {
                debug!(player = %bye.id, "Recording bye");
                store.report_match(bye.id, None)?;
            }
            Ok(round)
        })
    }

    /// Work out the pairings for a round without touching any store.
    ///
    /// `standings` must already be in rank order. `history` is every match
    /// played so far and is used to find prior opponents and prior byes.
    pub fn plan_round(
        &self,
        standings: &[StandingsRow],
        history: &[MatchRecord],
    ) -> Result<RoundPairings, PairingError> {
        if standings.is_empty() {
            return Err(PairingError::InvalidState(
                "can't pair a round with no players".to_string(),
            ));
        }

        let mut opponents: HashMap<PlayerId, BTreeSet<PlayerId>> = HashMap::new();
        let mut byes: HashMap<PlayerId, usize> = HashMap::new();
        for record in history {
            match record.loser {
                Some(loser) => {
                    opponents.entry(record.winner).or_default().insert(loser);
                    opponents.entry(loser).or_default().insert(record.winner);
                }
                None => *byes.entry(record.winner).or_default() += 1,
            }
        }

        let bye_idx = if standings.len() % 2 == 1 {
            Some(self.pick_bye(standings, &byes))
        } else {
            None
        };

        // The pool is everyone still to be paired, in rank order.
        let pool: Vec<&StandingsRow> = standings
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != bye_idx)
            .map(|(_, row)| row)
            .collect();

        let played: Vec<Vec<bool>> = pool
            .iter()
            .map(|a| {
                let seen = opponents.get(&a.id);
                pool.iter()
                    .map(|b| seen.is_some_and(|s| s.contains(&b.id)))
                    .collect()
            })
            .collect();

        let pairs = self.pair_pool(&pool, &played)?;

        let mut round = RoundPairings {
            bye: bye_idx.map(|idx| standings[idx].player()),
            ..Default::default()
        };
        for (a, b) in pairs {
            let pairing = Pairing::new(pool[a], pool[b]);
            if played[a][b] {
                round.rematches.push(pairing.clone());
            }
            round.pairings.push(pairing);
        }

        event!(
            Level::INFO,
            num_players = standings.len(),
            num_pairings = round.pairings.len(),
            bye = ?round.bye.as_ref().map(|p| p.id),
            rematches = round.rematches.len(),
            "Paired round"
        );
        Ok(round)
    }

    /// Index into `standings` of the player who sits out this round.
    ///
    /// The first player in bye order with no bye gets it. Once everyone has
    /// had one, the first player with the fewest byes gets another.
    fn pick_bye(&self, standings: &[StandingsRow], byes: &HashMap<PlayerId, usize>) -> usize {
        let order: Box<dyn Iterator<Item = usize>> = match self.config.bye_order {
            ByeOrder::HighestRanked => Box::new(0..standings.len()),
            ByeOrder::LowestRanked => Box::new((0..standings.len()).rev()),
        };

        let mut best: Option<(usize, usize)> = None;
        for idx in order {
            let count = byes.get(&standings[idx].id).copied().unwrap_or(0);
            if count == 0 {
                trace!(player = %standings[idx].id, "Awarding first bye");
                return idx;
            }
            if best.map_or(true, |(_, fewest)| count < fewest) {
                best = Some((idx, count));
            }
        }

        // standings is never empty here so best is always set
        let (idx, count) = best.unwrap_or((0, 0));
        warn!(
            player = %standings[idx].id,
            prior_byes = count,
            "Every player has had a bye, awarding a repeat bye"
        );
        idx
    }

    fn pair_pool(
        &self,
        pool: &[&StandingsRow],
        played: &[Vec<bool>],
    ) -> Result<Vec<(usize, usize)>, PairingError> {
        let greedy = greedy_pairs(played)?;
        let first_rematch = greedy.iter().find(|(a, b)| played[*a][*b]).copied();
        let Some((a, b)) = first_rematch else {
            return Ok(greedy);
        };

        debug!(
            player = %pool[a].id,
            opponent = %pool[b].id,
            "Greedy pairing forces a rematch, searching for an alternative"
        );
        if let Some(pairs) = RematchFreeSearch::run(played, self.config.max_search_steps) {
            return Ok(pairs);
        }

        match self.config.rematch_policy {
            RematchPolicy::Allow => {
                warn!(
                    rematches = greedy.iter().filter(|(a, b)| played[*a][*b]).count(),
                    "No rematch free pairing found, falling back to next best ranked opponents"
                );
                Ok(greedy)
            }
            RematchPolicy::Forbid => Err(PairingError::ExhaustedOpponents(pool[a].id)),
        }
    }
}

/// Pair everyone in rank order, each with the best ranked unpaired player
/// they haven't played. If none is left, the best ranked unpaired player.
fn greedy_pairs(played: &[Vec<bool>]) -> Result<Vec<(usize, usize)>, PairingError> {
    let n = played.len();
    let mut paired = vec![false; n];
    let mut pairs = Vec::with_capacity(n / 2);

    for player in 0..n {
        if paired[player] {
            continue;
        }
        paired[player] = true;
        let opponent = next_opponent(player, &paired, played).ok_or_else(|| {
            PairingError::InvalidState("odd number of players left to pair".to_string())
        })?;
        paired[opponent] = true;
        pairs.push((player, opponent));
    }
    Ok(pairs)
}

fn next_opponent(player: usize, paired: &[bool], played: &[Vec<bool>]) -> Option<usize> {
    let mut fallback = None;
    for candidate in player + 1..paired.len() {
        if paired[candidate] {
            continue;
        }
        if !played[player][candidate] {
            return Some(candidate);
        }
        fallback = fallback.or(Some(candidate));
    }
    fallback
}

enum SearchOutcome {
    Found,
    Exhausted,
    OutOfSteps,
}

/// Depth first search over pairings that never repeat a match.
///
/// Candidates are tried in rank order so the first complete pairing found
/// is the one closest to the greedy pass. A branch is dropped as soon as
/// some unpaired player has nobody new left to play.
struct RematchFreeSearch<'a> {
    played: &'a [Vec<bool>],
    paired: Vec<bool>,
    pairs: Vec<(usize, usize)>,
    steps: usize,
    max_steps: usize,
}

impl<'a> RematchFreeSearch<'a> {
    fn run(played: &'a [Vec<bool>], max_steps: usize) -> Option<Vec<(usize, usize)>> {
        let mut search = Self {
            played,
            paired: vec![false; played.len()],
            pairs: Vec::with_capacity(played.len() / 2),
            steps: 0,
            max_steps,
        };
        match search.extend() {
            SearchOutcome::Found => {
                debug!(steps = search.steps, "Found rematch free pairing");
                Some(search.pairs)
            }
            SearchOutcome::Exhausted => {
                debug!(steps = search.steps, "No rematch free pairing exists");
                None
            }
            SearchOutcome::OutOfSteps => {
                warn!(max_steps = search.max_steps, "Gave up searching for a rematch free pairing");
                None
            }
        }
    }

    fn extend(&mut self) -> SearchOutcome {
        let Some(first) = self.paired.iter().position(|p| !p) else {
            return SearchOutcome::Found;
        };
        self.paired[first] = true;

        for candidate in first + 1..self.paired.len() {
            if self.paired[candidate] || self.played[first][candidate] {
                continue;
            }
            if self.steps == self.max_steps {
                return SearchOutcome::OutOfSteps;
            }
            self.steps += 1;
            self.paired[candidate] = true;
            self.pairs.push((first, candidate));
            let outcome = if self.has_stranded_player() {
                SearchOutcome::Exhausted
            } else {
                self.extend()
            };
            match outcome {
                SearchOutcome::Exhausted => {
                    self.pairs.pop();
                    self.paired[candidate] = false;
                }
                outcome => return outcome,
            }
        }

        self.paired[first] = false;
        SearchOutcome::Exhausted
    }

    /// Is there an unpaired player who has already met everyone else still
    /// unpaired?
    fn has_stranded_player(&self) -> bool {
        let n = self.paired.len();
        (0..n).filter(|&p| !self.paired[p]).any(|p| {
            !(0..n).any(|q| q != p && !self.paired[q] && !self.played[p][q])
        })
    }
}

/// Have these two players already met? The answer doesn't depend on the
/// order the ids are given in.
pub fn check_rematch<S: TournamentStore>(
    store: &S,
    a: PlayerId,
    b: PlayerId,
) -> Result<bool, StoreError> {
    Ok(store.prior_opponents(a)?.contains(&b))
}

/// The best ranked player that `player` hasn't met, skipping anyone in
/// `paired`.
///
/// Returns `None` when every remaining player is a rematch.
pub fn top_opponent<S: TournamentStore>(
    store: &S,
    player: PlayerId,
    paired: &BTreeSet<PlayerId>,
) -> Result<Option<StandingsRow>, StoreError> {
    let opponents = store.prior_opponents(player)?;
    Ok(store
        .standings()?
        .into_iter()
        .find(|row| row.id != player && !paired.contains(&row.id) && !opponents.contains(&row.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swiss::store::{FailingStore, MemoryStore};
    use crate::swiss::test_util::assert_valid_round;

    fn row(id: i64, name: &str, wins: u32, matches: u32) -> StandingsRow {
        StandingsRow::new(PlayerId(id), name, wins, matches)
    }

    fn unranked(n: i64) -> Vec<StandingsRow> {
        (1..=n).map(|id| row(id, &format!("P{id}"), 0, 0)).collect()
    }

    fn ids(round: &RoundPairings) -> Vec<(i64, i64)> {
        round
            .pairings
            .iter()
            .map(|p| (p.id1.0, p.id2.0))
            .collect()
    }

    fn played(a: i64, b: i64) -> MatchRecord {
        MatchRecord::new(PlayerId(a), PlayerId(b))
    }

    #[test]
    fn test_pairs_adjacent_players() {
        let standings = vec![
            row(1, "A", 3, 3),
            row(2, "B", 3, 3),
            row(3, "C", 2, 2),
            row(4, "D", 0, 2),
        ];
        let round = PairingEngine::default().plan_round(&standings, &[]).unwrap();

        assert_eq!(
            round.pairings.iter().map(Pairing::as_tuple).collect::<Vec<_>>(),
            vec![
                (PlayerId(1), "A", PlayerId(2), "B"),
                (PlayerId(3), "C", PlayerId(4), "D"),
            ]
        );
        assert!(round.bye.is_none());
        assert!(round.is_rematch_free());
    }

    #[test]
    fn test_empty_standings_is_invalid() {
        let result = PairingEngine::default().plan_round(&[], &[]);
        assert!(matches!(result, Err(PairingError::InvalidState(_))));
    }

    #[test]
    fn test_single_player_gets_bye() {
        let standings = unranked(1);
        let round = PairingEngine::default().plan_round(&standings, &[]).unwrap();
        assert!(round.pairings.is_empty());
        assert_eq!(round.bye.map(|p| p.id), Some(PlayerId(1)));
    }

    #[test]
    fn test_even_counts_cover_everyone_once() {
        let engine = PairingEngine::default();
        for n in (2..=16).step_by(2) {
            let standings = unranked(n);
            let round = engine.plan_round(&standings, &[]).unwrap();
            assert_eq!(round.pairings.len() as i64, n / 2);
            assert_valid_round(&standings, &round);
        }
    }

    #[test]
    fn test_odd_count_bye_goes_to_top_player_by_default() {
        let standings = unranked(5);
        let round = PairingEngine::default().plan_round(&standings, &[]).unwrap();
        assert_eq!(round.bye.as_ref().map(|p| p.id), Some(PlayerId(1)));
        assert_eq!(ids(&round), vec![(2, 3), (4, 5)]);
        assert_valid_round(&standings, &round);
    }

    #[test]
    fn test_odd_count_lowest_ranked_bye() {
        let engine = PairingEngine::new(PairingConfig {
            bye_order: ByeOrder::LowestRanked,
            ..Default::default()
        });
        let standings = unranked(5);
        let round = engine.plan_round(&standings, &[]).unwrap();
        assert_eq!(round.bye.as_ref().map(|p| p.id), Some(PlayerId(5)));
        assert_eq!(ids(&round), vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_bye_skips_players_who_had_one() {
        let standings = vec![
            row(1, "A", 2, 2),
            row(2, "B", 1, 1),
            row(3, "C", 1, 1),
            row(4, "D", 0, 1),
            row(5, "E", 0, 1),
        ];
        let history = vec![
            MatchRecord::bye(PlayerId(1)),
            played(1, 4),
            MatchRecord::bye(PlayerId(2)),
            played(3, 5),
        ];
        let round = PairingEngine::default()
            .plan_round(&standings, &history)
            .unwrap();
        assert_eq!(round.bye.as_ref().map(|p| p.id), Some(PlayerId(3)));
        assert_valid_round(&standings, &round);
    }

    #[test]
    fn test_repeat_bye_goes_to_fewest_byes() {
        let standings = unranked(3);
        let history = vec![
            MatchRecord::bye(PlayerId(1)),
            MatchRecord::bye(PlayerId(1)),
            MatchRecord::bye(PlayerId(2)),
            MatchRecord::bye(PlayerId(3)),
        ];
        let round = PairingEngine::default()
            .plan_round(&standings, &history)
            .unwrap();
        assert_eq!(round.bye.as_ref().map(|p| p.id), Some(PlayerId(2)));
        assert_eq!(ids(&round), vec![(1, 3)]);
    }

    #[test]
    fn test_skips_prior_opponent() {
        let standings = unranked(4);
        let round = PairingEngine::default()
            .plan_round(&standings, &[played(1, 2)])
            .unwrap();
        assert_eq!(ids(&round), vec![(1, 3), (2, 4)]);
        assert!(round.is_rematch_free());
    }

    #[test_log::test]
    fn test_backtracks_to_avoid_forced_rematch() {
        // Greedy would take 1-2 and then be stuck with 3-4 again.
        let standings = unranked(4);
        let round = PairingEngine::default()
            .plan_round(&standings, &[played(3, 4)])
            .unwrap();
        assert_eq!(ids(&round), vec![(1, 3), (2, 4)]);
        assert!(round.is_rematch_free());
    }

    #[test]
    fn test_search_budget_falls_back_to_greedy() {
        let engine = PairingEngine::new(PairingConfig {
            max_search_steps: 1,
            ..Default::default()
        });
        let round = engine
            .plan_round(&unranked(4), &[played(3, 4)])
            .unwrap();
        assert_eq!(ids(&round), vec![(1, 2), (3, 4)]);
        assert_eq!(round.rematches.len(), 1);
        assert_eq!(round.rematches[0].id1, PlayerId(3));
    }

    /// Player 14 has beaten everyone except player 1, so the only way
    /// to avoid a rematch is to pair 1 with 14 and shift everyone else.
    fn lopsided_history() -> Vec<MatchRecord> {
        (2..=13).map(|loser| played(14, loser)).collect()
    }

    #[test_log::test]
    fn test_finds_rematch_free_round_for_player_stuck_at_the_bottom() {
        let standings = unranked(14);
        let round = PairingEngine::default()
            .plan_round(&standings, &lopsided_history())
            .unwrap();
        assert!(round.is_rematch_free());
        assert_eq!(
            ids(&round),
            vec![(1, 14), (2, 3), (4, 5), (6, 7), (8, 9), (10, 11), (12, 13)]
        );
        assert_valid_round(&standings, &round);
    }

    #[test]
    fn test_stranded_player_prunes_search() {
        // Dead branches are cut right away, so a small budget is enough.
        let engine = PairingEngine::new(PairingConfig {
            rematch_policy: RematchPolicy::Forbid,
            max_search_steps: 32,
            ..Default::default()
        });
        let round = engine
            .plan_round(&unranked(14), &lopsided_history())
            .unwrap();
        assert!(round.is_rematch_free());
        assert_eq!(round.pairings[0].as_tuple().2, PlayerId(14));
    }

    #[test_log::test]
    fn test_forced_rematch_is_allowed_by_default() {
        let standings = unranked(2);
        let round = PairingEngine::default()
            .plan_round(&standings, &[played(2, 1)])
            .unwrap();
        assert_eq!(ids(&round), vec![(1, 2)]);
        assert_eq!(round.rematches, round.pairings);
    }

    #[test]
    fn test_fallback_picks_next_best_ranked() {
        // Everyone has played everyone, so each player takes the next one down.
        let standings = unranked(4);
        let history = vec![
            played(1, 2),
            played(1, 3),
            played(1, 4),
            played(2, 3),
            played(2, 4),
            played(3, 4),
        ];
        let round = PairingEngine::default()
            .plan_round(&standings, &history)
            .unwrap();
        assert_eq!(ids(&round), vec![(1, 2), (3, 4)]);
        assert_eq!(round.rematches.len(), 2);
    }

    #[test]
    fn test_forbidden_rematch_is_an_error() {
        let engine = PairingEngine::new(PairingConfig {
            rematch_policy: RematchPolicy::Forbid,
            ..Default::default()
        });
        let result = engine.plan_round(&unranked(2), &[played(1, 2)]);
        assert!(matches!(
            result,
            Err(PairingError::ExhaustedOpponents(PlayerId(1)))
        ));

        // When there is a way around the rematch, forbidding is fine
        let round = engine.plan_round(&unranked(4), &[played(3, 4)]).unwrap();
        assert!(round.is_rematch_free());
    }

    #[test]
    fn test_pair_round_records_bye() {
        let mut store = MemoryStore::new();
        for name in ["A", "B", "C"] {
            store.register_player(name).unwrap();
        }
        let round = PairingEngine::default().pair_round(&mut store).unwrap();
        let bye = round.bye.unwrap();
        assert!(store.has_bye(bye.id).unwrap());
        assert_eq!(store.matches().unwrap(), vec![MatchRecord::bye(bye.id)]);
    }

    #[test]
    fn test_pair_round_failure_records_nothing() {
        let mut store = MemoryStore::new();
        let a = store.register_player("A").unwrap();
        let b = store.register_player("B").unwrap();
        store.register_player("C").unwrap();
        store.report_match(a, None).unwrap();
        store.report_match(b, None).unwrap();
        store.report_match(b, Some(a)).unwrap();

        let engine = PairingEngine::new(PairingConfig {
            rematch_policy: RematchPolicy::Forbid,
            ..Default::default()
        });
        let before = store.matches().unwrap();
        let result = engine.pair_round(&mut store);
        assert!(matches!(result, Err(PairingError::ExhaustedOpponents(_))));
        assert_eq!(store.matches().unwrap(), before);
    }

    #[test]
    fn test_pair_round_surfaces_store_failure() {
        let result = PairingEngine::default().pair_round(&mut FailingStore);
        assert!(matches!(
            result,
            Err(PairingError::Store(StoreError::ConnectionFailure(_)))
        ));
    }

    #[test]
    fn test_check_rematch_is_symmetric() {
        let mut store = MemoryStore::new();
        let a = store.register_player("A").unwrap();
        let b = store.register_player("B").unwrap();
        let c = store.register_player("C").unwrap();
        store.report_match(a, Some(b)).unwrap();
        store.report_match(c, None).unwrap();

        assert!(check_rematch(&store, a, b).unwrap());
        assert!(check_rematch(&store, b, a).unwrap());
        assert!(!check_rematch(&store, a, c).unwrap());
        assert!(!check_rematch(&store, c, a).unwrap());
    }

    #[test]
    fn test_top_opponent() {
        let mut store = MemoryStore::new();
        let a = store.register_player("A").unwrap();
        let b = store.register_player("B").unwrap();
        let c = store.register_player("C").unwrap();
        let d = store.register_player("D").unwrap();
        store.report_match(a, Some(b)).unwrap();
        store.report_match(c, Some(d)).unwrap();

        // Standings: A, C, B, D. A has met B already.
        let top = top_opponent(&store, a, &BTreeSet::new()).unwrap();
        assert_eq!(top.map(|r| r.id), Some(c));

        let paired: BTreeSet<_> = [c].into_iter().collect();
        let top = top_opponent(&store, a, &paired).unwrap();
        assert_eq!(top.map(|r| r.id), Some(d));

        let paired: BTreeSet<_> = [c, d].into_iter().collect();
        assert!(top_opponent(&store, a, &paired).unwrap().is_none());
    }
}
