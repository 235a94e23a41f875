use tracing::{debug, instrument};

use super::TournamentStore;
use crate::swiss::errors::StoreError;
use crate::swiss::model::{compute_standings, MatchRecord, Player, PlayerId, StandingsRow};

/// A store that keeps players and matches in memory.
///
/// Ids are handed out from a counter starting at 1 and are not reused, even
/// after [`TournamentStore::reset_players`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            matches: Vec::new(),
            next_id: 1,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn ensure_registered(&self, player: PlayerId) -> Result<(), StoreError> {
        if self.players.iter().any(|p| p.id == player) {
            Ok(())
        } else {
            Err(StoreError::UnknownPlayer(player))
        }
    }
}

impl TournamentStore for MemoryStore {
    fn reset_matches(&mut self) -> Result<(), StoreError> {
        self.matches.clear();
        Ok(())
    }

    fn reset_players(&mut self) -> Result<(), StoreError> {
        self.matches.clear();
        self.players.clear();
        Ok(())
    }

    fn count_players(&self) -> Result<usize, StoreError> {
        Ok(self.players.len())
    }

    #[instrument(level = "debug", skip(self))]
    fn register_player(&mut self, name: &str) -> Result<PlayerId, StoreError> {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.players.push(Player::new(id, name));
        debug!(%id, "Registered player");
        Ok(id)
    }

    fn standings(&self) -> Result<Vec<StandingsRow>, StoreError> {
        Ok(compute_standings(&self.players, &self.matches))
    }

    #[instrument(level = "debug", skip(self))]
    fn report_match(
        &mut self,
        winner: PlayerId,
        loser: Option<PlayerId>,
    ) -> Result<(), StoreError> {
        self.ensure_registered(winner)?;
        if let Some(loser) = loser {
            if loser == winner {
                return Err(StoreError::SelfMatch(winner));
            }
            self.ensure_registered(loser)?;
        }
        self.matches.push(MatchRecord { winner, loser });
        Ok(())
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self.matches.clone())
    }

    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            debug!("Rolling back in-memory store");
            *self = snapshot;
        }
        result
    }
}
