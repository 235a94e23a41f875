//! The storage collaborator behind standings and pairing.
//!
//! Pairing code only ever sees a `&mut impl TournamentStore`. The handle is
//! passed into each operation; nothing in the crate holds a global
//! connection.
mod failing;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::collections::BTreeSet;

use super::errors::StoreError;
use super::model::{MatchRecord, PlayerId, StandingsRow};

/// Record level access to players and matches, plus the ranked standings
/// query.
///
/// Implementors only need to provide the basic CRUD calls. The history
/// queries have default implementations built on [`TournamentStore::matches`]
/// that a store can replace with something cheaper.
pub trait TournamentStore {
    /// Remove every match record.
    fn reset_matches(&mut self) -> Result<(), StoreError>;

    /// Remove every player. Their matches go with them.
    fn reset_players(&mut self) -> Result<(), StoreError>;

    fn count_players(&self) -> Result<usize, StoreError>;

    /// Add a player and return the id the store gave them.
    fn register_player(&mut self, name: &str) -> Result<PlayerId, StoreError>;

    /// Players ranked by wins, most wins first. Equal records are ordered by
    /// id so the same history always produces the same table.
    fn standings(&self) -> Result<Vec<StandingsRow>, StoreError>;

    /// Record a finished match. A `None` loser records a bye for `winner`.
    fn report_match(&mut self, winner: PlayerId, loser: Option<PlayerId>)
        -> Result<(), StoreError>;

    /// The whole match history in the order it was reported.
    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError>;

    /// Run `f` as one transaction against the store.
    ///
    /// If `f` fails nothing it wrote is kept, and no other writer can get
    /// in between the reads and writes `f` makes.
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>;

    fn bye_count(&self, player: PlayerId) -> Result<usize, StoreError> {
        Ok(self
            .matches()?
            .iter()
            .filter(|m| m.is_bye() && m.winner == player)
            .count())
    }

    fn has_bye(&self, player: PlayerId) -> Result<bool, StoreError> {
        Ok(self.bye_count(player)? > 0)
    }

    /// Everyone `player` has already met, win or lose.
    fn prior_opponents(&self, player: PlayerId) -> Result<BTreeSet<PlayerId>, StoreError> {
        Ok(self
            .matches()?
            .iter()
            .filter_map(|m| m.opponent_of(player))
            .collect())
    }
}

pub use failing::FailingStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, SqliteStoreConfig};
