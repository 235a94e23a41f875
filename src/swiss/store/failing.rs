use tracing::warn;

use super::TournamentStore;
use crate::swiss::errors::StoreError;
use crate::swiss::model::{MatchRecord, PlayerId, StandingsRow};

/// A store that can never be reached. Every call fails with
/// [`StoreError::ConnectionFailure`].
///
/// This store is useful for testing how callers surface storage failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl FailingStore {
    fn fail<T>() -> Result<T, StoreError> {
        warn!("FailingStore intentionally returning error");
        Err(StoreError::ConnectionFailure(
            "storage is unreachable".to_string(),
        ))
    }
}

impl TournamentStore for FailingStore {
    fn reset_matches(&mut self) -> Result<(), StoreError> {
        Self::fail()
    }

    fn reset_players(&mut self) -> Result<(), StoreError> {
        Self::fail()
    }

    fn count_players(&self) -> Result<usize, StoreError> {
        Self::fail()
    }

    fn register_player(&mut self, _name: &str) -> Result<PlayerId, StoreError> {
        Self::fail()
    }

    fn standings(&self) -> Result<Vec<StandingsRow>, StoreError> {
        Self::fail()
    }

    fn report_match(
        &mut self,
        _winner: PlayerId,
        _loser: Option<PlayerId>,
    ) -> Result<(), StoreError> {
        Self::fail()
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        Self::fail()
    }

    fn atomically<T, E, F>(&mut self, _f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        Self::fail().map_err(E::from)
    }
}
