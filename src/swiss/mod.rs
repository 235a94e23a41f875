//! Standings, pairing and storage for Swiss-system tournaments.
//!
//! The [`Tournament`] type bundles a store and a [`PairingEngine`] for the
//! common case. The pieces can also be used on their own: the engine only
//! needs something implementing [`store::TournamentStore`].
pub mod errors;
pub mod model;
pub mod pairing;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
mod tournament;

pub use errors::{ConfigError, PairingError, StoreError};
pub use model::{
    compute_standings, sort_standings, MatchRecord, Pairing, Player, PlayerId, RoundPairings,
    StandingsRow,
};
pub use pairing::{
    check_rematch, top_opponent, ByeOrder, PairingConfig, PairingEngine, PairingEngineBuilder,
    RematchPolicy,
};
pub use tournament::Tournament;
