use thiserror::Error;

use super::model::PlayerId;

/// Failures reported by a [`super::store::TournamentStore`].
///
/// None of these are retried. Reporting a match or registering a player is
/// not idempotent, so a blind retry could double count a result.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unable to reach tournament storage: {0}")]
    ConnectionFailure(String),

    #[error("No player registered with id {0}")]
    UnknownPlayer(PlayerId),

    #[error("Player {0} can't play a match against themselves")]
    SelfMatch(PlayerId),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Failures while computing the pairings for a round.
#[derive(Error, Debug)]
pub enum PairingError {
    #[error("Invalid tournament state: {0}")]
    InvalidState(String),

    #[error("No unplayed opponent left for player {0} and rematches are forbidden")]
    ExhaustedOpponents(PlayerId),

    #[error("Storage error while pairing: {0}")]
    Store(#[from] StoreError),
}

/// Failures while loading or validating a [`super::PairingConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to parse pairing config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
