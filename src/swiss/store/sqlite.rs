use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, instrument, warn};

use super::TournamentStore;
use crate::swiss::errors::StoreError;
use crate::swiss::model::{MatchRecord, PlayerId, StandingsRow};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS players (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT    NOT NULL
    );

    CREATE TABLE IF NOT EXISTS matches (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        winner INTEGER NOT NULL REFERENCES players (id) ON DELETE CASCADE,
        loser  INTEGER          REFERENCES players (id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS matches_winner ON matches (winner);
    CREATE INDEX IF NOT EXISTS matches_loser ON matches (loser);
";

// Byes count as a win and a match played for the winner.
const STANDINGS_QUERY: &str = "
    SELECT p.id,
           p.name,
           (SELECT COUNT(*) FROM matches m WHERE m.winner = p.id) AS wins,
           (SELECT COUNT(*) FROM matches m WHERE m.winner = p.id OR m.loser = p.id) AS played
      FROM players p
     ORDER BY wins DESC, p.id ASC
";

/// Connection settings for [`SqliteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SqliteStoreConfig {
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// A [`TournamentStore`] backed by a SQLite database.
///
/// The schema is created on open if it isn't there yet. Deleting a player
/// deletes their matches through the foreign keys.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(?path, "Opening SQLite tournament store");
        let conn = Connection::open(path).map_err(|err| {
            StoreError::ConnectionFailure(format!("{}: {err}", path.display()))
        })?;
        Self::from_connection(conn, config)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| StoreError::ConnectionFailure(err.to_string()))?;
        Self::from_connection(conn, &SqliteStoreConfig::default())
    }

    fn from_connection(conn: Connection, config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn ensure_registered(&self, player: PlayerId) -> Result<(), StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT id FROM players WHERE id = ?1",
                params![player.0],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownPlayer(player)),
        }
    }
}

impl TournamentStore for SqliteStore {
    fn reset_matches(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM matches", [])?;
        Ok(())
    }

    fn reset_players(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("DELETE FROM matches; DELETE FROM players;")?;
        Ok(())
    }

    fn count_players(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(level = "debug", skip(self))]
    fn register_player(&mut self, name: &str) -> Result<PlayerId, StoreError> {
        self.conn
            .execute("INSERT INTO players (name) VALUES (?1)", params![name])?;
        let id = PlayerId(self.conn.last_insert_rowid());
        debug!(%id, "Registered player");
        Ok(id)
    }

    fn standings(&self) -> Result<Vec<StandingsRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(STANDINGS_QUERY)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StandingsRow {
                    id: PlayerId(row.get(0)?),
                    name: row.get(1)?,
                    wins: row.get(2)?,
                    matches_played: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
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
        self.conn.execute(
            "INSERT INTO matches (winner, loser) VALUES (?1, ?2)",
            params![winner.0, loser.map(|l| l.0)],
        )?;
        Ok(())
    }

    fn matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT winner, loser FROM matches ORDER BY id")?;
        let records = stmt
            .query_map([], |row| {
                Ok(MatchRecord {
                    winner: PlayerId(row.get(0)?),
                    loser: row.get::<_, Option<i64>>(1)?.map(PlayerId),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn bye_count(&self, player: PlayerId) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE winner = ?1 AND loser IS NULL",
            params![player.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn prior_opponents(&self, player: PlayerId) -> Result<BTreeSet<PlayerId>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT loser FROM matches WHERE winner = ?1 AND loser IS NOT NULL
             UNION
             SELECT winner FROM matches WHERE loser = ?1",
        )?;
        let opponents = stmt
            .query_map(params![player.0], |row| row.get::<_, i64>(0).map(PlayerId))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(opponents)
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`, which takes the write lock up
    /// front. Calls to `atomically` must not be nested.
    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| E::from(StoreError::from(err)))?;

        match f(self) {
            Ok(value) => {
                if let Err(err) = self.conn.execute_batch("COMMIT") {
                    if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                        warn!(%rollback_err, "Rollback after failed commit also failed");
                    }
                    return Err(E::from(StoreError::from(err)));
                }
                Ok(value)
            }
            Err(err) => {
                debug!("Rolling back SQLite transaction");
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    warn!(%rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
