//! rs_swiss is a library for running the pairing side of a Swiss-system
//! tournament.
//!
//! Players register, report match results, and before each round ask for
//! the next set of pairings. Each player meets the closest-ranked opponent
//! they haven't already played, and odd headcounts are handled by giving a
//! single bye to the best-ranked player who has not had one yet.
//!
//! # Storage
//!
//! The pairing logic never talks to a database directly. Everything goes
//! through the [`swiss::store::TournamentStore`] trait, which is passed
//! explicitly to each operation. Two implementations ship with the crate:
//!
//! - [`swiss::store::MemoryStore`] keeps everything in vectors.
//! - [`swiss::store::SqliteStore`] (feature `sqlite`, on by default) keeps
//!   players and matches in a SQLite database.
//!
//! # Example
//!
//! ```
//! use rs_swiss::swiss::{store::MemoryStore, Tournament};
//!
//! let mut tournament = Tournament::new(MemoryStore::new());
//! for name in ["Twilight Sparkle", "Fluttershy", "Applejack", "Pinkie Pie"] {
//!     tournament.register_player(name).unwrap();
//! }
//!
//! let round = tournament.swiss_pairings().unwrap();
//! assert_eq!(round.pairings.len(), 2);
//! assert!(round.bye.is_none());
//! ```
//!
//! # Features
//!
//! - `serde` (default): serialization of the model types and JSON loading of
//!   [`swiss::PairingConfig`].
//! - `sqlite` (default): the SQLite backed store.
//! - `arbitrary`: `Arbitrary` derives on the model types for fuzzing.

/// Swiss pairing, standings and the storage collaborator.
pub mod swiss;
