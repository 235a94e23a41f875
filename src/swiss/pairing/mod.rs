//! Round pairing for Swiss tournaments.
//!
//! # Example
//!
//! ```
//! use rs_swiss::swiss::{PairingEngine, PlayerId, StandingsRow};
//!
//! let standings = vec![
//!     StandingsRow::new(PlayerId(1), "A", 3, 3),
//!     StandingsRow::new(PlayerId(2), "B", 3, 3),
//!     StandingsRow::new(PlayerId(3), "C", 2, 2),
//!     StandingsRow::new(PlayerId(4), "D", 0, 2),
//! ];
//!
//! let round = PairingEngine::default().plan_round(&standings, &[]).unwrap();
//! assert_eq!(round.pairings[0].as_tuple(), (PlayerId(1), "A", PlayerId(2), "B"));
//! assert_eq!(round.pairings[1].as_tuple(), (PlayerId(3), "C", PlayerId(4), "D"));
//! ```

mod builder;
mod config;
mod engine;

pub use builder::PairingEngineBuilder;
pub use config::{ByeOrder, PairingConfig, RematchPolicy};
pub use engine::{check_rematch, top_opponent, PairingEngine};
