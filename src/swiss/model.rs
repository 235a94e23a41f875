use std::collections::HashMap;
use std::fmt;

/// The store assigned identifier of a registered player.
///
/// Ids are unique and never change for the life of the player record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PlayerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A registered player. Names are for display only and need not be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The result of one match. A missing loser means the winner had a bye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MatchRecord {
    pub winner: PlayerId,
    pub loser: Option<PlayerId>,
}

impl MatchRecord {
    pub fn new(winner: PlayerId, loser: PlayerId) -> Self {
        Self {
            winner,
            loser: Some(loser),
        }
    }

    pub fn bye(winner: PlayerId) -> Self {
        Self {
            winner,
            loser: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.loser.is_none()
    }

    /// Was this player on either side of the match
    pub fn involves(&self, player: PlayerId) -> bool {
        self.winner == player || self.loser == Some(player)
    }

    /// The other side of the match from `player`.
    ///
    /// Returns `None` for byes and for matches `player` wasn't in.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        match self.loser {
            Some(loser) if self.winner == player => Some(loser),
            Some(loser) if loser == player => Some(self.winner),
            _ => None,
        }
    }

    /// True when the match was played between `a` and `b` in either order.
    pub fn is_between(&self, a: PlayerId, b: PlayerId) -> bool {
        self.opponent_of(a) == Some(b)
    }
}

/// One line of the standings table.
///
/// This is derived from the match history and never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct StandingsRow {
    pub id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub matches_played: u32,
}

impl StandingsRow {
    pub fn new(id: PlayerId, name: impl Into<String>, wins: u32, matches: u32) -> Self {
        Self {
            id,
            name: name.into(),
            wins,
            matches_played: matches,
        }
    }

    pub fn player(&self) -> Player {
        Player::new(self.id, self.name.clone())
    }
}

/// Two players who will meet in the next round.
///
/// The first player is always the higher ranked of the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pairing {
    pub id1: PlayerId,
    pub name1: String,
    pub id2: PlayerId,
    pub name2: String,
}

impl Pairing {
    pub fn new(first: &StandingsRow, second: &StandingsRow) -> Self {
        Self {
            id1: first.id,
            name1: first.name.clone(),
            id2: second.id,
            name2: second.name.clone(),
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.id1 == player || self.id2 == player
    }

    /// The pairing as the `(id1, name1, id2, name2)` tuple
    pub fn as_tuple(&self) -> (PlayerId, &str, PlayerId, &str) {
        (self.id1, &self.name1, self.id2, &self.name2)
    }
}

/// Everything produced when pairing one round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundPairings {
    /// Pairings in standings order.
    pub pairings: Vec<Pairing>,
    /// Who sat out with a bye, if the headcount was odd.
    pub bye: Option<Player>,
    /// The subset of `pairings` that repeat an earlier match.
    pub rematches: Vec<Pairing>,
}

impl RoundPairings {
    pub fn num_players(&self) -> usize {
        self.pairings.len() * 2 + usize::from(self.bye.is_some())
    }

    pub fn is_rematch_free(&self) -> bool {
        self.rematches.is_empty()
    }
}

/// Sort standings by wins descending, breaking ties on the lower id.
pub fn sort_standings(rows: &mut [StandingsRow]) {
    rows.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.id.cmp(&b.id)));
}

/// Build the standings table from the registered players and their matches.
///
/// A bye counts as both a win and a match played for the player who got it.
/// Players without any matches are still listed with zero wins.
pub fn compute_standings(players: &[Player], matches: &[MatchRecord]) -> Vec<StandingsRow> {
    let mut wins: HashMap<PlayerId, u32> = HashMap::new();
    let mut played: HashMap<PlayerId, u32> = HashMap::new();

    for record in matches {
        *wins.entry(record.winner).or_default() += 1;
        *played.entry(record.winner).or_default() += 1;
        if let Some(loser) = record.loser {
            *played.entry(loser).or_default() += 1;
        }
    }

    let mut rows: Vec<StandingsRow> = players
        .iter()
        .map(|p| StandingsRow {
            id: p.id,
            name: p.name.clone(),
            wins: wins.get(&p.id).copied().unwrap_or(0),
            matches_played: played.get(&p.id).copied().unwrap_or(0),
        })
        .collect();

    sort_standings(&mut rows);
    rows
}
