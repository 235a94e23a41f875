#[cfg(feature = "serde")]
use std::path::Path;

use crate::swiss::errors::ConfigError;

/// What to do when every remaining way to pair the round repeats a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum RematchPolicy {
    /// Pair each player with the next best ranked player still available,
    /// even if they have met before.
    #[default]
    Allow,
    /// Refuse to pair the round.
    Forbid,
}

/// Which end of the standings is scanned first when handing out a bye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ByeOrder {
    /// The best ranked player without a bye sits out.
    #[default]
    HighestRanked,
    /// The worst ranked player without a bye sits out.
    LowestRanked,
}

/// Configuration for the [`super::PairingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PairingConfig {
    pub rematch_policy: RematchPolicy,
    pub bye_order: ByeOrder,
    /// Upper bound on candidate pairs tried while looking for a round with
    /// no rematches.
    pub max_search_steps: usize,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            rematch_policy: RematchPolicy::Allow,
            bye_order: ByeOrder::HighestRanked,
            max_search_steps: 10_000,
        }
    }
}

impl PairingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_search_steps == 0 {
            return Err(ConfigError::Validation(
                "max_search_steps must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a config from JSON. Missing fields take their
    /// defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
