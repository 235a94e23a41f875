use crate::swiss::errors::ConfigError;

use super::config::{ByeOrder, PairingConfig, RematchPolicy};
use super::engine::PairingEngine;

/// Builder for constructing a [`PairingEngine`].
///
/// # Example
///
/// ```
/// use rs_swiss::swiss::{ByeOrder, PairingEngineBuilder, RematchPolicy};
///
/// let engine = PairingEngineBuilder::new()
///     .bye_order(ByeOrder::LowestRanked)
///     .rematch_policy(RematchPolicy::Forbid)
///     .build()
///     .unwrap();
/// assert_eq!(engine.config().bye_order, ByeOrder::LowestRanked);
/// ```
#[derive(Debug, Default)]
pub struct PairingEngineBuilder {
    rematch_policy: Option<RematchPolicy>,
    bye_order: Option<ByeOrder>,
    max_search_steps: Option<usize>,
}

impl PairingEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rematch_policy(mut self, rematch_policy: RematchPolicy) -> Self {
        self.rematch_policy = Some(rematch_policy);
        self
    }

    pub fn bye_order(mut self, bye_order: ByeOrder) -> Self {
        self.bye_order = Some(bye_order);
        self
    }

    pub fn max_search_steps(mut self, max_search_steps: usize) -> Self {
        self.max_search_steps = Some(max_search_steps);
        self
    }

    /// Build the engine, failing if the resulting config is invalid.
    pub fn build(self) -> Result<PairingEngine, ConfigError> {
        let defaults = PairingConfig::default();
        let config = PairingConfig {
            rematch_policy: self.rematch_policy.unwrap_or(defaults.rematch_policy),
            bye_order: self.bye_order.unwrap_or(defaults.bye_order),
            max_search_steps: self.max_search_steps.unwrap_or(defaults.max_search_steps),
        };
        config.validate()?;
        Ok(PairingEngine::new(config))
    }
}
