//! Node configuration

use std::time::Duration;

use resq_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a node's scheduling loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Maximum messages drained per tick
    pub batch_size: usize,
    /// Factor applied to the rolling traffic counters after every tick
    pub decay_factor: f64,
    /// Time between ticks, in milliseconds
    pub tick_interval_ms: u64,
    /// Anomaly scores above this are logged and emitted as events
    pub anomaly_threshold: f64,
    /// Seed for the node's RNG; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Buffer size of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            decay_factor: 0.8,
            tick_interval_ms: 10,
            anomaly_threshold: 0.8,
            seed: None,
            event_capacity: 1024,
        }
    }
}

impl NodeConfig {
    /// Default tuning with a fixed RNG seed
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Fast ticks for tests
    pub fn testing() -> Self {
        Self {
            tick_interval_ms: 1,
            seed: Some(0),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return Err(ConfigError::InvalidDecayFactor(self.decay_factor));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if !(0.0..=1.0).contains(&self.anomaly_threshold) {
            return Err(ConfigError::InvalidAnomalyThreshold(self.anomaly_threshold));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}
