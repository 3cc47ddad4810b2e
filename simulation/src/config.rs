//! Simulation run configuration
//!
//! Loaded from a TOML file; every section is optional and falls back to
//! its defaults. Command-line flags override file values.
//!
//! ```toml
//! seed = 42
//! wait_ms = 2000
//!
//! [node]
//! batch_size = 5
//! tick_interval_ms = 10
//!
//! [logging]
//! default_level = "debug"
//! ```

use std::path::Path;
use std::time::Duration;

use resq_core::ConfigError;
use resq_logging::LogConfig;
use resq_mesh::NodeConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Mesh-wide RNG seed; random when absent
    pub seed: Option<u64>,
    /// How long to let the mesh run before stopping it
    pub wait_ms: u64,
    pub node: NodeConfig,
    pub logging: LogConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            wait_ms: 2000,
            node: NodeConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node.validate()
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = SimulationConfig::from_toml("").unwrap();
        assert_eq!(config.wait(), Duration::from_secs(2));
        assert!(config.seed.is_none());
        assert_eq!(config.node, NodeConfig::default());
    }

    #[test]
    fn test_sections_override() {
        let config = SimulationConfig::from_toml(
            r#"
            seed = 7
            wait_ms = 500

            [node]
            batch_size = 3

            [logging]
            default_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.node.batch_size, 3);
        assert_eq!(config.node.decay_factor, 0.8);
        assert_eq!(config.logging.default_level, "debug");
    }

    #[test]
    fn test_invalid_node_section_rejected() {
        let err = SimulationConfig::from_toml("[node]\ndecay_factor = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDecayFactor(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SimulationConfig::from_toml("seed = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SimulationConfig::load("/nonexistent/resq.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
