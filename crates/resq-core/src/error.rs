//! Error types for the ResQ mesh
//!
//! Dropped messages are not errors: loop detection, missing routes and
//! transmission loss are ordinary outcomes reported through
//! [`crate::MeshEvent`]. The types here cover misuse of the node and
//! topology APIs and invalid configuration.

use thiserror::Error;

use crate::identity::NodeId;

/// Top-level error type
#[derive(Debug, Error)]
pub enum ResqError {
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by node and topology operations
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Node {0} is already running")]
    AlreadyRunning(NodeId),

    #[error("Node {0} has been stopped and cannot be restarted")]
    Stopped(NodeId),

    #[error("Node {0} cannot link to itself")]
    SelfLink(NodeId),

    #[error("Invalid base loss {0}: must be within [0, 1]")]
    InvalidLoss(f64),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),
}

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    #[error("Decay factor {0} must be within (0, 1)")]
    InvalidDecayFactor(f64),

    #[error("Tick interval must be non-zero")]
    ZeroTickInterval,

    #[error("Anomaly threshold {0} must be within [0, 1]")]
    InvalidAnomalyThreshold(f64),

    #[error("Event capacity must be at least 1")]
    ZeroEventCapacity,

    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Result type alias for ResQ operations
pub type ResqResult<T> = Result<T, ResqError>;
