//! ResQ mesh simulation
//!
//! Scenario definitions and run configuration for the `resq-simulation`
//! binary. Scenarios build a mesh, inject messages at source nodes, let the
//! node loops run, then read delivered snapshots.

pub mod config;
pub mod scenarios;

pub use config::SimulationConfig;
