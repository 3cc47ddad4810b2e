//! Structured logging for the ResQ mesh
//!
//! Every crate in the workspace logs through `tracing` with structured
//! fields (`node = %id`, `message = %id`). This crate installs the global
//! subscriber that renders those events.
//!
//! # Features
//!
//! - **JSONL Output**: one JSON object per line on the console (default)
//! - **Pretty Output**: human-readable console format for development
//! - **File Rotation**: daily/hourly/never rotation via tracing-appender
//! - **RUST_LOG**: overrides the configured default level when set
//!
//! # Quick Start
//!
//! ```ignore
//! use resq_logging::{LogConfig, ResqSubscriberBuilder};
//!
//! // JSONL to console
//! let _guard = ResqSubscriberBuilder::new().init()?;
//!
//! // Development mode with pretty human-readable output
//! let _guard = ResqSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init()?;
//! ```
//!
//! Keep the returned guard alive for as long as file output should be
//! flushed.

pub mod config;

pub use config::{ConsoleConfig, FileConfig, LogConfig, RotationStrategy};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync + 'static>;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builder for configuring and installing the global subscriber
pub struct ResqSubscriberBuilder {
    config: LogConfig,
}

impl ResqSubscriberBuilder {
    /// Default configuration: JSONL to console at `info`
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default level directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.console.pretty = pretty;
        self.config.console.ansi = pretty;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// Returns the file writer's guard when file output is configured.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.config.default_level))?;

        let (layers, guard) = self.build_layers()?;

        Registry::default().with(filter).with(layers).try_init()?;
        Ok(guard)
    }

    fn build_layers(&self) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), LoggingError> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            if self.config.console.pretty {
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_ansi(self.config.console.ansi)
                        .with_target(true)
                        .boxed(),
                );
            } else {
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(true)
                        .with_file(self.config.include_location)
                        .with_line_number(self.config.include_location)
                        .boxed(),
                );
            }
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_file(self.config.include_location)
                    .with_line_number(self.config.include_location)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
        }

        Ok((layers, guard))
    }
}

impl Default for ResqSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the configured file sink; `Never` truncates a single file
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::new(rotation, &config.directory, &config.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install a quiet subscriber for tests; ignores an existing one
pub fn init_testing() {
    let _ = ResqSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ResqSubscriberBuilder::new();
        assert_eq!(builder.config().default_level, "info");
        assert!(!builder.config().console.pretty); // JSONL by default
    }

    #[test]
    fn test_builder_overrides() {
        let builder = ResqSubscriberBuilder::new()
            .with_level("trace")
            .with_pretty(true)
            .with_console(false);
        assert_eq!(builder.config().default_level, "trace");
        assert!(builder.config().console.pretty);
        assert!(!builder.config().console.enabled);
    }

    #[test]
    fn test_layer_count_follows_config() {
        let (layers, guard) = ResqSubscriberBuilder::new().build_layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert!(guard.is_none());

        let (layers, _) = ResqSubscriberBuilder::new()
            .with_console(false)
            .build_layers()
            .unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_single_file_output() {
        let dir = std::env::temp_dir().join(format!("resq-logging-{}", std::process::id()));
        let (layers, guard) = ResqSubscriberBuilder::new()
            .with_file_output(FileConfig {
                directory: dir.clone(),
                prefix: "unit".to_string(),
                rotation: RotationStrategy::Never,
            })
            .build_layers()
            .unwrap();

        assert_eq!(layers.len(), 2);
        assert!(guard.is_some());
        assert!(dir.join("unit.log").exists());
        let _ = fs::remove_dir_all(dir);
    }
}
