//! Logging setup for KITE forwarders
//!
//! JSONL is the default output format so logs from several forwarders can be
//! merged and queried. Development builds switch to pretty console output.
//!
//! # Quick Start
//!
//! ```ignore
//! use kite_logging::{KiteSubscriberBuilder, LogConfig};
//!
//! // JSONL to console
//! let _guard = KiteSubscriberBuilder::new().init();
//!
//! // Pretty console with debug level
//! let _guard = KiteSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Node Context
//!
//! ```ignore
//! use kite_logging::NodeContextGuard;
//!
//! let _node = NodeContextGuard::new("rv-router");
//! tracing::info!("route announced"); // carries node = "rv-router"
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, FilterConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{NodeContextData, NodeContextGuard};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use layers::BoxedLayer;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid filter directives: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("log file setup failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("rolling appender setup failed: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Builder for configuring and installing the global subscriber
///
/// By default console output uses JSONL. Use [`LogConfig::development`] for
/// human-readable output.
pub struct KiteSubscriberBuilder {
    config: LogConfig,
}

impl KiteSubscriberBuilder {
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
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

    /// Install the subscriber globally, reporting any failure
    ///
    /// The returned guard flushes file output when dropped and must be kept
    /// alive for the lifetime of the program.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.filter_directives())?,
        };

        let mut outputs: Vec<BoxedLayer> = Vec::new();
        if self.config.console.enabled {
            outputs.push(layers::console_layer(
                &self.config.console,
                &self.config.jsonl,
            ));
        }

        let mut guard = None;
        if let Some(file_config) = &self.config.file {
            let (writer, worker) = file_writer(file_config)?;
            outputs.push(layers::jsonl_layer(&self.config.jsonl, writer));
            guard = Some(worker);
        }

        Registry::default()
            .with(outputs)
            .with(env_filter)
            .try_init()?;

        Ok(guard)
    }

    /// Install the subscriber globally
    ///
    /// Failures are reported on stderr and logging stays disabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: failed to initialize logging: {e}");
                None
            }
        }
    }
}

impl Default for KiteSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

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

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("log");
    if let Some(max) = config.max_files {
        builder = builder.max_log_files(max);
    }
    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSONL to console with default settings
pub fn init_default() -> Option<WorkerGuard> {
    KiteSubscriberBuilder::new().init()
}

/// Verbose pretty console output
pub fn init_development() -> Option<WorkerGuard> {
    KiteSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Warnings through the test writer
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = KiteSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = KiteSubscriberBuilder::new();
        assert_eq!(builder.config.default_level, "info");
        assert!(!builder.config.console.pretty);
    }

    #[test]
    fn test_builder_with_config() {
        let builder = KiteSubscriberBuilder::new().with_config(LogConfig::development());
        assert_eq!(builder.config.default_level, "debug");
        assert!(builder.config.console.pretty);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = KiteSubscriberBuilder::new()
            .with_level("trace")
            .with_console(false)
            .with_file_output(FileConfig::default());
        assert_eq!(builder.config.default_level, "trace");
        assert!(!builder.config.console.enabled);
        assert!(builder.config.file.is_some());
    }

    #[test]
    fn test_init_testing_is_idempotent() {
        init_testing();
        init_testing();
        assert!(
            KiteSubscriberBuilder::new()
                .with_config(LogConfig::testing())
                .try_init()
                .is_err()
        );
    }
}
