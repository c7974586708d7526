//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization so every command
//! starts the same way.

use std::path::Path;

use skyreplay::config::ReplayConfig;
use skyreplay::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    config: ReplayConfig,
}

impl CliRunner {
    /// Load configuration and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; defaults to ~/.skyreplay/config.ini
    /// * `debug` - Enable debug-level logging and mirror log lines to stdout
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ReplayConfig::load_from(path)?,
            None => ReplayConfig::load()?,
        };

        let logging_guard = init_logging(&default_log_dir(), default_log_file(), debug, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SkyReplay v{}", skyreplay::VERSION);
        info!(
            command,
            trace_capacity = self.config.trace_capacity,
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            "SkyReplay CLI started"
        );
    }
}
