//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and client creation
//! so command handlers stay focused on their own work.

use crate::error::CliError;
use photogrid::config::{ConfigFile, FetchConfig};
use photogrid::fetch::AsyncReqwestClient;
use photogrid::logging::{default_log_file, init_logging, LoggingGuard};
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner with optional debug logging.
    ///
    /// When stdout is a TTY, stdout logging is disabled so log lines don't
    /// interleave with progress output.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let stdout_enabled = !atty::is(atty::Stream::Stdout);

        let logging_guard = init_logging(log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("photogrid v{}", photogrid::VERSION);
        info!("photogrid CLI: {} command", command);
    }

    /// Create the HTTP client used by the fetch queue.
    pub fn create_client(&self, config: &FetchConfig) -> Result<AsyncReqwestClient, CliError> {
        AsyncReqwestClient::new(config)
            .map_err(CliError::Client)
            .inspect(|_| {
                info!(
                    timeout_secs = config.timeout().as_secs(),
                    user_agent = config.user_agent(),
                    "HTTP client created"
                )
            })
    }
}
