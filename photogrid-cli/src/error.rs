//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use photogrid::config::ConfigFileError;
use photogrid::fetch::NetworkError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build the HTTP client
    Client(NetworkError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Some photos were still failed after the last retry round
    Incomplete { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'photogrid config path' to locate the configuration file,");
                eprintln!("or 'photogrid config init --force' to restore the defaults.");
            }
            CliError::Incomplete { .. } => {
                eprintln!();
                eprintln!("Common fixes:");
                eprintln!("  1. Retry failed photos: photogrid fetch --retries 2");
                eprintln!("  2. Slow network: raise the timeout with --timeout <seconds>");
                eprintln!("  3. Rate limiting: lower parallelism with --concurrency <n>");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Incomplete { failed, total } => {
                write!(f, "{} of {} photos failed to load", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Client(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
