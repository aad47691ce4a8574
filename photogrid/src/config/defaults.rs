//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::fetch::DEFAULT_USER_AGENT;

/// Per-request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// CPU count used when hardware parallelism cannot be detected.
pub const FALLBACK_CPU_COUNT: usize = 4;

/// Placeholder image service used by the grid.
pub const DEFAULT_SOURCE_URL: &str = "https://picsum.photos/200/200";

/// Records created by a full reload.
pub const DEFAULT_RELOAD_COUNT: usize = 140;

/// Grid page width in cells.
pub const DEFAULT_COLUMNS: u32 = 7;

/// Grid page height in cells.
pub const DEFAULT_ROWS: u32 = 10;

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CPU_COUNT)
}

/// Default fetch concurrency: one running fetch per CPU.
pub fn default_max_concurrent() -> usize {
    num_cpus()
}

/// Get the path to the config directory (~/.photogrid).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photogrid")
}

/// Get the path to the config file (~/.photogrid/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default log file location (~/.photogrid/photogrid.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("photogrid.log")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            fetch: FetchSettings {
                timeout: DEFAULT_FETCH_TIMEOUT_SECS,
                max_concurrent: None,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            grid: GridSettings {
                source_url: DEFAULT_SOURCE_URL.to_string(),
                reload_count: DEFAULT_RELOAD_COUNT,
                columns: DEFAULT_COLUMNS,
                rows: DEFAULT_ROWS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
