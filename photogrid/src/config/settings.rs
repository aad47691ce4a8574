//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use super::{FetchConfig, GridConfig};
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Fetch queue settings
    pub fetch: FetchSettings,
    /// Grid model settings
    pub grid: GridSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Running fetch limit; `None` means one per CPU
    pub max_concurrent: Option<usize>,
    /// User-Agent header
    pub user_agent: String,
}

/// `[grid]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSettings {
    pub source_url: String,
    pub reload_count: usize,
    pub columns: u32,
    pub rows: u32,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl ConfigFile {
    /// Builds the fetch queue configuration from the `[fetch]` section.
    pub fn fetch_config(&self) -> FetchConfig {
        let config = FetchConfig::new()
            .with_timeout_secs(self.fetch.timeout)
            .with_user_agent(self.fetch.user_agent.clone());
        match self.fetch.max_concurrent {
            Some(limit) => config.with_max_concurrent(limit),
            None => config,
        }
    }

    /// Builds the grid configuration from the `[grid]` section.
    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new()
            .with_source_url(self.grid.source_url.clone())
            .with_reload_count(self.grid.reload_count)
            .with_page(self.grid.columns, self.grid.rows)
    }
}
