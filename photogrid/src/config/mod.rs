//! Configuration types for photogrid components.
//!
//! # Example
//!
//! ```
//! use photogrid::config::{FetchConfig, GridConfig};
//!
//! let fetch_config = FetchConfig::default().with_max_concurrent(4);
//! let grid_config = GridConfig::default().with_reload_count(21);
//! ```

mod defaults;
mod fetch;
mod file;
mod grid;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    config_directory, config_file_path, default_log_file, default_max_concurrent, num_cpus,
    DEFAULT_COLUMNS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_RELOAD_COUNT, DEFAULT_ROWS,
    DEFAULT_SOURCE_URL,
};
pub use fetch::FetchConfig;
pub use file::ConfigFileError;
pub use grid::GridConfig;
pub use settings::{ConfigFile, FetchSettings, GridSettings, LoggingSettings};
