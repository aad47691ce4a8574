//! Grid model configuration.

use super::defaults::{DEFAULT_COLUMNS, DEFAULT_RELOAD_COUNT, DEFAULT_ROWS, DEFAULT_SOURCE_URL};

/// Configuration for a [`PhotoGrid`](crate::grid::PhotoGrid).
///
/// # Example
///
/// ```
/// use photogrid::config::GridConfig;
///
/// let config = GridConfig::default();
/// assert_eq!(config.reload_count(), 140);
/// assert_eq!(config.items_per_page(), 70);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// URL every new photo record is fetched from
    source_url: String,
    /// Number of records created by a full reload
    reload_count: usize,
    /// Cells per row
    columns: u32,
    /// Rows per page
    rows: u32,
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    pub fn with_reload_count(mut self, count: usize) -> Self {
        self.reload_count = count;
        self
    }

    /// Set the page shape. Zero dimensions are raised to one.
    pub fn with_page(mut self, columns: u32, rows: u32) -> Self {
        self.columns = columns.max(1);
        self.rows = rows.max(1);
        self
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn reload_count(&self) -> usize {
        self.reload_count
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells on one page.
    pub fn items_per_page(&self) -> usize {
        (self.columns * self.rows) as usize
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            reload_count: DEFAULT_RELOAD_COUNT,
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}
