//! Paged grid geometry.

/// Shape of one grid page.
///
/// The grid scrolls page by page; the final page is padded with blank cells
/// so every page is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    columns: u32,
    rows: u32,
}

impl PageLayout {
    /// Creates a layout. Zero dimensions are raised to one.
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn items_per_page(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Pages needed to show `photo_count` photos.
    pub fn page_count(&self, photo_count: usize) -> usize {
        photo_count.div_ceil(self.items_per_page())
    }

    /// Total cells including blank padding on the last page.
    pub fn slot_count(&self, photo_count: usize) -> usize {
        self.page_count(photo_count) * self.items_per_page()
    }

    /// Page containing the cell at `index`.
    pub fn page_of(&self, index: usize) -> usize {
        index / self.items_per_page()
    }

    /// (column, row) of the cell at `index` within its page.
    pub fn cell_of(&self, index: usize) -> (u32, u32) {
        let within = (index % self.items_per_page()) as u32;
        (within % self.columns, within / self.columns)
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COLUMNS, crate::config::DEFAULT_ROWS)
    }
}
