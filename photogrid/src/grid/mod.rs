//! Headless photo grid model.
//!
//! [`PhotoGrid`] owns the ordered list of [`PhotoRecord`]s and the
//! [`KeyedFetchQueue`] that fills them. It never touches pixels on screen:
//! completion callbacks only post a [`GridUpdate`] to a channel, and whoever
//! owns the receiving end (the rendering context) calls
//! [`PhotoGrid::apply`] and redraws the returned cell.
//!
//! ```ignore
//! let queue = KeyedFetchQueue::new(AsyncReqwestClient::new(&fetch)?, &fetch);
//! let (mut grid, mut updates) = PhotoGrid::new(queue, GridConfig::default());
//! grid.reload_all();
//! while let Some(update) = updates.recv().await {
//!     if let Some(key) = grid.apply(update) {
//!         redraw(key);
//!     }
//! }
//! ```

mod layout;
mod record;

pub use layout::PageLayout;
pub use record::{PhotoRecord, PhotoState};

use crate::config::GridConfig;
use crate::fetch::{AsyncHttpClient, FetchOutcome};
use crate::key::PositionKey;
use crate::queue::KeyedFetchQueue;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// A finished fetch on its way to the rendering context.
#[derive(Debug, Clone, PartialEq)]
pub struct GridUpdate {
    /// Grid epoch at submission; updates from before a reload are stale
    pub epoch: u64,
    pub key: PositionKey,
    pub outcome: FetchOutcome,
}

/// One cell of the padded grid.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Photo(&'a PhotoRecord),
    Blank,
}

/// Per-state record counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GridSummary {
    pub new: usize,
    pub downloading: usize,
    pub success: usize,
    pub failed: usize,
}

impl GridSummary {
    pub fn total(&self) -> usize {
        self.new + self.downloading + self.success + self.failed
    }
}

/// Photo list plus the queue that fetches it.
pub struct PhotoGrid<C: AsyncHttpClient> {
    queue: KeyedFetchQueue<C>,
    config: GridConfig,
    layout: PageLayout,
    photos: Vec<PhotoRecord>,
    epoch: u64,
    updates: mpsc::UnboundedSender<GridUpdate>,
}

impl<C: AsyncHttpClient> PhotoGrid<C> {
    /// Creates an empty grid and the receiver its updates arrive on.
    pub fn new(
        queue: KeyedFetchQueue<C>,
        config: GridConfig,
    ) -> (Self, mpsc::UnboundedReceiver<GridUpdate>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let layout = PageLayout::new(config.columns(), config.rows());
        let grid = Self {
            queue,
            config,
            layout,
            photos: Vec::new(),
            epoch: 0,
            updates,
        };
        (grid, rx)
    }

    /// Appends one record and starts fetching it.
    pub fn add_photo(&mut self) -> PositionKey {
        self.photos
            .push(PhotoRecord::new(self.config.source_url()));
        let key = PositionKey::item((self.photos.len() - 1) as u32);
        self.start_download(key);
        key
    }

    /// Replaces all records with the configured number of fresh ones.
    pub fn reload_all(&mut self) {
        self.reload_with(self.config.reload_count());
    }

    /// Cancels every fetch, replaces the list with `count` fresh records and
    /// fetches them all in order.
    pub fn reload_with(&mut self, count: usize) {
        let cancelled = self.queue.cancel_all();
        self.epoch += 1;
        self.photos = (0..count)
            .map(|_| PhotoRecord::new(self.config.source_url()))
            .collect();

        debug!(
            epoch = self.epoch,
            count = count,
            cancelled = cancelled,
            "Grid reloaded"
        );

        for item in 0..count {
            self.start_download(PositionKey::item(item as u32));
        }
    }

    /// Starts a fetch for a `New` or `Failed` record.
    ///
    /// Returns `false` if the key is unknown, the record is in any other
    /// state, or the fetch is already in flight.
    pub fn request(&mut self, key: PositionKey) -> bool {
        match self.record(key).map(PhotoRecord::state) {
            Some(PhotoState::New | PhotoState::Failed) => self.start_download(key),
            _ => false,
        }
    }

    /// Re-fetches a `Failed` record. Identical to an initial request.
    pub fn retry(&mut self, key: PositionKey) -> bool {
        match self.record(key).map(PhotoRecord::state) {
            Some(PhotoState::Failed) => self.start_download(key),
            _ => false,
        }
    }

    /// Re-fetches every `Failed` record. Returns how many were started.
    pub fn retry_failed(&mut self) -> usize {
        let failed: Vec<PositionKey> = self
            .photos
            .iter()
            .enumerate()
            .filter(|(_, record)| record.state() == PhotoState::Failed)
            .map(|(index, _)| PositionKey::item(index as u32))
            .collect();

        failed.into_iter().filter(|key| self.start_download(*key)).count()
    }

    /// Cancels the fetch for one record. The record returns to `New` when the
    /// resulting update is applied.
    pub fn cancel(&mut self, key: PositionKey) -> bool {
        self.queue.cancel(key)
    }

    /// Cancels every fetch and returns downloading records to `New`.
    ///
    /// Cancelled callbacks never run, so no update will arrive for these
    /// records; they can be requested again straight away.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.cancel_all();
        for record in &mut self.photos {
            if record.state() == PhotoState::Downloading {
                record.reset();
            }
        }
        cancelled
    }

    /// Applies a finished fetch to its record.
    ///
    /// Returns the key whose cell must be redrawn, or `None` if the update is
    /// stale (older epoch, unknown key) or nothing visible changed.
    pub fn apply(&mut self, update: GridUpdate) -> Option<PositionKey> {
        if update.epoch != self.epoch {
            trace!(key = %update.key, epoch = update.epoch, "Dropping stale grid update");
            return None;
        }

        let record = self.photos.get_mut(update.key.index())?;
        match update.outcome {
            FetchOutcome::Success(image) => record.mark_success(image),
            FetchOutcome::Failed(error) => {
                debug!(key = %update.key, error = %error, "Photo fetch failed");
                record.mark_failed(error);
            }
            FetchOutcome::Cancelled => {
                record.reset();
                return None;
            }
        }
        Some(update.key)
    }

    fn start_download(&mut self, key: PositionKey) -> bool {
        let Some(record) = self.photos.get_mut(key.index()) else {
            return false;
        };

        let updates = self.updates.clone();
        let epoch = self.epoch;
        let admitted = self.queue.submit(key, record.url(), move |outcome| {
            let update = GridUpdate {
                epoch,
                key,
                outcome,
            };
            if updates.send(update).is_err() {
                trace!(key = %key, "Grid receiver closed, dropping update");
            }
        });

        if admitted {
            record.mark_downloading();
        }
        admitted
    }

    pub fn record(&self, key: PositionKey) -> Option<&PhotoRecord> {
        self.photos.get(key.index())
    }

    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Total cells including blank padding.
    pub fn slot_count(&self) -> usize {
        self.layout.slot_count(self.photos.len())
    }

    /// The cell at `index`: a photo, a blank pad, or `None` past the end.
    pub fn slot(&self, index: usize) -> Option<Slot<'_>> {
        if index < self.photos.len() {
            Some(Slot::Photo(&self.photos[index]))
        } else if index < self.slot_count() {
            Some(Slot::Blank)
        } else {
            None
        }
    }

    /// The page holding `key`, or `None` for an unknown key.
    pub fn page_of(&self, key: PositionKey) -> Option<usize> {
        (key.index() < self.photos.len()).then(|| self.layout.page_of(key.index()))
    }

    pub fn summary(&self) -> GridSummary {
        let mut summary = GridSummary::default();
        for record in &self.photos {
            match record.state() {
                PhotoState::New => summary.new += 1,
                PhotoState::Downloading => summary.downloading += 1,
                PhotoState::Success => summary.success += 1,
                PhotoState::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// True when no record is waiting for a fetch.
    pub fn is_settled(&self) -> bool {
        let summary = self.summary();
        summary.new == 0 && summary.downloading == 0
    }

    pub fn queue(&self) -> &KeyedFetchQueue<C> {
        &self.queue
    }
}
