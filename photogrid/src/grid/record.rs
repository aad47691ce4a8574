//! Photo records: the view-model of one grid cell.

use crate::fetch::{DecodedImage, FetchError};

/// Display state of a photo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoState {
    /// Created, no fetch requested yet
    New,
    /// Fetch admitted to the queue
    Downloading,
    /// Image available
    Success,
    /// Fetch failed; the cell offers a retry
    Failed,
}

/// One photo in the grid.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    url: String,
    state: PhotoState,
    image: Option<DecodedImage>,
    error: Option<FetchError>,
}

impl PhotoRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: PhotoState::New,
            image: None,
            error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> PhotoState {
        self.state
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    /// Cause of the last failure, while in `Failed`.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub(super) fn mark_downloading(&mut self) {
        self.state = PhotoState::Downloading;
        self.error = None;
    }

    pub(super) fn mark_success(&mut self, image: DecodedImage) {
        self.state = PhotoState::Success;
        self.image = Some(image);
        self.error = None;
    }

    pub(super) fn mark_failed(&mut self, error: FetchError) {
        self.state = PhotoState::Failed;
        self.error = Some(error);
    }

    pub(super) fn reset(&mut self) {
        self.state = PhotoState::New;
    }
}
