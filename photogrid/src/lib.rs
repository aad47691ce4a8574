//! photogrid - keyed, cancellable image fetching for paged photo grids
//!
//! The core is [`queue::KeyedFetchQueue`]: it admits at most one fetch per
//! grid position, runs a bounded number of fetches at once, lets any fetch be
//! cancelled alone or all together, and reports each outcome through a
//! callback that may run on any worker thread.
//!
//! # High-Level API
//!
//! ```ignore
//! use photogrid::config::{FetchConfig, GridConfig};
//! use photogrid::fetch::AsyncReqwestClient;
//! use photogrid::grid::PhotoGrid;
//! use photogrid::queue::KeyedFetchQueue;
//!
//! let fetch = FetchConfig::default();
//! let queue = KeyedFetchQueue::new(AsyncReqwestClient::new(&fetch)?, &fetch);
//! let (mut grid, mut updates) = PhotoGrid::new(queue, GridConfig::default());
//! grid.reload_all();
//! ```

pub mod config;
pub mod fetch;
pub mod grid;
pub mod key;
pub mod logging;
pub mod queue;

pub use key::PositionKey;

/// Version of the photogrid library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
