//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`fetch`] - Reload the grid and fetch every photo

pub mod config;
pub mod fetch;
