//! Single-image fetching.
//!
//! [`FetchTask`] is the cancellable unit of work: one request through an
//! injected [`AsyncHttpClient`], one decode, one [`FetchOutcome`].

mod decode;
mod error;
pub mod http;
mod task;

pub use decode::{decode_image, DecodedImage};
pub use error::{DecodeError, FetchError, NetworkError};
pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_USER_AGENT};
pub use task::{FetchOutcome, FetchTask, TaskState};
