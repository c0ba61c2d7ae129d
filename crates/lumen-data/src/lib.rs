//! Source-agnostic data fetching for the lumen image pipeline.
//!
//! # Architecture
//!
//! - [`DataFetcher`] - Single-shot asynchronous retrieval contract
//! - [`DataCallback`] - Consumer side of a fetch, completed exactly once
//! - [`ReleasableStream`] - Byte stream whose body can be released from another thread
//! - [`AssetPathFetcher`] - Local implementation of the contract backed by an [`AssetManager`]
//!
//! The pipeline depends only on these types. Concrete remote fetchers live in
//! `lumen-http`.

mod asset;
mod data;
mod error;
mod fetcher;
mod stream;

pub use asset::{AssetManager, AssetPathFetcher, DirAssetManager};
pub use data::{DataClass, DataSource, Priority};
pub use error::{BoxError, FetchError, Result};
pub use fetcher::{DataCallback, DataFetcher, FnCallback, OneshotCallback, oneshot_callback};
pub use stream::{ByteStream, ReleasableStream, ReleaseHandle};
