use tokio::sync::oneshot;

use crate::data::{DataClass, DataSource, Priority};
use crate::error::{FetchError, Result};

/// Receiver of a single fetch outcome.
///
/// Both methods consume the callback, so an implementation can be completed
/// at most once. Fetchers guarantee it is completed exactly once per
/// [`DataFetcher::load_data`] call, possibly on a different thread.
pub trait DataCallback<T>: Send {
    /// The fetch produced data. `None` means the source had nothing to deliver.
    fn on_data_ready(self: Box<Self>, data: Option<T>);

    /// The fetch failed before any data could be delivered.
    fn on_load_failed(self: Box<Self>, error: FetchError);
}

/// Asynchronous, single-shot retrieval of `Self::Data` from one source.
///
/// Fetchers are shared between the thread that loads, the thread that
/// completes the load and the thread that cleans up, so every method takes
/// `&self`.
pub trait DataFetcher: Send + Sync {
    type Data: Send + 'static;

    /// Start fetching and return without blocking.
    ///
    /// All failures are reported through `callback`. Calling this again before
    /// [`cleanup`](DataFetcher::cleanup) is not supported.
    fn load_data(&self, priority: Priority, callback: Box<dyn DataCallback<Self::Data>>);

    /// Release everything acquired by the last load.
    ///
    /// Never fails, safe to call when nothing was loaded, and idempotent.
    fn cleanup(&self);

    /// Advisory cancellation. A callback already in flight may still run.
    fn cancel(&self);

    fn data_class(&self) -> DataClass {
        DataClass::of::<Self::Data>()
    }

    fn data_source(&self) -> DataSource;
}

/// [`DataCallback`] built from a pair of closures.
pub struct FnCallback<T> {
    on_ready: Box<dyn FnOnce(Option<T>) + Send>,
    on_failed: Box<dyn FnOnce(FetchError) + Send>,
}

impl<T> FnCallback<T> {
    pub fn new(
        on_ready: impl FnOnce(Option<T>) + Send + 'static,
        on_failed: impl FnOnce(FetchError) + Send + 'static,
    ) -> Self {
        Self {
            on_ready: Box::new(on_ready),
            on_failed: Box::new(on_failed),
        }
    }
}

impl<T: Send> DataCallback<T> for FnCallback<T> {
    fn on_data_ready(self: Box<Self>, data: Option<T>) {
        (self.on_ready)(data)
    }

    fn on_load_failed(self: Box<Self>, error: FetchError) {
        (self.on_failed)(error)
    }
}

/// [`DataCallback`] that forwards the outcome into a oneshot channel.
pub struct OneshotCallback<T> {
    tx: oneshot::Sender<Result<Option<T>>>,
}

impl<T: Send> DataCallback<T> for OneshotCallback<T> {
    fn on_data_ready(self: Box<Self>, data: Option<T>) {
        // The receiver may have been dropped by a caller that lost interest.
        let _ = self.tx.send(Ok(data));
    }

    fn on_load_failed(self: Box<Self>, error: FetchError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Create a callback whose outcome can be awaited.
///
/// # Examples
///
/// ```
/// use lumen_data::{DataCallback, oneshot_callback};
///
/// let (callback, rx) = oneshot_callback::<u32>();
/// Box::new(callback).on_data_ready(Some(7));
/// assert_eq!(rx.blocking_recv().unwrap().unwrap(), Some(7));
/// ```
pub fn oneshot_callback<T: Send>() -> (OneshotCallback<T>, oneshot::Receiver<Result<Option<T>>>) {
    let (tx, rx) = oneshot::channel();
    (OneshotCallback { tx }, rx)
}
