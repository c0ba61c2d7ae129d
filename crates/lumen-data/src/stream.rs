//! Byte stream types shared by all fetchers.
//!
//! A fetcher hands its stream to the pipeline but must still be able to
//! release the underlying body during cleanup, which can run on any thread.
//! [`ReleasableStream`] and [`ReleaseHandle`] share the body behind a mutex so
//! either side can drop it.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures_util::Stream;

use crate::error::{FetchError, Result};

/// A boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

struct Shared {
    body: Option<ByteStream>,
    waker: Option<Waker>,
    closed_reported: bool,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // A panic while polling the body leaves the state itself consistent.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Stream half of a releasable body.
///
/// Yields the body's chunks until the body ends or the paired
/// [`ReleaseHandle`] releases it. After release the next poll yields
/// [`FetchError::Closed`] and the stream then ends.
pub struct ReleasableStream {
    shared: Arc<Mutex<Shared>>,
}

/// Handle that releases the body of a [`ReleasableStream`].
#[derive(Clone)]
pub struct ReleaseHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ReleasableStream {
    /// Split `body` into a stream and a handle that can release it.
    pub fn new(body: ByteStream) -> (Self, ReleaseHandle) {
        let shared = Arc::new(Mutex::new(Shared {
            body: Some(body),
            waker: None,
            closed_reported: false,
        }));
        let handle = ReleaseHandle {
            shared: Arc::clone(&shared),
        };
        (Self { shared }, handle)
    }
}

impl Stream for ReleasableStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut shared = lock(&self.shared);
        let Some(body) = shared.body.as_mut() else {
            if shared.closed_reported {
                return Poll::Ready(None);
            }
            shared.closed_reported = true;
            return Poll::Ready(Some(Err(FetchError::Closed)));
        };

        match body.as_mut().poll_next(cx) {
            Poll::Pending => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            ready => {
                shared.waker = None;
                ready
            }
        }
    }
}

impl ReleaseHandle {
    /// Drop the underlying body and wake a reader waiting on it.
    ///
    /// Returns `true` if this call released the body, `false` if it was
    /// already released.
    pub fn release(&self) -> bool {
        let (body, waker) = {
            let mut shared = lock(&self.shared);
            (shared.body.take(), shared.waker.take())
        };
        let released = body.is_some();
        // Drop the body outside the lock; its destructor may do I/O.
        drop(body);
        if let Some(waker) = waker {
            waker.wake();
        }
        released
    }

    pub fn is_released(&self) -> bool {
        lock(&self.shared).body.is_none()
    }
}

impl std::fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("released", &self.is_released())
            .finish()
    }
}
