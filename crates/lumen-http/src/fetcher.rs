use std::sync::{Arc, Mutex, MutexGuard};

use lumen_data::{ByteStream, DataCallback, DataFetcher, DataSource, Priority, ReleaseHandle};
use tracing::{debug, trace};

use crate::bridge::CompletionBridge;
use crate::client::HttpClient;
use crate::headers::{ImageUrl, compose_request};
use crate::transport::{Transport, TransportResponse};

/// Observable lifecycle of a fetcher's current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet.
    Idle,
    /// Request submitted, waiting for the transport.
    Requested,
    /// Stream delivered; response and stream are held until cleanup.
    Ready,
    /// The request failed; nothing is held.
    Failed,
    /// Cleanup ran. Terminal for the cycle.
    CleanedUp,
}

/// Resources published by a successful completion and released by cleanup.
pub(crate) struct Acquired<R> {
    pub(crate) response: R,
    pub(crate) stream: ReleaseHandle,
}

enum Slot<R> {
    Idle,
    Requested(u64),
    Ready { acquired: Acquired<R> },
    Failed,
    CleanedUp,
}

/// State shared between a fetcher and the completion of its request.
///
/// Every `load_data` starts a new cycle; a completion only touches the slot
/// while its own cycle is still pending.
pub(crate) struct FetchState<R> {
    slot: Slot<R>,
    cycles: u64,
}

pub(crate) type SharedState<R> = Arc<Mutex<FetchState<R>>>;

pub(crate) fn lock<R>(state: &Mutex<FetchState<R>>) -> MutexGuard<'_, FetchState<R>> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R> FetchState<R> {
    fn new() -> Self {
        Self {
            slot: Slot::Idle,
            cycles: 0,
        }
    }

    fn begin(&mut self) -> u64 {
        self.cycles += 1;
        self.slot = Slot::Requested(self.cycles);
        self.cycles
    }

    fn is_pending(&self, cycle: u64) -> bool {
        matches!(self.slot, Slot::Requested(pending) if pending == cycle)
    }

    /// Store `acquired` for `cycle`, handing it back if the cycle is over.
    pub(crate) fn publish(&mut self, cycle: u64, acquired: Acquired<R>) -> Result<(), Acquired<R>> {
        if !self.is_pending(cycle) {
            return Err(acquired);
        }
        self.slot = Slot::Ready { acquired };
        Ok(())
    }

    pub(crate) fn fail(&mut self, cycle: u64) {
        if self.is_pending(cycle) {
            self.slot = Slot::Failed;
        }
    }

    fn clean_up(&mut self) -> Option<Acquired<R>> {
        match std::mem::replace(&mut self.slot, Slot::CleanedUp) {
            Slot::Ready { acquired } => Some(acquired),
            _ => None,
        }
    }

    fn load_state(&self) -> LoadState {
        match self.slot {
            Slot::Idle => LoadState::Idle,
            Slot::Requested(_) => LoadState::Requested,
            Slot::Ready { .. } => LoadState::Ready,
            Slot::Failed => LoadState::Failed,
            Slot::CleanedUp => LoadState::CleanedUp,
        }
    }
}

/// Fetches a byte stream for one [`ImageUrl`] through a [`Transport`].
///
/// The delivered stream is guarded by the response's declared content length
/// and stays releasable through [`DataFetcher::cleanup`] from any thread.
/// Responses with unsuccessful status codes are still delivered as data;
/// callers that care must inspect the bytes.
pub struct HttpStreamFetcher<T: Transport> {
    client: HttpClient<T>,
    url: ImageUrl,
    state: SharedState<T::Response>,
}

impl<T: Transport> HttpStreamFetcher<T> {
    pub fn new(client: HttpClient<T>, url: ImageUrl) -> Self {
        Self {
            client,
            url,
            state: Arc::new(Mutex::new(FetchState::new())),
        }
    }

    pub fn url(&self) -> &ImageUrl {
        &self.url
    }

    pub fn load_state(&self) -> LoadState {
        lock(&self.state).load_state()
    }
}

impl<T: Transport> DataFetcher for HttpStreamFetcher<T> {
    type Data = ByteStream;

    fn load_data(&self, priority: Priority, callback: Box<dyn DataCallback<ByteStream>>) {
        let request = compose_request(&self.url, self.client.user_agent());
        let cycle = lock(&self.state).begin();
        let bridge = CompletionBridge::new(callback, Arc::clone(&self.state), cycle, &self.url);
        let transport = Arc::clone(self.client.transport());

        trace!(url = %self.url, %priority, cycle, "dispatching request");
        self.client.runtime().spawn(async move {
            let result = transport.execute(request, priority).await;
            bridge.complete(result);
        });
    }

    fn cleanup(&self) {
        let Some(acquired) = lock(&self.state).clean_up() else {
            return;
        };
        acquired.stream.release();
        let mut response = acquired.response;
        if let Err(error) = response.close() {
            trace!(url = %self.url, %error, "ignoring error while closing response");
        }
    }

    fn cancel(&self) {
        // TODO: abort the spawned request task once a cancelled load can
        // report itself to the callback without racing the completion.
        debug!(url = %self.url, "cancel requested, in-flight request continues");
    }

    fn data_source(&self) -> DataSource {
        DataSource::Remote
    }
}
