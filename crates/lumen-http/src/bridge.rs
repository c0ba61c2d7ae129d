//! Adapts a transport result to the single-shot callback contract.

use std::sync::Arc;

use lumen_data::{ByteStream, DataCallback, FetchError, ReleasableStream, Result};
use tracing::{debug, trace};

use crate::fetcher::{Acquired, SharedState, lock};
use crate::guard::ContentLengthStream;
use crate::headers::ImageUrl;
use crate::transport::TransportResponse;

/// Delivers the outcome of one request cycle to its callback.
///
/// Dropped without completing (e.g. the runtime shut down before the request
/// finished), it reports [`FetchError::Aborted`] so the callback still runs
/// exactly once.
pub(crate) struct CompletionBridge<R> {
    callback: Option<Box<dyn DataCallback<ByteStream>>>,
    state: SharedState<R>,
    cycle: u64,
    url: Arc<str>,
}

impl<R: TransportResponse> CompletionBridge<R> {
    pub(crate) fn new(
        callback: Box<dyn DataCallback<ByteStream>>,
        state: SharedState<R>,
        cycle: u64,
        url: &ImageUrl,
    ) -> Self {
        Self {
            callback: Some(callback),
            state,
            cycle,
            url: Arc::from(url.as_str()),
        }
    }

    pub(crate) fn complete(mut self, result: Result<R>) {
        match result {
            Ok(response) => self.on_response(response),
            Err(error) => self.on_failure(error),
        }
    }

    fn on_response(&mut self, mut response: R) {
        if !response.is_success() {
            debug!(
                url = %self.url,
                status = response.status(),
                reason = response.reason().unwrap_or(""),
                "got error response"
            );
        }

        let body = match response.take_body() {
            Ok(body) => body,
            Err(error) => {
                if let Err(close_error) = response.close() {
                    trace!(url = %self.url, error = %close_error, "ignoring error while closing response");
                }
                self.on_failure(error);
                return;
            }
        };

        let (body, handle) = ReleasableStream::new(body);
        let stream = ContentLengthStream::new(body, response.content_length());
        let acquired = Acquired {
            response,
            stream: handle,
        };

        if lock(&self.state).publish(self.cycle, acquired).is_err() {
            trace!(url = %self.url, cycle = self.cycle, "cycle already cleaned up, not retaining response");
        }

        if let Some(callback) = self.callback.take() {
            callback.on_data_ready(Some(Box::pin(stream)));
        }
    }

    fn on_failure(&mut self, error: FetchError) {
        debug!(url = %self.url, %error, "failed to obtain result");
        lock(&self.state).fail(self.cycle);
        if let Some(callback) = self.callback.take() {
            callback.on_load_failed(error);
        }
    }
}

impl<R> Drop for CompletionBridge<R> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            lock(&self.state).fail(self.cycle);
            callback.on_load_failed(FetchError::Aborted);
        }
    }
}
