use std::future::Future;

use lumen_data::{ByteStream, Priority, Result};

use crate::headers::FetchRequest;

/// Asynchronous HTTP request execution.
///
/// Implementations own connection pooling, redirects and retries. The future
/// is polled on the client's runtime, never on the thread calling
/// [`lumen_data::DataFetcher::load_data`].
///
/// # Implementations
///
/// - [`ReqwestTransport`](crate::ReqwestTransport): Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait Transport: Send + Sync + 'static {
    type Response: TransportResponse;

    /// Execute `request`, resolving once response headers are available.
    ///
    /// `priority` is a hint; implementations may ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error when no response could be obtained (DNS failure,
    /// connection error, timeout, invalid request). A response with an
    /// unsuccessful status is not an error.
    fn execute(
        &self,
        request: FetchRequest,
        priority: Priority,
    ) -> impl Future<Output = Result<Self::Response>> + Send;
}

/// A response whose headers have arrived and whose body is still unread.
pub trait TransportResponse: Send + 'static {
    fn status(&self) -> u16;

    /// Status reason phrase, if known.
    fn reason(&self) -> Option<&str>;

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Declared body length, `None` when absent or unparseable.
    fn content_length(&self) -> Option<u64>;

    /// Take the body stream. Fails if the body was already taken.
    fn take_body(&mut self) -> Result<ByteStream>;

    /// Release the response and anything it still holds.
    fn close(&mut self) -> Result<()>;
}
