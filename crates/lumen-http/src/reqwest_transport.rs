use std::time::Duration;

use futures_util::TryStreamExt;
use lumen_data::{ByteStream, FetchError, Priority, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::headers::FetchRequest;
use crate::transport::{Transport, TransportResponse};

/// Configuration for [`ReqwestTransport`].
///
/// # Examples
///
/// ```
/// use lumen_http::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .request_timeout(Some(Duration::from_secs(10)))
///     .pool_max_idle_per_host(4);
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Timeout covering the whole exchange, body included. `None` disables it.
    ///
    /// Default: 30s
    pub request_timeout: Option<Duration>,

    /// Timeout for establishing a connection.
    ///
    /// Default: 10s
    pub connect_timeout: Duration,

    /// Max idle connections kept per host.
    ///
    /// Default: 8
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 8,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }
}

/// Production transport implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(&TransportOptions::default())
    }

    pub fn with_options(options: &TransportOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::transport)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn header_map(request: &FetchRequest) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(request.headers().len());
    for (name, value) in request.headers().iter() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(FetchError::transport)?;
        let value = HeaderValue::from_str(value).map_err(FetchError::transport)?;
        headers.append(name, value);
    }
    Ok(headers)
}

impl Transport for ReqwestTransport {
    type Response = ReqwestResponse;

    async fn execute(&self, request: FetchRequest, _priority: Priority) -> Result<ReqwestResponse> {
        let headers = header_map(&request)?;
        let response = self
            .client
            .get(request.url())
            .headers(headers)
            .send()
            .await
            .map_err(FetchError::transport)?;
        Ok(ReqwestResponse::new(response))
    }
}

/// Response handle produced by [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestResponse {
    status: StatusCode,
    content_length: Option<u64>,
    inner: Option<reqwest::Response>,
}

impl ReqwestResponse {
    fn new(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            content_length: response.content_length(),
            inner: Some(response),
        }
    }
}

impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn reason(&self) -> Option<&str> {
        self.status.canonical_reason()
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn take_body(&mut self) -> Result<ByteStream> {
        let response = self.inner.take().ok_or(FetchError::BodyConsumed)?;
        Ok(Box::pin(response.bytes_stream().map_err(FetchError::transport)))
    }

    fn close(&mut self) -> Result<()> {
        self.inner = None;
        Ok(())
    }
}
