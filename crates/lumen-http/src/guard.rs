//! Truncation guard for response bodies.
//!
//! This module provides a stream wrapper that turns a body ending short of
//! its declared `Content-Length` into an error instead of a clean end of
//! stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream::FusedStream;
use lumen_data::{FetchError, Result};
use tracing::debug;

/// Parse a `Content-Length` header value.
///
/// Returns `None` for missing, negative or malformed values, which disables
/// the truncation check.
pub fn parse_content_length(header: &str) -> Option<u64> {
    let header = header.trim();
    if header.is_empty() {
        return None;
    }
    match header.parse::<u64>() {
        Ok(length) => Some(length),
        Err(error) => {
            debug!(header, %error, "failed to parse content length header");
            None
        }
    }
}

/// A stream that fails if fewer bytes than declared arrive before the end.
///
/// Chunks and errors from the inner stream pass through unchanged. When the
/// inner stream ends after fewer than `expected` bytes, one
/// [`FetchError::PrematureEnd`] is yielded before the stream ends. With an
/// unknown length nothing is checked. Bytes beyond the declared length are not
/// an error.
pub struct ContentLengthStream<S> {
    inner: S,
    expected: Option<u64>,
    read: u64,
    finished: bool,
}

impl<S> ContentLengthStream<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    pub fn new(inner: S, expected: Option<u64>) -> Self {
        Self {
            inner,
            expected,
            read: 0,
            finished: false,
        }
    }

    /// Create a guard from a raw `Content-Length` header value.
    pub fn from_header(inner: S, header: Option<&str>) -> Self {
        Self::new(inner, header.and_then(parse_content_length))
    }

    pub fn expected_len(&self) -> Option<u64> {
        self.expected
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Declared bytes not yet read, or `None` when the length is unknown.
    pub fn remaining(&self) -> Option<u64> {
        self.expected
            .map(|expected| expected.saturating_sub(self.read))
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Stream for ContentLengthStream<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.read += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(FetchError::Closed))) => {
                // Released body: nothing more will arrive.
                this.finished = true;
                Poll::Ready(Some(Err(FetchError::Closed)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => {
                this.finished = true;
                match this.expected {
                    Some(expected) if this.read < expected => {
                        Poll::Ready(Some(Err(FetchError::PrematureEnd {
                            expected,
                            actual: this.read,
                        })))
                    }
                    _ => Poll::Ready(None),
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> FusedStream for ContentLengthStream<S>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
