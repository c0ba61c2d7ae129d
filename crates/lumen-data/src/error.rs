//! Error types for lumen-data.

use std::io;
use thiserror::Error;

/// Boxed error from a transport or other foreign source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid asset path: {0}")]
    InvalidPath(String),

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("response body already consumed")]
    BodyConsumed,

    #[error("premature end of stream: expected {expected} bytes, but read {actual}")]
    PrematureEnd { expected: u64, actual: u64 },

    #[error("fetch aborted before completion")]
    Aborted,

    #[error("stream closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Wrap any transport-level error.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        FetchError::Transport(error.into())
    }

    /// Returns `true` if the error was produced by a truncated body.
    pub fn is_premature_end(&self) -> bool {
        matches!(self, FetchError::PrematureEnd { .. })
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
