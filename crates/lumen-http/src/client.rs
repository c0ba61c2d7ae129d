use std::sync::Arc;

use tokio::runtime::{Handle, TryCurrentError};

use crate::agent::default_user_agent;
use crate::fetcher::HttpStreamFetcher;
use crate::headers::ImageUrl;
use crate::transport::Transport;

/// Shared factory for [`HttpStreamFetcher`]s.
///
/// Owns the transport, the runtime requests are spawned on and the user agent
/// injected when a caller sets none. Cloning is cheap.
pub struct HttpClient<T> {
    transport: Arc<T>,
    runtime: Handle,
    user_agent: Arc<str>,
}

impl<T> Clone for HttpClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            runtime: self.runtime.clone(),
            user_agent: Arc::clone(&self.user_agent),
        }
    }
}

impl<T: Transport> HttpClient<T> {
    /// Create a client spawning requests on `runtime`, using the process
    /// default user agent.
    pub fn new(transport: T, runtime: Handle) -> Self {
        Self::from_arc(Arc::new(transport), runtime)
    }

    pub fn from_arc(transport: Arc<T>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            user_agent: Arc::from(default_user_agent()),
        }
    }

    /// Create a client on the runtime of the calling context.
    pub fn try_current(transport: T) -> Result<Self, TryCurrentError> {
        Ok(Self::new(transport, Handle::try_current()?))
    }

    /// Override the user agent sent when a caller supplies none.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Arc::from(user_agent.into());
        self
    }

    /// Create a fetcher for `url`.
    pub fn fetcher(&self, url: ImageUrl) -> HttpStreamFetcher<T> {
        HttpStreamFetcher::new(self.clone(), url)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

impl<T> std::fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
