//! Remote data fetching over HTTP.
//!
//! # Architecture
//!
//! - [`compose_request`] - Builds the outbound header set, adding a default `User-Agent`
//! - [`ContentLengthStream`] - Fails loudly when a body ends before its declared length
//! - [`Transport`] - Asynchronous request execution, implemented by [`ReqwestTransport`]
//! - [`HttpStreamFetcher`] - [`lumen_data::DataFetcher`] owning one request's lifecycle
//!
//! A [`HttpClient`] bundles a transport, the runtime its requests run on and the
//! default user agent, and hands out one fetcher per [`ImageUrl`].

mod agent;
mod bridge;
mod client;
mod fetcher;
mod guard;
mod headers;
mod transport;

#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use agent::{AGENT_ENV_VAR, default_user_agent};
pub use client::HttpClient;
pub use fetcher::{HttpStreamFetcher, LoadState};
pub use guard::{ContentLengthStream, parse_content_length};
pub use headers::{FetchRequest, Headers, ImageUrl, USER_AGENT, compose_request};
pub use transport::{Transport, TransportResponse};

#[cfg(feature = "reqwest")]
pub use reqwest_transport::{ReqwestResponse, ReqwestTransport, TransportOptions};
