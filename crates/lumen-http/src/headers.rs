//! Request descriptors and header composition.

use std::fmt;

use lumen_data::{FetchError, Result};
use tracing::debug;

/// Name of the identification header added to every request.
pub const USER_AGENT: &str = "User-Agent";

/// Ordered HTTP header list with case-insensitive lookup.
///
/// Insertion order is preserved for transmission and duplicate names are
/// allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a header, keeping any existing header of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value whose name matches `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers whose name matches `name`, ignoring ASCII case.
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Address of a remote image plus the headers the caller wants sent with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl {
    url: String,
    headers: Headers,
}

impl ImageUrl {
    /// Create an image URL without caller headers.
    ///
    /// Only emptiness is checked here; the transport rejects malformed URLs
    /// when the request is executed.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(FetchError::InvalidUrl(url));
        }
        Ok(Self {
            url,
            headers: Headers::new(),
        })
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl TryFrom<&str> for ImageUrl {
    type Error = FetchError;

    fn try_from(url: &str) -> Result<Self> {
        ImageUrl::new(url)
    }
}

/// A `GET` request ready to hand to a transport. Requests carry no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    headers: Headers,
}

impl FetchRequest {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// Build the outbound request for `url`.
///
/// Caller headers are copied in order. A `User-Agent` header carrying
/// `default_user_agent` is appended only when no caller header matches it
/// case-insensitively. When the caller supplied several, the first wins and
/// the rest are dropped, so exactly one reaches the transport.
///
/// # Examples
///
/// ```
/// use lumen_http::{ImageUrl, compose_request};
///
/// let url = ImageUrl::new("http://example.com/img.png").unwrap();
/// let request = compose_request(&url, "lumen-test");
/// assert_eq!(request.headers().get("user-agent"), Some("lumen-test"));
/// ```
pub fn compose_request(url: &ImageUrl, default_user_agent: &str) -> FetchRequest {
    let mut headers = Headers::with_capacity(url.headers().len() + 1);
    let mut agent_set = false;

    for (name, value) in url.headers().iter() {
        if name.eq_ignore_ascii_case(USER_AGENT) {
            if agent_set {
                debug!(url = %url, header = name, "dropping duplicate user agent header");
                continue;
            }
            agent_set = true;
        }
        headers.insert(name, value);
    }

    if !agent_set {
        headers.insert(USER_AGENT, default_user_agent);
    }

    FetchRequest {
        url: url.as_str().to_string(),
        headers,
    }
}
