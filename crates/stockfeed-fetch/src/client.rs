//! Upstream transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use stockfeed_config::HttpSettings;
use stockfeed_types::{FeedError, TransportError};
use tracing::debug;

/// Query string pairs sent with a request.
pub type Query = Vec<(&'static str, String)>;

/// A successful upstream response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    /// The requested URL, without query string.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl RawPayload {
    /// Creates a 200 payload, mainly for tests and custom transports.
    #[must_use]
    pub fn ok(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MalformedPayload`] if the body is not JSON.
    pub fn json(&self) -> Result<serde_json::Value, FeedError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            FeedError::MalformedPayload(format!("response from {} is not JSON: {e}", self.url))
        })
    }
}

/// Issues one GET request per call.
///
/// Implementations must not retry; retrying belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Fetches `url` with the given query string.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, or when
    /// the request outlives `timeout`.
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<RawPayload, TransportError>;
}

/// HTTP transport backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport from HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the HTTP client cannot be created.
    pub fn new(settings: &HttpSettings) -> Result<Self, FeedError> {
        let client = Client::builder()
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(settings.pool_idle_timeout())
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(settings.timeout())
            .connect_timeout(settings.connect_timeout())
            .user_agent(&settings.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| FeedError::Config(format!("build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Creates a transport with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, FeedError> {
        Self::new(&HttpSettings::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<RawPayload, TransportError> {
        debug!(url, ?query, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(url, &e))?;
        Ok(RawPayload {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

fn map_reqwest_error(url: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout {
            url: url.to_string(),
        };
    }
    TransportError::Network {
        url: url.to_string(),
        message: error.to_string(),
        connect: error.is_connect(),
    }
}
