//! Element sources and the HTTP Overpass implementation.

use std::time::Duration;

use async_trait::async_trait;
use infrascan_core::RawElement;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::query::OverpassQuery;
use super::response::OverpassResponse;

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "infrascan/0.1";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Longest upstream error body quoted in a [`SourceError::Http`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Failure of a single fetch attempt.
///
/// Every variant is treated as transient by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The endpoint answered with a status other than 200.
    #[error("Overpass API returned status {status}: {body}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// The request could not be sent or the response could not be read.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded its timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The response body was not a valid Overpass JSON document.
    #[error("failed to decode Overpass response from {url}: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
}

/// Errors raised while constructing an [`HttpOverpassSource`].
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The endpoint was not an absolute URL.
    #[error("invalid Overpass endpoint {url:?}: {source}")]
    InvalidUrl {
        /// Endpoint as configured.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        /// Client builder error.
        #[source]
        source: reqwest::Error,
    },
}

/// Something that can answer an Overpass query with raw elements.
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// Endpoint description used in logs.
    fn endpoint(&self) -> &str;

    /// Run `query` once, returning elements in the order received.
    async fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawElement>, SourceError>;
}

/// Configuration for [`HttpOverpassSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassSourceConfig {
    /// Interpreter endpoint.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for OverpassSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERPASS_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OverpassSourceConfig {
    /// Configuration targeting `url` with default timeout and user agent.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`ElementSource`] that posts queries to an Overpass interpreter.
///
/// The underlying client pools connections and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpOverpassSource {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl HttpOverpassSource {
    /// Source for `url` with default settings.
    ///
    /// # Errors
    ///
    /// See [`HttpOverpassSource::with_config`].
    pub fn new(url: impl Into<String>) -> Result<Self, SourceBuildError> {
        Self::with_config(OverpassSourceConfig::new(url))
    }

    /// Source built from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceBuildError::InvalidUrl`] when the endpoint does not
    /// parse and [`SourceBuildError::HttpClient`] when the client cannot be
    /// built.
    pub fn with_config(config: OverpassSourceConfig) -> Result<Self, SourceBuildError> {
        let url = Url::parse(&config.url).map_err(|source| SourceBuildError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|source| SourceBuildError::HttpClient { source })?;
        Ok(Self {
            client,
            url,
            timeout: config.timeout,
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> SourceError {
        if error.is_timeout() {
            return SourceError::Timeout {
                url: self.url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            };
        }
        SourceError::Network {
            url: self.url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl ElementSource for HttpOverpassSource {
    fn endpoint(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawElement>, SourceError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(query.as_str().to_owned())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;

        if status != StatusCode::OK {
            return Err(SourceError::Http {
                url: self.url.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let decoded: OverpassResponse =
            serde_json::from_slice(&body).map_err(|err| SourceError::Decode {
                url: self.url.to_string(),
                message: err.to_string(),
            })?;
        debug!(
            "Overpass returned {} elements from {}",
            decoded.elements.len(),
            self.url
        );
        Ok(decoded.into_elements())
    }
}

fn truncate_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}
