//! HTTP transport behind the submission client.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::SharedJarCookies;
use crate::config::ServerConfig;

/// Failures below the HTTP response level.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Could not connect to the server.
    #[error("connection failed: {0}")]
    Connect(String),
    /// No response within the timeout.
    #[error("request timed out")]
    Timeout,
    /// The url could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// An outgoing POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute url.
    pub url: String,
    /// Header name/value pairs, in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A received response; the body is not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests on behalf of the submission client.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// POSTs `request` and returns whatever the server answered.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed client that keeps server cookies between requests.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    jar: Arc<reqwest::cookie::Jar>,
    base_url: reqwest::Url,
}

impl ReqwestHttpClient {
    /// Builds a client for the server described by `config`.
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    /// Cookie view for the configured server origin.
    pub fn cookies(&self) -> SharedJarCookies {
        SharedJarCookies::new(Arc::clone(&self.jar), self.base_url.clone())
    }

    /// Stores a cookie for the server origin, as if the server had set it.
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.base_url);
    }

    /// Fetches `path` so the server can set its anti-forgery cookie.
    pub async fn bootstrap_cookies(&self, path: &str) -> Result<u16, TransportError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        tracing::debug!(url = %url, status, "Fetched page for cookies");
        Ok(status)
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::trace!(url = %request.url, status, body_bytes = body.len(), "POST completed");
        Ok(HttpResponse { status, body })
    }
}
