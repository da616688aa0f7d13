//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. Request paths are
//! resolved against the configured API base URL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ecoroute_application::ports::{HttpTransport, TransportError};
use ecoroute_domain::{ApiRequest, ApiResponse, HttpMethod};
use reqwest::{Client, Method, Url};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const USER_AGENT: &str = concat!("ecoroute/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, TransportError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms,
        })
    }

    /// Creates a transport around an existing reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_client(
        client: Client,
        base_url: &str,
        timeout_ms: u64,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            timeout_ms,
        })
    }

    /// The API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a request path and query against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the base URL cannot carry a path.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| TransportError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(request.path.split('/').filter(|s| !s.is_empty()));
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return TransportError::Dns {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return TransportError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        TransportError::Other(error.to_string())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, TransportError> {
    let url = Url::parse(base_url)
        .map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::InvalidUrl(format!(
            "not an http(s) base URL: {base_url}"
        )));
    }
    Ok(url)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(request)?;
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(Duration::from_millis(self.timeout_ms));

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        Ok(ApiResponse::new(status, headers, body, start.elapsed()))
    }
}
