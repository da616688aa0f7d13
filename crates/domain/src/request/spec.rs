//! A single call against the remote API.

use std::collections::BTreeMap;

use serde::Serialize;

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// Name of the header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";

/// An API request relative to the configured base URL.
///
/// Requests are plain values so the coordinator can replay them after a
/// token refresh. `retried` is set on the replay and prevents a second
/// refresh for the same call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the base URL, e.g. `/routes/calculate`.
    pub path: String,
    /// Query parameters in order; keys may repeat.
    pub query: Vec<(String, String)>,
    /// Extra headers.
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// True once this request has been replayed after a refresh.
    pub retried: bool,
}

impl ApiRequest {
    /// Creates a request with no query, headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            retried: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends several query parameters.
    #[must_use]
    pub fn with_query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> DomainResult<Self> {
        let value =
            serde_json::to_value(body).map_err(|e| DomainError::InvalidBody(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sets a header, replacing any previous value with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets the bearer token header.
    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.set_bearer(token);
        self
    }

    /// Sets a header in place.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Sets the bearer token header in place.
    pub fn set_bearer(&mut self, token: &str) {
        self.set_header(AUTHORIZATION, format!("Bearer {token}"));
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the bearer token, if one is attached.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Returns true if the path is `endpoint`, or continues it past a
    /// `/`, `?` or `-` boundary (`/auth/refresh-token` targets `/auth/refresh`,
    /// `/auth/refreshments` does not).
    #[must_use]
    pub fn targets(&self, endpoint: &str) -> bool {
        let endpoint = endpoint.trim_end_matches('/');
        self.path
            .strip_prefix(endpoint)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '-']))
    }
}

impl std::fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
