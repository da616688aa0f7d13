//! HTTP transport port

use async_trait::async_trait;
use ecoroute_domain::{ApiRequest, ApiResponse};
use thiserror::Error;

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS resolution failed for {host}: {message}")]
    Dns {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Port for sending API requests.
///
/// Implementations resolve the request path against their base URL and
/// return every HTTP status as a response; only the absence of a response
/// is an error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
