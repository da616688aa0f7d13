//! Application error types

use ecoroute_domain::{ApiResponse, DomainError};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::ports::{StoreError, TransportError};

/// Application-level errors.
///
/// `Clone` so that one refresh outcome can be handed to every request
/// queued behind it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// No response was received.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The server rejected the credentials after the single allowed retry.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server rejected the payload (400/422).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server failed (5xx).
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Server message.
        message: String,
    },

    /// Any other non-success status.
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status.
        status: u16,
        /// Server message.
        message: String,
    },

    /// The session is gone and the user must log in again.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// The session changed while a refresh was in flight; its result was discarded.
    #[error("session was cleared while refreshing")]
    SessionCleared,

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The session store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ApplicationError {
    /// Maps a non-success response to an error.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        let status = response.status.as_u16();
        let message = response.error_message();
        match status {
            400 | 422 => Self::Validation(message),
            401 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Http { status, message },
        }
    }

    /// Returns true for failures a user may retry as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Returns true if the user has to authenticate again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::SessionCleared)
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Passes success responses through and maps the rest to errors.
///
/// # Errors
///
/// Returns the mapped error for any non-2xx status.
pub fn ensure_success(response: ApiResponse) -> ApplicationResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApplicationError::from_response(&response))
    }
}

/// Decodes a JSON body.
///
/// # Errors
///
/// Returns `Decode` if the body does not match `T`.
pub fn decode_json<T: DeserializeOwned>(response: &ApiResponse) -> ApplicationResult<T> {
    response
        .json()
        .map_err(|e| ApplicationError::Decode(e.to_string()))
}
