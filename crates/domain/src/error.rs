//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A coordinate pair is outside the valid longitude/latitude range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A route geometry is malformed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A route has impossible metrics.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// The cargo weight must be strictly positive.
    #[error("invalid cargo weight: {0}")]
    InvalidCargoWeight(String),

    /// A token could not be decoded.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A request body could not be serialized.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A search query is too short or otherwise unusable.
    #[error("invalid search query: {0}")]
    InvalidQuery(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
