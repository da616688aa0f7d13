//! Token decoder port

use chrono::{DateTime, Utc};
use ecoroute_domain::{DomainResult, TokenClaims};

/// Reads the claims of an access or refresh token.
pub trait TokenDecoder: Send + Sync {
    /// Decodes the token payload without verifying the signature.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for malformed tokens.
    fn decode(&self, token: &str) -> DomainResult<TokenClaims>;

    /// Returns the token's expiry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for malformed tokens.
    fn expires_at(&self, token: &str) -> DomainResult<DateTime<Utc>> {
        self.decode(token)?.expires_at()
    }
}
