//! JWT payload decoding.
//!
//! Only the claims are read. Signatures are the server's concern; the
//! client needs the expiry to schedule refreshes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ecoroute_application::ports::TokenDecoder;
use ecoroute_domain::{DomainError, DomainResult, TokenClaims};

/// Decodes the payload segment of a JWT.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtDecoder;

impl JwtDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn payload(token: &str) -> DomainResult<Vec<u8>> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| DomainError::InvalidToken(format!("payload is not base64url: {e}")))
    }
}

impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> DomainResult<TokenClaims> {
        let payload = Self::payload(token)?;
        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|e| DomainError::InvalidToken(format!("invalid claims: {e}")))?;
        claims.expires_at()?;
        Ok(claims)
    }
}
