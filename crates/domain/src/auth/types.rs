//! Wire types for the authentication endpoints.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Token pair returned by `/auth/login` and `/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Short-lived credential authorizing API calls.
    pub access_token: String,
    /// Longer-lived credential used to obtain a new access token.
    pub refresh_token: String,
    /// Token type, usually "bearer".
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl AuthTokens {
    /// Creates a bearer token pair.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
        }
    }
}

/// Decoded JWT payload.
///
/// Only the fields the client relies on are modelled; the signature is
/// never checked client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id).
    #[serde(default)]
    pub sub: String,
    /// Email of the token owner.
    #[serde(default)]
    pub email: String,
    /// "access" or "refresh".
    #[serde(rename = "type", default)]
    pub token_type: String,
    /// Unique token id.
    #[serde(default)]
    pub jti: String,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl TokenClaims {
    /// Returns the expiry as a timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if `exp` is outside the representable range.
    pub fn expires_at(&self) -> DomainResult<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| DomainError::InvalidToken(format!("exp out of range: {}", self.exp)))
    }

    /// Time left before expiry, clamped at zero. An `exp` too far out to
    /// represent saturates at [`Duration::MAX`].
    #[must_use]
    pub fn ttl(&self, now: DateTime<Utc>) -> Duration {
        let remaining = self.exp.saturating_sub(now.timestamp()).max(0);
        Duration::try_seconds(remaining).unwrap_or(Duration::MAX)
    }

    /// Returns true once `now` has reached the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl(now) <= Duration::zero()
    }
}

/// Authenticated user as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    /// User identifier.
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Creation timestamp as sent by the server.
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp as sent by the server.
    #[serde(default)]
    pub updated_at: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Display name.
    pub full_name: String,
}

/// Body of `PUT /auth/forgot-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account email.
    pub email: String,
}

/// Body of `PUT /auth/reset-password/{token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    /// The replacement password.
    pub new_password: String,
}

/// Body of `PUT /auth/change-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub old_password: String,
    /// Replacement password.
    pub new_password: String,
    /// Must equal `new_password`.
    pub confirm_new_password: String,
}

impl ChangePasswordRequest {
    /// Returns true if the confirmation matches the new password.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.new_password == self.confirm_new_password
    }
}

/// Generic `{success, message}` body returned by account endpoints.
///
/// Every field is optional; an empty body decodes to the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApiMessage {
    /// Whether the operation succeeded, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Human-readable message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
