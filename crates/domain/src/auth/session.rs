//! Persisted client session and its display status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{AuthTokens, User};

/// The authenticated session owned by the client process.
///
/// Mutated only by login, refresh and logout; destroyed on logout or on
/// unrecoverable refresh failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Current access token.
    pub access_token: String,
    /// Current refresh token.
    pub refresh_token: String,
    /// Token type, usually "bearer".
    pub token_type: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
    /// The logged-in user, if it has been fetched.
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// Creates a session from a freshly issued token pair.
    #[must_use]
    pub fn new(tokens: AuthTokens, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at,
            user: None,
        }
    }

    /// Attaches the user profile.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Returns a copy carrying a new token pair, keeping the user.
    #[must_use]
    pub fn with_tokens(&self, tokens: AuthTokens, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at,
            user: self.user.clone(),
        }
    }

    /// Seconds until the access token expires (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }

    /// Returns true if the token expires within `buffer_seconds`.
    #[must_use]
    pub fn is_expired_or_expiring(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        self.seconds_until_expiry(now) <= buffer_seconds
    }

    /// Computes the display status of this session.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, refresh_buffer_seconds: i64) -> SessionStatus {
        if self.is_expired_or_expiring(now, 0) {
            SessionStatus::Expired
        } else if self.is_expired_or_expiring(now, refresh_buffer_seconds) {
            SessionStatus::Expiring {
                seconds_remaining: self.seconds_until_expiry(now),
            }
        } else {
            SessionStatus::Valid {
                seconds_remaining: self.seconds_until_expiry(now),
            }
        }
    }
}

/// Status of the stored session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session is stored.
    NotAuthenticated,
    /// Access token is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Access token will expire soon.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Access token has expired; the refresh token may still work.
    Expired,
}

impl SessionStatus {
    /// Status of an optional session.
    #[must_use]
    pub fn of(session: Option<&Session>, now: DateTime<Utc>, refresh_buffer_seconds: i64) -> Self {
        session.map_or(Self::NotAuthenticated, |s| {
            s.status(now, refresh_buffer_seconds)
        })
    }

    /// Returns true if the access token is usable.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Returns true if the session needs attention (expiring or expired).
    #[must_use]
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::Expiring { .. } | Self::Expired)
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring { seconds_remaining } => {
                format!("Expiring in {seconds_remaining} seconds (will auto-refresh)")
            }
            Self::Expired => "Expired".to_string(),
        }
    }
}
