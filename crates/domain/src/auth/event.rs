//! Lifecycle events emitted by the session machinery.

use serde::Serialize;

/// Events emitted while authenticating, refreshing and clearing a session.
///
/// `LoginRequired` is the signal a front end turns into a redirect to its
/// login view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A login succeeded.
    LoggedIn {
        /// Email of the logged-in user, when known.
        email: Option<String>,
    },
    /// The access token was refreshed.
    TokenRefreshed {
        /// Preview of the new access token.
        token_preview: String,
        /// Seconds until the new token expires.
        expires_in: i64,
    },
    /// A refresh attempt failed.
    RefreshFailed {
        /// Consecutive failure count including this one.
        attempt: u32,
        /// Configured ceiling.
        max: u32,
        /// Error message.
        message: String,
    },
    /// The session was cleared and the user must authenticate again.
    LoginRequired {
        /// Why the session was cleared.
        reason: String,
    },
    /// The user logged out.
    LoggedOut,
}

impl AuthEvent {
    /// Get a preview of an access token (first 8 chars + ...).
    #[must_use]
    pub fn token_preview(token: &str) -> String {
        if token.chars().count() > 12 {
            let head: String = token.chars().take(8).collect();
            format!("{head}...")
        } else {
            token.to_string()
        }
    }

    /// Returns true for events after which no session remains.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(self, Self::LoginRequired { .. } | Self::LoggedOut)
    }
}
