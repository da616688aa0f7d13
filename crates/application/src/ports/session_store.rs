//! Session store port
//!
//! Defines the interface for session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoroute_domain::{AuthTokens, Session};
use thiserror::Error;

/// Errors that can occur during session persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted auth state: the session plus a pending post-login redirect.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the current session, if any.
    async fn load(&self) -> Result<Option<Session>, StoreError>;

    /// Replaces the current session.
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Swaps in a new token pair if the stored session still carries
    /// `expected_refresh_token`, keeping its user.
    ///
    /// The comparison and the write happen under one lock, so a concurrent
    /// `save` or `clear` is never overwritten. Returns the updated session,
    /// or `None` when the session was replaced or cleared.
    async fn replace_tokens(
        &self,
        expected_refresh_token: &str,
        tokens: AuthTokens,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Removes the current session. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Remembers where to go after the next login.
    async fn save_redirect(&self, url: &str) -> Result<(), StoreError>;

    /// Returns and forgets the pending redirect.
    async fn take_redirect(&self) -> Result<Option<String>, StoreError>;

    /// Returns the current access token.
    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load().await?.map(|s| s.access_token))
    }
}
