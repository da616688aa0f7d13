//! In-memory session storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoroute_domain::{AuthTokens, Session};
use tokio::sync::RwLock;

use crate::ports::{SessionStore, StoreError};

/// Thread-safe in-memory session store.
///
/// Nothing survives the process; use the file-backed store to persist.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    session: Arc<RwLock<Option<Session>>>,
    redirect: Arc<RwLock<Option<String>>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(Some(session))),
            redirect: Arc::new(RwLock::new(None)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn replace_tokens(
        &self,
        expected_refresh_token: &str,
        tokens: AuthTokens,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut slot = self.session.write().await;
        let Some(current) = slot.as_ref() else {
            return Ok(None);
        };
        if current.refresh_token != expected_refresh_token {
            return Ok(None);
        }
        let updated = current.with_tokens(tokens, expires_at);
        *slot = Some(updated.clone());
        Ok(Some(updated))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.session.write().await.take();
        Ok(())
    }

    async fn save_redirect(&self, url: &str) -> Result<(), StoreError> {
        *self.redirect.write().await = Some(url.to_string());
        Ok(())
    }

    async fn take_redirect(&self) -> Result<Option<String>, StoreError> {
        Ok(self.redirect.write().await.take())
    }

    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone()))
    }
}
