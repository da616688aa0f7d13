//! File-backed session store.
//!
//! The session lives in `auth-storage.json` inside the session directory,
//! the pending post-login redirect in `auth-redirect-url`. Reads are served
//! from memory after the first load; every write goes to disk first.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoroute_application::ports::{SessionStore, StoreError};
use ecoroute_domain::{AuthTokens, Session};
use tokio::fs;
use tokio::sync::RwLock;

use crate::serialization::{from_json_bytes, to_json_pretty_bytes};

/// Session file name.
pub const SESSION_FILE: &str = "auth-storage.json";
/// Redirect file name.
pub const REDIRECT_FILE: &str = "auth-redirect-url";

#[derive(Debug)]
enum Cached {
    Unloaded,
    Loaded(Option<Session>),
}

/// Session store persisted as JSON on disk.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
    cache: RwLock<Cached>,
}

fn io_error(path: &Path, e: &std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {e}", path.display()))
}

impl FileSessionStore {
    /// Creates a store rooted at `dir`. Nothing is read until first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(Cached::Unloaded),
        }
    }

    /// Path of the session file.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Path of the redirect file.
    #[must_use]
    pub fn redirect_path(&self) -> PathBuf {
        self.dir.join(REDIRECT_FILE)
    }

    async fn read_session(&self) -> Result<Option<Session>, StoreError> {
        let path = self.session_path();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, &e)),
        };

        match from_json_bytes(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// Writes `contents` next to `path` and renames it into place.
    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, &e))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| io_error(&tmp, &e))?;
        restrict_permissions(&tmp).await?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| io_error(path, &e))
    }

    async fn persist(&self, session: &Session) -> Result<(), StoreError> {
        let bytes =
            to_json_pretty_bytes(session).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_file(&self.session_path(), &bytes).await?;
        tracing::debug!(path = %self.session_path().display(), "Session saved");
        Ok(())
    }

    async fn remove_file(path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path, &e)),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| io_error(path, &e))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>, StoreError> {
        if let Cached::Loaded(session) = &*self.cache.read().await {
            return Ok(session.clone());
        }

        let mut cache = self.cache.write().await;
        if let Cached::Loaded(session) = &*cache {
            return Ok(session.clone());
        }
        let session = self.read_session().await?;
        *cache = Cached::Loaded(session.clone());
        Ok(session)
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        self.persist(session).await?;
        *cache = Cached::Loaded(Some(session.clone()));
        Ok(())
    }

    async fn replace_tokens(
        &self,
        expected_refresh_token: &str,
        tokens: AuthTokens,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut cache = self.cache.write().await;
        let current = match &*cache {
            Cached::Loaded(session) => session.clone(),
            Cached::Unloaded => self.read_session().await?,
        };
        let Some(current) = current.filter(|s| s.refresh_token == expected_refresh_token) else {
            tracing::debug!("Session changed since refresh started, keeping it");
            return Ok(None);
        };

        let updated = current.with_tokens(tokens, expires_at);
        self.persist(&updated).await?;
        *cache = Cached::Loaded(Some(updated.clone()));
        Ok(Some(updated))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        Self::remove_file(&self.session_path()).await?;
        *cache = Cached::Loaded(None);
        Ok(())
    }

    async fn save_redirect(&self, url: &str) -> Result<(), StoreError> {
        self.write_file(&self.redirect_path(), url.as_bytes()).await
    }

    async fn take_redirect(&self) -> Result<Option<String>, StoreError> {
        let path = self.redirect_path();
        let url = match fs::read_to_string(&path).await {
            Ok(url) => url,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, &e)),
        };
        Self::remove_file(&path).await?;

        let url = url.trim();
        Ok((!url.is_empty()).then(|| url.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ecoroute_domain::{AuthTokens, User};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn session() -> Session {
        Session::new(
            AuthTokens::bearer("access", "refresh"),
            DateTime::from_timestamp(1_700_000_900, 0).unwrap(),
        )
        .with_user(User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            ..User::default()
        })
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_survives_a_new_store() {
        let dir = TempDir::new().unwrap();
        FileSessionStore::new(dir.path())
            .save(&session())
            .await
            .unwrap();

        let reopened = FileSessionStore::new(dir.path());

        assert_eq!(reopened.load().await.unwrap(), Some(session()));
        assert_eq!(
            reopened.access_token().await.unwrap().as_deref(),
            Some("access")
        );
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileSessionStore::new(&nested);

        store.save(&session()).await.unwrap();

        assert!(nested.join(SESSION_FILE).exists());
        assert!(!nested.join("auth-storage.tmp").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&session()).await.unwrap();

        let mode = std::fs::metadata(store.session_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&session()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(!store.session_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), b"{ not json").unwrap();

        let store = FileSessionStore::new(dir.path());

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_tokens_keeps_user_and_persists() {
        let dir = TempDir::new().unwrap();
        FileSessionStore::new(dir.path())
            .save(&session())
            .await
            .unwrap();
        let store = FileSessionStore::new(dir.path());
        let at = DateTime::from_timestamp(1_700_001_800, 0).unwrap();

        let updated = store
            .replace_tokens("refresh", AuthTokens::bearer("access2", "refresh2"), at)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.user, session().user);
        let reopened = FileSessionStore::new(dir.path());
        assert_eq!(reopened.load().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_replace_tokens_does_not_revive_cleared_session() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&session()).await.unwrap();
        store.clear().await.unwrap();

        let result = store
            .replace_tokens(
                "refresh",
                AuthTokens::bearer("access2", "refresh2"),
                DateTime::from_timestamp(1_700_001_800, 0).unwrap(),
            )
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(!store.session_path().exists());
    }

    #[tokio::test]
    async fn test_redirect_is_consumed() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save_redirect("/searches?page=2").await.unwrap();

        assert_eq!(
            store.take_redirect().await.unwrap().as_deref(),
            Some("/searches?page=2")
        );
        assert!(store.take_redirect().await.unwrap().is_none());
    }
}
