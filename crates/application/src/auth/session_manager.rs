//! Session lifecycle: login, restore, logout and proactive refresh.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use ecoroute_domain::{
    ApiRequest, AuthEvent, AuthTokens, LoginRequest, Session, SessionStatus, User,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::coordinator::AuthenticatedClient;
use super::scheduler::RefreshScheduler;
use crate::endpoints;
use crate::error::{ApplicationResult, decode_json, ensure_success};

/// Seconds before expiry at which a session is reported as expiring.
const EXPIRY_WARNING_SECONDS: i64 = 60;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The stored session.
    pub session: Session,
    /// Where the user was headed before being sent to log in.
    pub redirect_to: Option<String>,
}

struct Inner {
    client: Arc<AuthenticatedClient>,
    scheduler: RefreshScheduler,
    lifecycle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.lifecycle.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}

/// Owns the session lifecycle and the proactive refresh scheduler.
///
/// Cloning is cheap; clones share the same scheduler.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client", &self.inner.client)
            .field("scheduler", &self.inner.scheduler)
            .finish()
    }
}

impl SessionManager {
    /// Create a manager around `client` with the default refresh threshold.
    #[must_use]
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        let scheduler =
            RefreshScheduler::new(Arc::clone(client.decoder()), Arc::clone(client.clock()));
        Self::with_scheduler(client, scheduler)
    }

    /// Create a manager with a preconfigured scheduler.
    #[must_use]
    pub fn with_scheduler(client: Arc<AuthenticatedClient>, scheduler: RefreshScheduler) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                scheduler,
                lifecycle: Mutex::new(None),
            }),
        }
    }

    /// The coordinator requests go through.
    #[must_use]
    pub fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.inner.client
    }

    /// Returns true while a proactive refresh is pending.
    #[must_use]
    pub fn is_refresh_scheduled(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    /// Log in with email and password.
    ///
    /// The user profile is fetched after the tokens are stored; if that
    /// fails the session is kept without a user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApplicationError::Unauthorized`] for bad credentials,
    /// or the transport/storage error that stopped the login.
    pub async fn login(&self, credentials: &LoginRequest) -> ApplicationResult<LoginOutcome> {
        let client = &self.inner.client;
        tracing::info!(email = %credentials.email, "Logging in");

        let request = ApiRequest::post(endpoints::LOGIN).with_json(credentials)?;
        let response = ensure_success(client.send_public(request).await?)?;
        let tokens: AuthTokens = decode_json(&response)?;
        let expires_at = client.decoder().expires_at(&tokens.access_token)?;

        let mut session = Session::new(tokens, expires_at);
        client.store().save(&session).await?;
        client.reset_failures();

        match self.fetch_user().await {
            Ok(user) => {
                session = session.with_user(user);
                client.store().save(&session).await?;
            }
            Err(e) => tracing::warn!(error = %e, "Could not load user profile after login"),
        }

        self.ensure_lifecycle();
        self.arm(&session.access_token);

        let redirect_to = client.store().take_redirect().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read pending redirect");
            None
        });

        client.emit(AuthEvent::LoggedIn {
            email: session.user.as_ref().map(|u| u.email.clone()),
        });
        tracing::info!(expires_at = %session.expires_at, "Logged in");

        Ok(LoginOutcome {
            session,
            redirect_to,
        })
    }

    async fn fetch_user(&self) -> ApplicationResult<User> {
        self.inner
            .client
            .send_json(ApiRequest::get(endpoints::ME))
            .await
    }

    /// Resume a stored session at startup.
    ///
    /// A valid access token arms the scheduler. An expired access token with
    /// a live refresh token is refreshed first. Anything else clears the
    /// store. Returns the usable session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store cannot be read.
    pub async fn restore(&self) -> ApplicationResult<Option<Session>> {
        let client = &self.inner.client;
        let Some(session) = client.store().load().await? else {
            return Ok(None);
        };
        let now = client.clock().now();

        let access_live = client
            .decoder()
            .decode(&session.access_token)
            .is_ok_and(|claims| !claims.is_expired(now));
        if access_live {
            tracing::info!("Restored stored session");
            self.ensure_lifecycle();
            self.arm(&session.access_token);
            return Ok(Some(session));
        }

        let refresh_live = client
            .decoder()
            .decode(&session.refresh_token)
            .is_ok_and(|claims| !claims.is_expired(now));
        if refresh_live {
            tracing::info!("Stored access token expired, refreshing");
            self.ensure_lifecycle();
            match client.refresh().await {
                Ok(session) => {
                    // The lifecycle listener may not have seen the event yet.
                    self.arm(&session.access_token);
                    return Ok(Some(session));
                }
                Err(e) => tracing::warn!(error = %e, "Could not refresh stored session"),
            }
        } else {
            tracing::info!("Stored session expired");
        }

        self.inner.scheduler.stop();
        client.store().clear().await?;
        Ok(None)
    }

    /// End the session.
    ///
    /// The server is told first on a best-effort basis. The scheduler is
    /// stopped and the store cleared regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store cannot be cleared.
    pub async fn logout(&self) -> ApplicationResult<()> {
        let client = &self.inner.client;
        self.inner.scheduler.stop();

        if client.store().access_token().await.ok().flatten().is_some() {
            match client.send(ApiRequest::post(endpoints::LOGOUT)).await {
                Ok(response) if response.is_success() => {}
                Ok(response) => {
                    tracing::debug!(status = response.status.as_u16(), "Server rejected logout");
                }
                Err(e) => tracing::debug!(error = %e, "Logout request failed"),
            }
        }

        self.inner.scheduler.stop();
        client.store().clear().await?;
        client.emit(AuthEvent::LoggedOut);
        tracing::info!("Logged out");
        Ok(())
    }

    /// Remember where to send the user after the next login.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    pub async fn remember_redirect(&self, url: &str) -> ApplicationResult<()> {
        self.inner.client.store().save_redirect(url).await?;
        Ok(())
    }

    /// The stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn current_session(&self) -> ApplicationResult<Option<Session>> {
        Ok(self.inner.client.store().load().await?)
    }

    /// Status of the stored session relative to now.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub async fn status(&self) -> ApplicationResult<SessionStatus> {
        let session = self.current_session().await?;
        let now = self.inner.client.clock().now();
        Ok(SessionStatus::of(session.as_ref(), now, EXPIRY_WARNING_SECONDS))
    }

    fn arm(&self, access_token: &str) {
        arm(&self.inner, access_token);
    }

    /// Spawn the task that keeps the scheduler in step with refresh events.
    fn ensure_lifecycle(&self) {
        let mut slot = self
            .inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let mut events = self.inner.client.subscribe();
        let weak = Arc::downgrade(&self.inner);
        *slot = Some(tokio::spawn(async move {
            loop {
                let event = events.recv().await;
                let Some(inner) = weak.upgrade() else { break };
                match event {
                    Ok(AuthEvent::TokenRefreshed { .. }) | Err(RecvError::Lagged(_)) => {
                        rearm_from_store(&inner).await;
                    }
                    Ok(AuthEvent::LoginRequired { .. } | AuthEvent::LoggedOut) => {
                        inner.scheduler.stop();
                    }
                    Ok(_) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
}

async fn rearm_from_store(inner: &Arc<Inner>) {
    match inner.client.store().access_token().await {
        Ok(Some(token)) => arm(inner, &token),
        Ok(None) => inner.scheduler.stop(),
        Err(e) => tracing::warn!(error = %e, "Could not read token to re-arm refresh"),
    }
}

fn arm(inner: &Arc<Inner>, access_token: &str) {
    let weak: Weak<Inner> = Arc::downgrade(inner);
    let armed = inner.scheduler.start(access_token, move || async move {
        let Some(inner) = weak.upgrade() else { return };
        match inner.client.refresh().await {
            Ok(_) => tracing::debug!("Proactive refresh succeeded"),
            Err(e) => tracing::warn!(error = %e, "Proactive refresh failed"),
        }
    });
    if let Err(e) = armed {
        tracing::warn!(error = %e, "Could not schedule proactive refresh");
    }
}
