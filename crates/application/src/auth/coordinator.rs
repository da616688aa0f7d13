//! Authenticated request coordinator.
//!
//! Every request sent through [`AuthenticatedClient::send`] carries the
//! current access token. A 401 triggers at most one refresh call at a time:
//! requests that observe a 401 while a refresh is running are parked until
//! it settles and then replayed with the new token.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ecoroute_domain::{ApiRequest, ApiResponse, AuthEvent, AuthTokens, Session};
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, oneshot};

use crate::endpoints;
use crate::error::{ApplicationError, ApplicationResult, decode_json, ensure_success};
use crate::ports::{Clock, HttpTransport, SessionStore, TokenDecoder};

/// Consecutive refresh failures tolerated before the session is dropped.
pub const DEFAULT_MAX_REFRESH_FAILURES: u32 = 5;

const EVENT_CAPACITY: usize = 32;

/// Tunables for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Ceiling of consecutive refresh failures.
    pub max_refresh_failures: u32,
    /// Path of the refresh endpoint. Requests to it never trigger a refresh.
    pub refresh_path: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_refresh_failures: DEFAULT_MAX_REFRESH_FAILURES,
            refresh_path: endpoints::REFRESH.to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Override the failure ceiling. Values below one are raised to one.
    #[must_use]
    pub fn with_max_refresh_failures(mut self, max: u32) -> Self {
        self.max_refresh_failures = max.max(1);
        self
    }
}

type Waiter = oneshot::Sender<ApplicationResult<Session>>;

#[derive(Debug, Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
    failures: u32,
}

enum Entry {
    Exhausted(u32),
    Parked(oneshot::Receiver<ApplicationResult<Session>>),
    Lead,
}

enum RefreshOutcome {
    Refreshed(Session),
    MissingToken,
    Stale,
    Failed(ApplicationError),
}

/// Releases the in-flight flag if the refreshing future is dropped before
/// it settles. Parked waiters then observe a closed channel.
struct InFlight<'a> {
    client: &'a AuthenticatedClient,
    armed: bool,
}

impl InFlight<'_> {
    const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.client.state();
            state.in_flight = false;
            state.waiters.clear();
        }
    }
}

/// HTTP client that owns the bearer token and the refresh protocol.
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    decoder: Arc<dyn TokenDecoder>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    state: Mutex<RefreshState>,
    events: broadcast::Sender<AuthEvent>,
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("AuthenticatedClient")
            .field("config", &self.config)
            .field("in_flight", &state.in_flight)
            .field("queued", &state.waiters.len())
            .field("failures", &state.failures)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedClient {
    /// Create a coordinator over the given collaborators.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        decoder: Arc<dyn TokenDecoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            store,
            decoder,
            clock,
            config: CoordinatorConfig::default(),
            state: Mutex::new(RefreshState::default()),
            events,
        }
    }

    /// Replace the default configuration.
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The session store the coordinator reads tokens from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The decoder used to derive token expiry.
    #[must_use]
    pub fn decoder(&self) -> &Arc<dyn TokenDecoder> {
        &self.decoder
    }

    /// The clock used for expiry arithmetic.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Subscribe to session lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of consecutive refresh failures so far.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.state().failures
    }

    /// Reset the failure counter. Called after a fresh login.
    pub fn reset_failures(&self) {
        self.state().failures = 0;
    }

    /// Whether a refresh call is currently outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state().in_flight
    }

    /// Number of requests parked behind the in-flight refresh.
    #[must_use]
    pub fn queued_requests(&self) -> usize {
        self.state().waiters.len()
    }

    /// Set the bearer header from the stored access token.
    ///
    /// Leaves the request untouched when no session is stored. A store
    /// failure is logged and treated as "no token".
    pub async fn attach_token(&self, request: &mut ApiRequest) {
        match self.store.access_token().await {
            Ok(Some(token)) if !token.is_empty() => request.set_bearer(&token),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Could not read access token"),
        }
    }

    /// Send a request with the bearer token attached, recovering from 401.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Network`] when no response was received,
    /// or the refresh error when a 401 could not be recovered. Any other
    /// status is returned as a response.
    pub async fn send(&self, mut request: ApiRequest) -> ApplicationResult<ApiResponse> {
        self.attach_token(&mut request).await;
        let response = self.dispatch(&request).await?;

        let is_refresh_call = request.targets(&self.config.refresh_path);
        if response.status.is_unauthorized() && !is_refresh_call && !request.retried {
            return self.handle_unauthorized(request).await;
        }

        if response.is_success() && !is_refresh_call {
            self.note_success();
        }
        Ok(response)
    }

    /// Send a request without attaching a token or handling 401.
    ///
    /// Used for the endpoints that run before a session exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Network`] when no response was received.
    pub async fn send_public(&self, request: ApiRequest) -> ApplicationResult<ApiResponse> {
        self.dispatch(&request).await
    }

    /// Like [`send`](Self::send) but maps non-2xx statuses to errors.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn send_checked(&self, request: ApiRequest) -> ApplicationResult<ApiResponse> {
        ensure_success(self.send(request).await?)
    }

    /// Send an authenticated request and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status, or
    /// [`ApplicationError::Decode`] when the body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> ApplicationResult<T> {
        let response = self.send_checked(request).await?;
        decode_json(&response)
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApplicationResult<ApiResponse> {
        tracing::debug!(request = %request, retried = request.retried, "Sending request");
        let response = self.transport.send(request).await?;
        tracing::debug!(
            request = %request,
            status = response.status.as_u16(),
            duration = ?response.duration,
            "Received response"
        );
        Ok(response)
    }

    fn note_success(&self) {
        let mut state = self.state();
        if state.failures > 0 {
            tracing::debug!(failures = state.failures, "Resetting refresh failure counter");
            state.failures = 0;
        }
    }

    /// Recover a request that came back 401.
    ///
    /// The request is replayed at most once. When the stored token already
    /// differs from the one the request carried, a refresh completed in the
    /// meantime and the request is replayed without another refresh.
    ///
    /// # Errors
    ///
    /// Returns the refresh error, or the transport error of the replay.
    pub async fn handle_unauthorized(
        &self,
        mut request: ApiRequest,
    ) -> ApplicationResult<ApiResponse> {
        request.retried = true;

        let sent_with = request.bearer_token().map(str::to_string);
        let current = self.store.access_token().await.ok().flatten();
        let token = match current {
            Some(token) if sent_with.as_deref() != Some(token.as_str()) && !token.is_empty() => {
                tracing::debug!(request = %request, "Token changed since dispatch, replaying");
                token
            }
            _ => self.refresh().await?.access_token,
        };

        request.set_bearer(&token);
        let response = self.dispatch(&request).await?;
        if response.is_success() {
            self.note_success();
        }
        Ok(response)
    }

    /// Refresh the access token, joining an in-flight refresh if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::SessionExpired`] when the failure ceiling
    /// is reached or no refresh token is stored, the refresh call's error
    /// otherwise.
    pub async fn refresh(&self) -> ApplicationResult<Session> {
        let entry = {
            let mut state = self.state();
            if state.failures >= self.config.max_refresh_failures {
                Entry::Exhausted(state.failures)
            } else if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Entry::Parked(rx)
            } else {
                state.in_flight = true;
                Entry::Lead
            }
        };

        match entry {
            Entry::Exhausted(failures) => {
                tracing::warn!(failures, "Refresh failure limit reached, not retrying");
                return Err(self.expire("refresh failure limit reached").await);
            }
            Entry::Parked(rx) => {
                tracing::debug!("Refresh in flight, queueing request");
                return rx.await.unwrap_or(Err(ApplicationError::SessionCleared));
            }
            Entry::Lead => {}
        }

        let mut guard = InFlight {
            client: self,
            armed: true,
        };
        let outcome = self.perform_refresh().await;
        guard.disarm();
        self.settle(outcome).await
    }

    async fn perform_refresh(&self) -> RefreshOutcome {
        let session = match self.store.load().await {
            Ok(Some(session)) if !session.refresh_token.is_empty() => session,
            Ok(_) => return RefreshOutcome::MissingToken,
            Err(e) => return RefreshOutcome::Failed(e.into()),
        };

        tracing::info!("Refreshing access token");
        let request = match ApiRequest::post(&self.config.refresh_path)
            .with_bearer(&session.refresh_token)
            .with_json(&serde_json::json!({}))
        {
            Ok(request) => request,
            Err(e) => return RefreshOutcome::Failed(e.into()),
        };

        let tokens = match self.call_refresh(&request).await {
            Ok(tokens) => tokens,
            Err(e) => return RefreshOutcome::Failed(e),
        };
        let expires_at = match self.decoder.expires_at(&tokens.access_token) {
            Ok(at) => at,
            Err(e) => return RefreshOutcome::Failed(e.into()),
        };

        // Commit only if the session that triggered the refresh is still current.
        match self
            .store
            .replace_tokens(&session.refresh_token, tokens, expires_at)
            .await
        {
            Ok(Some(updated)) => RefreshOutcome::Refreshed(updated),
            Ok(None) => RefreshOutcome::Stale,
            Err(e) => RefreshOutcome::Failed(e.into()),
        }
    }

    async fn call_refresh(&self, request: &ApiRequest) -> ApplicationResult<AuthTokens> {
        let response = ensure_success(self.dispatch(request).await?)?;
        decode_json(&response)
    }

    fn finish(&self, reset: bool) -> Vec<Waiter> {
        let mut state = self.state();
        state.in_flight = false;
        if reset {
            state.failures = 0;
        }
        mem::take(&mut state.waiters)
    }

    async fn settle(&self, outcome: RefreshOutcome) -> ApplicationResult<Session> {
        match outcome {
            RefreshOutcome::Refreshed(session) => {
                let waiters = self.finish(true);
                tracing::info!(
                    expires_at = %session.expires_at,
                    queued = waiters.len(),
                    "Access token refreshed"
                );
                for waiter in waiters {
                    let _ = waiter.send(Ok(session.clone()));
                }
                self.emit(AuthEvent::TokenRefreshed {
                    token_preview: AuthEvent::token_preview(&session.access_token),
                    expires_in: session.seconds_until_expiry(self.clock.now()),
                });
                Ok(session)
            }
            RefreshOutcome::MissingToken => {
                self.finish(false);
                tracing::warn!("No refresh token stored");
                Err(self.expire("no refresh token available").await)
            }
            RefreshOutcome::Stale => {
                let waiters = self.finish(false);
                tracing::info!("Session changed during refresh, discarding new tokens");
                for waiter in waiters {
                    let _ = waiter.send(Err(ApplicationError::SessionCleared));
                }
                Err(ApplicationError::SessionCleared)
            }
            RefreshOutcome::Failed(error) => {
                let (attempt, waiters) = self.failed();
                let max = self.config.max_refresh_failures;
                tracing::warn!(attempt, max, error = %error, "Token refresh failed");
                for waiter in waiters {
                    let _ = waiter.send(Err(error.clone()));
                }
                self.emit(AuthEvent::RefreshFailed {
                    attempt,
                    max,
                    message: error.to_string(),
                });
                if attempt >= max {
                    return Err(self.expire("refresh failed too many times").await);
                }
                Err(error)
            }
        }
    }

    fn failed(&self) -> (u32, Vec<Waiter>) {
        let mut state = self.state();
        state.in_flight = false;
        state.failures = state.failures.saturating_add(1);
        (state.failures, mem::take(&mut state.waiters))
    }

    /// Drop the stored session and tell listeners a login is required.
    async fn expire(&self, reason: &str) -> ApplicationError {
        self.clear_session(reason).await;
        ApplicationError::SessionExpired(reason.to_string())
    }

    /// Clear the stored session, reject parked requests and emit
    /// [`AuthEvent::LoginRequired`].
    pub async fn clear_session(&self, reason: &str) {
        let waiters = {
            let mut state = self.state();
            mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(Err(ApplicationError::SessionExpired(reason.to_string())));
        }
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "Failed to clear session");
        }
        tracing::warn!(reason, "Session cleared, login required");
        self.emit(AuthEvent::LoginRequired {
            reason: reason.to_string(),
        });
    }
}
