//! Scripted fakes shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ecoroute_application::ports::{
    Clock, HttpTransport, SessionStore, StoreError, TokenDecoder, TransportError,
};
use ecoroute_application::{AuthenticatedClient, InMemorySessionStore};
use ecoroute_domain::{
    ApiRequest, ApiResponse, AuthTokens, DomainError, DomainResult, Session, StatusCode,
    TokenClaims,
};
use serde_json::json;

/// Tokens are `"<name>@<exp>"`; the decoder reads `exp` after the `@`.
pub struct ExpDecoder;

impl TokenDecoder for ExpDecoder {
    fn decode(&self, token: &str) -> DomainResult<TokenClaims> {
        let exp = token
            .rsplit_once('@')
            .and_then(|(_, exp)| exp.parse().ok())
            .ok_or_else(|| DomainError::InvalidToken(token.to_string()))?;
        Ok(TokenClaims {
            sub: "u1".to_string(),
            email: "ada@example.com".to_string(),
            token_type: "access".to_string(),
            jti: token.to_string(),
            iat: 0,
            exp,
        })
    }
}

/// Clock pinned at a settable instant.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(secs: i64) -> Self {
        Self(Mutex::new(DateTime::from_timestamp(secs, 0).unwrap()))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// What the refresh endpoint answers next.
#[derive(Debug, Clone)]
pub enum RefreshReply {
    Issue(AuthTokens),
    Status(u16),
}

/// In-process stand-in for the API.
///
/// Protected paths answer 200 only for the currently valid access token.
/// The refresh endpoint follows `refresh_script` (401 once exhausted) and
/// sleeps `refresh_delay` before answering.
pub struct FakeApi {
    valid_token: Mutex<String>,
    refresh_script: Mutex<VecDeque<RefreshReply>>,
    refresh_delay: Duration,
    login_reply: Mutex<Option<AuthTokens>>,
    canned: Mutex<Vec<(String, u16, serde_json::Value)>>,
    refresh_calls: AtomicUsize,
    log: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeApi {
    pub fn new(valid_token: &str) -> Self {
        Self {
            valid_token: Mutex::new(valid_token.to_string()),
            refresh_script: Mutex::new(VecDeque::new()),
            refresh_delay: Duration::from_millis(50),
            login_reply: Mutex::new(None),
            canned: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn script_refresh(&self, reply: RefreshReply) {
        self.refresh_script.lock().unwrap().push_back(reply);
    }

    pub fn set_login_reply(&self, tokens: AuthTokens) {
        *self.login_reply.lock().unwrap() = Some(tokens);
    }

    /// Answer `path` with a fixed status and body, ignoring the token.
    pub fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.canned
            .lock()
            .unwrap()
            .push((path.to_string(), status, body));
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens seen on requests to `path`, in arrival order.
    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, bearer)| bearer.clone())
            .collect()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.bearers_for(path).len()
    }

    async fn refresh(&self) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;
        let reply = self
            .refresh_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RefreshReply::Status(401));
        match reply {
            RefreshReply::Issue(tokens) => {
                *self.valid_token.lock().unwrap() = tokens.access_token.clone();
                ApiResponse::json_body(StatusCode::OK, &json!(tokens))
            }
            RefreshReply::Status(status) => ApiResponse::json_body(
                StatusCode::new(status),
                &json!({ "detail": "Invalid refresh token" }),
            ),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let bearer = request.bearer_token().map(str::to_string);
        self.log
            .lock()
            .unwrap()
            .push((request.path.clone(), bearer.clone()));

        let canned = self
            .canned
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _, _)| *p == request.path)
            .cloned();
        if let Some((_, status, body)) = canned {
            return Ok(ApiResponse::json_body(StatusCode::new(status), &body));
        }

        match request.path.as_str() {
            "/auth/refresh" => Ok(self.refresh().await),
            "/auth/login" => {
                let tokens = self.login_reply.lock().unwrap().clone();
                Ok(match tokens {
                    Some(tokens) => {
                        *self.valid_token.lock().unwrap() = tokens.access_token.clone();
                        ApiResponse::json_body(StatusCode::OK, &json!(tokens))
                    }
                    None => ApiResponse::json_body(
                        StatusCode::UNAUTHORIZED,
                        &json!({ "detail": "Incorrect email or password" }),
                    ),
                })
            }
            path => {
                let valid = self.valid_token.lock().unwrap().clone();
                if bearer.as_deref() == Some(valid.as_str()) {
                    let body = if path == "/auth/me" {
                        json!({
                            "_id": "u1",
                            "email": "ada@example.com",
                            "full_name": "Ada Lovelace",
                            "created_at": "2025-01-01T00:00:00Z",
                            "updated_at": "2025-01-01T00:00:00Z"
                        })
                    } else {
                        json!({ "path": path, "token": valid })
                    };
                    Ok(ApiResponse::json_body(StatusCode::OK, &body))
                } else {
                    Ok(ApiResponse::json_body(
                        StatusCode::UNAUTHORIZED,
                        &json!({ "detail": "Could not validate credentials" }),
                    ))
                }
            }
        }
    }
}

/// Clock at t=0 so `name@N` tokens have `N` seconds to live.
pub const NOW: i64 = 0;

pub fn session(access: &str, refresh: &str) -> Session {
    Session::new(
        AuthTokens::bearer(access, refresh),
        DateTime::from_timestamp(NOW + 900, 0).unwrap(),
    )
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub store: InMemorySessionStore,
    pub client: Arc<AuthenticatedClient>,
}

pub fn harness(api: FakeApi, store: InMemorySessionStore) -> Harness {
    let api = Arc::new(api);
    let client = Arc::new(AuthenticatedClient::new(
        api.clone(),
        Arc::new(store.clone()),
        Arc::new(ExpDecoder),
        Arc::new(ManualClock::at(NOW)),
    ));
    Harness { api, store, client }
}

impl Harness {
    pub async fn stored(&self) -> Option<Session> {
        self.store.load().await.unwrap()
    }

    pub async fn store_save(&self, session: &Session) {
        self.store.save(session).await.unwrap();
    }
}

/// In-memory store whose token swap takes `delay`, leaving room for a
/// logout to land while a refresh is being committed.
pub struct SlowCommitStore {
    inner: InMemorySessionStore,
    delay: Duration,
}

impl SlowCommitStore {
    pub const fn new(inner: InMemorySessionStore, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl SessionStore for SlowCommitStore {
    async fn load(&self) -> Result<Option<Session>, StoreError> {
        self.inner.load().await
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.inner.save(session).await
    }

    async fn replace_tokens(
        &self,
        expected_refresh_token: &str,
        tokens: AuthTokens,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner
            .replace_tokens(expected_refresh_token, tokens, expires_at)
            .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }

    async fn save_redirect(&self, url: &str) -> Result<(), StoreError> {
        self.inner.save_redirect(url).await
    }

    async fn take_redirect(&self) -> Result<Option<String>, StoreError> {
        self.inner.take_redirect().await
    }
}

/// Coordinator over `store` with the usual fakes.
pub fn client_with_store(
    api: Arc<FakeApi>,
    store: Arc<dyn SessionStore>,
) -> Arc<AuthenticatedClient> {
    Arc::new(AuthenticatedClient::new(
        api,
        store,
        Arc::new(ExpDecoder),
        Arc::new(ManualClock::at(NOW)),
    ))
}
