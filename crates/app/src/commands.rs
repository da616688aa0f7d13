//! Command execution.

use std::sync::Arc;

use ecoroute_application::auth::{CoordinatorConfig, RefreshScheduler};
use ecoroute_application::ports::TransportError;
use ecoroute_application::{
    ApplicationError, AuthApi, AuthenticatedClient, RouteApi, SearchApi, SearchHistoryApi,
    SessionManager,
};
use ecoroute_domain::{LoginRequest, Session};
use ecoroute_infrastructure::{
    ClientConfig, ConfigError, FileSessionStore, JwtDecoder, ReqwestTransport, SystemClock,
};
use serde_json::{Value, json};

use crate::cli::{Cli, Command};

/// Errors surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An API call failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    /// The command needs a session and none is stored.
    #[error("not logged in; run `ecoroute login` first")]
    NotLoggedIn,
}

/// Wired-up client for one CLI invocation.
#[derive(Debug)]
pub struct App {
    config: ClientConfig,
    client: Arc<AuthenticatedClient>,
    manager: SessionManager,
}

impl App {
    /// Loads configuration, applying command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config source is malformed or invalid.
    pub fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
        let mut config = match &cli.config {
            Some(path) => ClientConfig::load_from(Some(path.as_path()))?,
            None => ClientConfig::load()?,
        };
        if let Some(url) = &cli.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(dir) = &cli.session_dir {
            config.session_dir.clone_from(dir);
        }
        config.validate()?;
        Ok(config)
    }

    /// Builds the client stack from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be used.
    pub fn new(config: ClientConfig) -> Result<Self, CliError> {
        let transport = ReqwestTransport::new(&config.api_base_url, config.request_timeout_ms)?;
        let store = FileSessionStore::new(&config.session_dir);
        let decoder = Arc::new(JwtDecoder::new());
        let clock = Arc::new(SystemClock::new());

        let client = Arc::new(
            AuthenticatedClient::new(
                Arc::new(transport),
                Arc::new(store),
                decoder.clone(),
                clock.clone(),
            )
            .with_config(
                CoordinatorConfig::default().with_max_refresh_failures(config.max_refresh_failures),
            ),
        );
        let scheduler =
            RefreshScheduler::new(decoder, clock).with_threshold(config.refresh_threshold);
        let manager = SessionManager::with_scheduler(client.clone(), scheduler);

        tracing::debug!(
            api = %config.api_base_url,
            session_dir = %config.session_dir.display(),
            "Client ready"
        );
        Ok(Self {
            config,
            client,
            manager,
        })
    }

    /// The effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs one command and returns its JSON output.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing call.
    pub async fn run(&self, command: Command) -> Result<Value, CliError> {
        match command {
            Command::Login { email, password } => {
                let outcome = self
                    .manager
                    .login(&LoginRequest::new(email, password))
                    .await?;
                Ok(json!({
                    "user": outcome.session.user,
                    "expires_at": outcome.session.expires_at,
                    "redirect_to": outcome.redirect_to,
                }))
            }
            Command::Logout => {
                self.manager.logout().await?;
                Ok(json!({ "logged_out": true }))
            }
            Command::Status => {
                let status = self.manager.status().await?;
                let mut value = serde_json::to_value(&status)?;
                value["message"] = Value::String(status.display_message());
                Ok(value)
            }
            Command::Me => {
                self.require_session().await?;
                Ok(serde_json::to_value(self.auth().me().await?)?)
            }
            Command::Route(args) => {
                self.require_session().await?;
                let response = RouteApi::new(self.client.clone())
                    .calculate(&args.into())
                    .await?;
                Ok(serde_json::to_value(response)?)
            }
            Command::History(args) => {
                self.require_session().await?;
                let page = SearchHistoryApi::new(self.client.clone())
                    .list(&args.into())
                    .await?;
                Ok(serde_json::to_value(page)?)
            }
            Command::Stats => {
                self.require_session().await?;
                let stats = SearchHistoryApi::new(self.client.clone()).stats().await?;
                Ok(serde_json::to_value(stats)?)
            }
            Command::DeleteSearch { id } => {
                self.require_session().await?;
                SearchHistoryApi::new(self.client.clone())
                    .delete(&id)
                    .await?;
                Ok(json!({ "deleted": id }))
            }
            Command::Search(args) => {
                self.require_session().await?;
                let response = SearchApi::new(self.client.clone())
                    .search(&args.into())
                    .await?;
                Ok(serde_json::to_value(response)?)
            }
        }
    }

    fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    /// Restores the stored session, refreshing it if needed.
    async fn require_session(&self) -> Result<Session, CliError> {
        self.manager.restore().await?.ok_or(CliError::NotLoggedIn)
    }
}
