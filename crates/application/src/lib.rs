//! EcoRoute Application - Session coordination and API services
//!
//! This crate holds the ports the client depends on, the authenticated
//! request coordinator with its single-flight token refresh, the proactive
//! refresh scheduler, the session lifecycle manager and the typed API
//! services built on top of them.

pub mod auth;
pub mod endpoints;
pub mod error;
pub mod ports;
pub mod services;

pub use auth::{
    AuthenticatedClient, CoordinatorConfig, InMemorySessionStore, LoginOutcome, RefreshScheduler,
    RefreshTimer, SessionManager,
};
pub use error::{ApplicationError, ApplicationResult};
pub use services::{AuthApi, RouteApi, SearchApi, SearchHistoryApi};
