//! Authentication module for the EcoRoute client.
//!
//! This module provides:
//! - The authenticated request coordinator with single-flight refresh
//! - The proactive refresh scheduler and its cancellable timer
//! - The session lifecycle manager that owns the scheduler
//! - An in-memory session store

mod coordinator;
mod memory_store;
mod scheduler;
mod session_manager;

pub use coordinator::{AuthenticatedClient, CoordinatorConfig, DEFAULT_MAX_REFRESH_FAILURES};
pub use memory_store::InMemorySessionStore;
pub use scheduler::{DEFAULT_REFRESH_THRESHOLD, RefreshScheduler, RefreshTimer};
pub use session_manager::{LoginOutcome, SessionManager};
