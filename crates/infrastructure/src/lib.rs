//! EcoRoute Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::JwtDecoder;
pub use self::config::{ClientConfig, ConfigError};
pub use persistence::FileSessionStore;
pub use serialization::SerializationError;
