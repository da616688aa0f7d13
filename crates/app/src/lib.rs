//! EcoRoute command-line client.
//!
//! Wires the reqwest transport, the file session store and the JWT decoder
//! into the session manager and API services, and maps CLI commands onto
//! them. Every command prints one JSON document.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::{App, CliError};
