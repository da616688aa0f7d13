//! Adapters for the HTTP transport and clock ports.

mod reqwest_transport;
mod system_clock;

pub use reqwest_transport::{DEFAULT_TIMEOUT_MS, ReqwestTransport};
pub use system_clock::SystemClock;
