//! Outgoing API request types

mod method;
mod spec;

pub use method::HttpMethod;
pub use spec::{ApiRequest, AUTHORIZATION};
