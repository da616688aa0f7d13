//! Typed API services built on the authenticated client.

mod auth_api;
mod route_api;
mod search_api;

pub use auth_api::AuthApi;
pub use route_api::RouteApi;
pub use search_api::{SearchApi, SearchHistoryApi};

use crate::error::{ApplicationError, ApplicationResult};

/// Appends `segment` to `base` as a single path segment.
fn join_segment(base: &str, segment: &str) -> ApplicationResult<String> {
    let segment = segment.trim();
    if segment.is_empty() || segment.contains('/') {
        return Err(ApplicationError::Validation(format!(
            "invalid path segment: {segment:?}"
        )));
    }
    Ok(format!("{base}/{segment}"))
}
