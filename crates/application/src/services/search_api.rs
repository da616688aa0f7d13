//! Search history and full-text search.

use std::sync::Arc;

use ecoroute_domain::{
    ApiRequest, SearchHistoryParams, SearchHistoryResponse, SearchParams, SearchResponse,
    SearchStatsResponse,
};

use super::join_segment;
use crate::auth::AuthenticatedClient;
use crate::endpoints;
use crate::error::ApplicationResult;

/// The user's past route searches.
#[derive(Debug, Clone)]
pub struct SearchHistoryApi {
    client: Arc<AuthenticatedClient>,
}

impl SearchHistoryApi {
    /// Create the service.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// One page of search history.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn list(&self, params: &SearchHistoryParams) -> ApplicationResult<SearchHistoryResponse> {
        let request = ApiRequest::get(endpoints::SEARCHES).with_query_pairs(params.to_query());
        self.client.send_json(request).await
    }

    /// Aggregate statistics over the history.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn stats(&self) -> ApplicationResult<SearchStatsResponse> {
        self.client
            .send_json(ApiRequest::get(endpoints::SEARCH_STATS))
            .await
    }

    /// Delete one entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApplicationError::NotFound`] for an unknown id.
    pub async fn delete(&self, id: &str) -> ApplicationResult<()> {
        let path = join_segment(endpoints::SEARCHES, id)?;
        self.client.send_checked(ApiRequest::delete(path)).await?;
        tracing::info!(id, "Deleted search");
        Ok(())
    }
}

/// Full-text search over indexed documents.
#[derive(Debug, Clone)]
pub struct SearchApi {
    client: Arc<AuthenticatedClient>,
}

impl SearchApi {
    /// Create the service.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApplicationError::Domain`] for a query shorter than
    /// two characters, otherwise the error class matching the response.
    pub async fn search(&self, params: &SearchParams) -> ApplicationResult<SearchResponse> {
        params.validate()?;
        let request = ApiRequest::get(endpoints::SEARCH).with_query_pairs(params.to_query());
        self.client.send_json(request).await
    }
}
