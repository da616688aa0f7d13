//! Search history and full-text search types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::route::{LineStringGeometry, TransportMode};

/// Minimum query length accepted by the search endpoint.
pub const MIN_QUERY_LEN: usize = 2;

/// A named place stored with a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Place name.
    pub name: String,
    /// `[longitude, latitude]`.
    pub coordinates: (f64, f64),
}

/// Route summary stored with a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Duration in hours.
    pub duration_hours: f64,
    /// CO₂ in kilograms.
    pub co2_emissions_kg: f64,
    /// Path geometry.
    pub geometry: LineStringGeometry,
}

/// How a search result was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchMetadata {
    /// API version that produced the result.
    #[serde(default)]
    pub api_version: String,
    /// Calculation method name.
    #[serde(default)]
    pub calculation_method: String,
}

/// One entry of the user's search history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryItem {
    /// Search identifier.
    pub id: String,
    /// Owner.
    pub user_id: String,
    /// Starting place.
    pub origin: Location,
    /// End place.
    pub destination: Location,
    /// Cargo weight in kilograms.
    pub cargo_weight_kg: f64,
    /// Transport mode.
    pub transport_mode: TransportMode,
    /// Shortest route summary.
    pub shortest_route: RouteInfo,
    /// Efficient route summary.
    pub efficient_route: RouteInfo,
    /// Calculation metadata.
    #[serde(default)]
    pub metadata: SearchMetadata,
    /// Creation timestamp as sent by the server.
    pub created_at: String,
}

/// Filters for `GET /searches`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchHistoryParams {
    /// 1-based page.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Sort expression, e.g. `-created_at`.
    pub sort: Option<String>,
    /// Restrict to one transport mode.
    pub mode: Option<TransportMode>,
}

impl SearchHistoryParams {
    /// Query pairs; unset and zero values are omitted.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort) = self.sort.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(mode) = self.mode {
            pairs.push(("mode".to_string(), mode.to_string()));
        }
        pairs
    }
}

/// Pagination block of a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total entries.
    pub total: u64,
    /// Total pages.
    pub total_pages: u32,
    /// Whether another page follows.
    pub has_next: bool,
}

/// Response of `GET /searches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryResponse {
    /// Entries on this page.
    pub data: Vec<SearchHistoryItem>,
    /// Pagination info.
    pub pagination: Pagination,
}

/// Response of `GET /searches/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStatsResponse {
    /// Number of searches made.
    pub total_searches: u64,
    /// Total CO₂ saved in kilograms.
    pub total_co2_saved: f64,
    /// Average cargo weight in kilograms.
    pub avg_cargo_weight: f64,
}

/// Parameters of `GET /search`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchParams {
    /// Query text.
    pub query: String,
    /// Index to search.
    pub index: String,
    /// Fields to match; sent as repeated `fields` parameters.
    pub fields: Vec<String>,
    /// 1-based page.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl SearchParams {
    /// Creates parameters for `query` against `index`.
    #[must_use]
    pub fn new(query: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            index: index.into(),
            ..Self::default()
        }
    }

    /// Rejects queries shorter than two characters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a too-short query.
    pub fn validate(&self) -> DomainResult<()> {
        if self.query.trim().chars().count() < MIN_QUERY_LEN {
            return Err(DomainError::InvalidQuery(format!(
                "query must have at least {MIN_QUERY_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Query pairs in wire order.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("query".to_string(), self.query.clone()),
            ("index".to_string(), self.index.clone()),
        ];
        pairs.extend(self.fields.iter().map(|f| ("fields".to_string(), f.clone())));
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Stored document.
    #[serde(rename = "_source", default)]
    pub source: serde_json::Value,
    /// Relevance score.
    #[serde(rename = "_score", default)]
    pub score: f64,
    /// Highlighted fragments per field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<BTreeMap<String, Vec<String>>>,
}

/// Total hit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTotal {
    /// Count.
    pub value: u64,
    /// "eq" or "gte".
    pub relation: String,
}

/// Hits block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    /// Total hits.
    pub total: SearchTotal,
    /// Hits on this page.
    pub hits: Vec<SearchHit>,
}

/// Search engine response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits.
    pub hits: SearchHits,
    /// Milliseconds spent searching.
    #[serde(default)]
    pub took: u64,
    /// Whether the engine timed out.
    #[serde(default)]
    pub timed_out: bool,
    /// Aggregation results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<serde_json::Value>,
}

/// Envelope used by endpoints that wrap their payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload.
    pub data: T,
    /// Optional message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
