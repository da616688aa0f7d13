//! EcoRoute Domain - Core business types
//!
//! This crate defines the domain model for the EcoRoute API client:
//! sessions and tokens, HTTP request/response values, route geometry
//! and search history. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod request;
pub mod response;
pub mod route;
pub mod search;

pub use auth::{
    ApiMessage, AuthEvent, AuthTokens, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, Session, SessionStatus, TokenClaims, User,
};
pub use error::{DomainError, DomainResult};
pub use request::{ApiRequest, HttpMethod};
pub use response::{ApiResponse, StatusCode};
pub use route::{
    BoundingBox, Coordinate, EfficientRoute, LineStringGeometry, PointIn, Route,
    RouteCalculationRequest, RouteCalculationResponse, RouteSavings, TransportMode,
};
pub use search::{
    ApiEnvelope, Location, Pagination, RouteInfo, SearchHistoryItem, SearchHistoryParams,
    SearchHistoryResponse, SearchHit, SearchHits, SearchMetadata, SearchParams, SearchResponse,
    SearchStatsResponse, SearchTotal,
};
