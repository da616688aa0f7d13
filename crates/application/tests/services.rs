//! Typed API services over the authenticated client.

#![allow(clippy::unwrap_used)]

mod common;

use common::{FakeApi, harness, session};
use ecoroute_application::{
    ApplicationError, AuthApi, InMemorySessionStore, RouteApi, SearchApi, SearchHistoryApi,
};
use ecoroute_domain::{
    ChangePasswordRequest, DomainError, PointIn, RegisterRequest, RouteCalculationRequest,
    SearchHistoryParams, SearchParams, TransportMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn logged_in() -> common::Harness {
    let store = InMemorySessionStore::with_session(session("acc@900", "ref@5000"));
    harness(FakeApi::new("acc@900"), store)
}

fn route(coordinates: serde_json::Value) -> serde_json::Value {
    json!({
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "distance_km": 412.5,
        "duration_hours": 5.2,
        "co2_emissions_kg": 120.0
    })
}

fn calculation() -> RouteCalculationRequest {
    RouteCalculationRequest {
        origin: PointIn::new("Madrid", 40.4168, -3.7038),
        destination: PointIn::new("Valencia", 39.4699, -0.3763),
        cargo_weight_kg: 1500.0,
        transport_mode: TransportMode::Land,
    }
}

#[tokio::test]
async fn test_calculate_routes() {
    let h = logged_in();
    let mut efficient = route(json!([[-3.70, 40.41], [-1.0, 39.9], [-0.37, 39.46]]));
    efficient["savings"] = json!({ "co2_saved_kg": 12.5, "percentage": 10.4 });
    h.api.respond(
        "/routes/calculate",
        200,
        json!({
            "shortest_route": route(json!([[-3.70, 40.41], [-0.37, 39.46]])),
            "efficient_route": efficient,
            "search_id": "s-1"
        }),
    );

    let response = RouteApi::new(h.client.clone())
        .calculate(&calculation())
        .await
        .unwrap();

    assert_eq!(response.search_id.as_deref(), Some("s-1"));
    assert_eq!(response.efficient_route.route.geometry.coordinates.len(), 3);
    assert!((response.efficient_route.savings.co2_saved_kg - 12.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_calculate_rejects_invalid_request_locally() {
    let h = logged_in();
    let mut request = calculation();
    request.cargo_weight_kg = 0.0;

    let err = RouteApi::new(h.client.clone())
        .calculate(&request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidCargoWeight(_))
    ));
    assert_eq!(h.api.calls_to("/routes/calculate"), 0);
}

#[tokio::test]
async fn test_calculate_rejects_degenerate_geometry() {
    let h = logged_in();
    h.api.respond(
        "/routes/calculate",
        200,
        json!({
            "shortest_route": route(json!([[-3.70, 40.41]])),
            "efficient_route": route(json!([[-3.70, 40.41], [-0.37, 39.46]]))
        }),
    );

    let err = RouteApi::new(h.client.clone())
        .calculate(&calculation())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidGeometry(_))
    ));
}

#[tokio::test]
async fn test_history_list_sends_filters() {
    let h = logged_in();
    h.api.respond(
        "/searches",
        200,
        json!({
            "data": [],
            "pagination": { "page": 2, "limit": 5, "total": 7, "total_pages": 2, "has_next": false }
        }),
    );
    let params = SearchHistoryParams {
        page: Some(2),
        limit: Some(5),
        sort: None,
        mode: Some(TransportMode::Sea),
    };

    let page = SearchHistoryApi::new(h.client.clone())
        .list(&params)
        .await
        .unwrap();

    assert_eq!(page.pagination.total, 7);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_history_stats_and_delete() {
    let h = logged_in();
    h.api.respond(
        "/searches/stats",
        200,
        json!({ "total_searches": 3, "total_co2_saved": 40.5, "avg_cargo_weight": 1000.0 }),
    );
    h.api.respond("/searches/missing", 404, json!({ "detail": "Search not found" }));
    let api = SearchHistoryApi::new(h.client.clone());

    assert_eq!(api.stats().await.unwrap().total_searches, 3);
    api.delete("abc").await.unwrap();
    assert_eq!(
        api.delete("missing").await.unwrap_err(),
        ApplicationError::NotFound("Search not found".to_string())
    );
    assert!(api.delete("").await.is_err());
}

#[tokio::test]
async fn test_search_rejects_short_query() {
    let h = logged_in();

    let err = SearchApi::new(h.client.clone())
        .search(&SearchParams::new("a", "routes"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidQuery(_))
    ));
    assert_eq!(h.api.calls_to("/search"), 0);
}

#[tokio::test]
async fn test_search_decodes_hits() {
    let h = logged_in();
    h.api.respond(
        "/search",
        200,
        json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{ "_id": "d1", "_source": { "name": "Madrid" }, "_score": 1.5 }]
            },
            "took": 3
        }),
    );

    let response = SearchApi::new(h.client.clone())
        .search(&SearchParams::new("mad", "routes"))
        .await
        .unwrap();

    assert_eq!(response.hits.total.value, 1);
    assert_eq!(response.hits.hits[0].source["name"], "Madrid");
}

#[tokio::test]
async fn test_public_auth_calls_skip_bearer() {
    let h = logged_in();
    h.api.respond(
        "/auth/register",
        200,
        json!({ "success": true, "message": "Check your email" }),
    );
    h.api.respond("/auth/confirmation/ada@example.com", 200, json!({}));
    let api = AuthApi::new(h.client.clone());

    let message = api
        .register(&RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
            full_name: "Ada Lovelace".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(message.message.as_deref(), Some("Check your email"));
    assert_eq!(h.api.bearers_for("/auth/register"), vec![None]);

    api.confirm_email("ada@example.com", "123456").await.unwrap();
    assert_eq!(
        h.api.bearers_for("/auth/confirmation/ada@example.com"),
        vec![None]
    );
}

#[tokio::test]
async fn test_change_password_checks_confirmation_locally() {
    let h = logged_in();
    let api = AuthApi::new(h.client.clone());

    let err = api
        .change_password(&ChangePasswordRequest {
            old_password: "old".to_string(),
            new_password: "new-one".to_string(),
            confirm_new_password: "new-two".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Validation(_)));
    assert_eq!(h.api.calls_to("/auth/change-password"), 0);
}

#[tokio::test]
async fn test_me_uses_session_token() {
    let h = logged_in();

    let user = AuthApi::new(h.client.clone()).me().await.unwrap();

    assert_eq!(user.id, "u1");
    assert_eq!(h.api.bearers_for("/auth/me"), vec![Some("acc@900".to_string())]);
}
