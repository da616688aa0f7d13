//! CLI commands against a mock API.

#![allow(clippy::unwrap_used)]

use base64::Engine as _;
use clap::Parser;
use ecoroute::{App, Cli, CliError};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jwt(ttl_secs: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let exp = i64::try_from(now).unwrap() + ttl_secs;
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.sig",
        engine.encode("{}"),
        engine.encode(json!({ "sub": "u1", "type": "access", "exp": exp }).to_string())
    )
}

async fn run(
    server: &MockServer,
    dir: &TempDir,
    args: &[&str],
) -> Result<serde_json::Value, CliError> {
    let uri = server.uri();
    let session_dir = dir.path().to_str().unwrap();
    let mut argv = vec![
        "ecoroute",
        "--api-url",
        uri.as_str(),
        "--session-dir",
        session_dir,
        "--config",
        "does-not-exist.toml",
    ];
    argv.extend_from_slice(args);

    let cli = Cli::try_parse_from(argv).unwrap();
    let config = App::load_config(&cli)?;
    App::new(config)?.run(cli.command).await
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": jwt(900),
            "refresh_token": jwt(86_400),
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u1",
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_status_and_history() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/searches"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pagination": { "page": 1, "limit": 5, "total": 0, "total_pages": 0, "has_next": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let login = run(
        &server,
        &dir,
        &["login", "--email", "ada@example.com", "--password", "pw"],
    )
    .await
    .unwrap();
    assert_eq!(login["user"]["email"], "ada@example.com");

    let status = run(&server, &dir, &["status"]).await.unwrap();
    assert_eq!(status["status"], "valid");

    let history = run(&server, &dir, &["history", "--limit", "5"]).await.unwrap();
    assert_eq!(history["pagination"]["limit"], 5);
}

#[tokio::test]
async fn test_commands_require_login() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let err = run(&server, &dir, &["stats"]).await.unwrap_err();
    assert!(matches!(err, CliError::NotLoggedIn));

    let status = run(&server, &dir, &["status"]).await.unwrap();
    assert_eq!(status["status"], "not_authenticated");
}

#[tokio::test]
async fn test_logout_clears_stored_session() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    run(
        &server,
        &dir,
        &["login", "--email", "ada@example.com", "--password", "pw"],
    )
    .await
    .unwrap();
    let out = run(&server, &dir, &["logout"]).await.unwrap();

    assert_eq!(out, json!({ "logged_out": true }));
    assert!(!dir.path().join("auth-storage.json").exists());
}

#[tokio::test]
async fn test_invalid_api_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "ecoroute",
        "--api-url",
        "ftp://example.com",
        "--session-dir",
        dir.path().to_str().unwrap(),
        "status",
    ])
    .unwrap();

    assert!(matches!(App::load_config(&cli), Err(CliError::Config(_))));
}
