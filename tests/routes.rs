//! Router-level tests for the API routes and static content.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use muxd::http::{build_router, AppState};
use muxd::token::TokenIssuer;
use muxd::version::Version;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn router(version: Option<Version>, issuer: Arc<dyn TokenIssuer>, content: &TempDir) -> Router {
    build_router(AppState::new(version, issuer), content.path())
}

fn default_router(content: &TempDir) -> Router {
    router(None, Arc::new(common::StaticIssuer), content)
}

async fn json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/bearer-token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn ping_returns_pong_in_envelope() {
    let content = TempDir::new().unwrap();
    let res = default_router(&content).oneshot(get("/v1/ping")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let request_id = res
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = json(res).await;
    assert_eq!(body["payload"]["response"], "pong!");
    assert_eq!(body["requestId"], request_id);
    assert!(uuid::Uuid::parse_str(&request_id).is_ok());
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn client_request_id_is_kept() {
    let content = TempDir::new().unwrap();
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let res = default_router(&content).oneshot(req).await.unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-42");
    let body = json(res).await;
    assert_eq!(body["requestId"], "trace-42");
    assert_eq!(body["payload"]["healthy"], true);
}

#[tokio::test]
async fn version_present_and_absent() {
    let content = TempDir::new().unwrap();
    let version = Version {
        timestamp: "2024-05-01T10:00:00Z".into(),
        git_sha: "deadbeef".into(),
        git_branch: "main".into(),
    };

    let res = router(Some(version), Arc::new(common::StaticIssuer), &content)
        .oneshot(get("/version"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["payload"]["gitSha"], "deadbeef");
    assert_eq!(body["payload"]["gitBranch"], "main");

    let res = default_router(&content).oneshot(get("/version")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json(res).await;
    assert!(body["payload"].is_null());
    assert_eq!(body["errors"][0]["code"], "E0002");
}

#[tokio::test]
async fn bearer_token_redirects_with_authorization() {
    let content = TempDir::new().unwrap();
    let res = default_router(&content)
        .oneshot(form(
            "namespace=team-a&service_acct=argo&argo_base_url=https%3A%2F%2Fargo.example.com",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers()[header::LOCATION],
        "https://argo.example.com/workflows/team-a?limit=50"
    );
    assert_eq!(res.headers()[header::AUTHORIZATION], "Bearer tok-team-a-argo");
}

#[tokio::test]
async fn bearer_token_failure_reports_e0001() {
    let content = TempDir::new().unwrap();
    let res = router(None, Arc::new(common::FailingIssuer), &content)
        .oneshot(form(
            "namespace=team-a&service_acct=argo&argo_base_url=https%3A%2F%2Fargo.example.com",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(res).await;
    assert_eq!(body["errors"][0]["code"], "E0001");
    assert!(body["errors"][0]["detail"]
        .as_str()
        .unwrap()
        .contains("argo-token"));
}

#[tokio::test]
async fn bearer_token_without_issuer_reports_e0001() {
    let content = TempDir::new().unwrap();
    let res = build_router(AppState::default(), content.path())
        .oneshot(form("namespace=ns&service_acct=sa&argo_base_url=http%3A%2F%2Fargo"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(res).await;
    assert_eq!(body["errors"][0]["code"], "E0001");
    assert_eq!(body["errors"][0]["detail"], "token issuer not configured");
}

#[tokio::test]
async fn bearer_token_missing_field_is_bad_request() {
    let content = TempDir::new().unwrap();
    let res = default_router(&content)
        .oneshot(form("namespace=team-a"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert_eq!(body["errors"][0]["code"], "E0003");
    assert_eq!(body["errors"][0]["detail"], "service_acct");
}

#[tokio::test]
async fn serves_static_content() {
    let content = TempDir::new().unwrap();
    std::fs::write(content.path().join("index.html"), "<h1>muxd</h1>").unwrap();
    std::fs::create_dir(content.path().join("styles")).unwrap();
    std::fs::write(content.path().join("styles").join("site.css"), "body{}").unwrap();

    let app = default_router(&content);

    let res = app.clone().oneshot(get("/app/index.html")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>muxd</h1>");

    let res = app.clone().oneshot(get("/styles/site.css")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get("/images/missing.png")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let content = TempDir::new().unwrap();
    let res = default_router(&content).oneshot(get("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
