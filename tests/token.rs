//! KubeSecretIssuer against a stand-in API server.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use muxd::token::{KubeSecretIssuer, TokenError, TokenIssuer};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn fake_api() -> String {
    async fn secret(
        Path((namespace, name)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer api-token") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        match (namespace.as_str(), name.as_str()) {
            // base64("argo-secret")
            ("team-a", "argo-token") => Ok(Json(json!({"data": {"token": "YXJnby1zZWNyZXQ="}}))),
            ("team-a", "empty-token") => Ok(Json(json!({"data": {}}))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    let app = Router::new().route("/api/v1/namespaces/{namespace}/secrets/{name}", get(secret));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn issuer(api_url: &str, dir: &TempDir) -> KubeSecretIssuer {
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "api-token\n").unwrap();
    KubeSecretIssuer::new(api_url, token_path, false).unwrap()
}

#[tokio::test]
async fn reads_and_decodes_secret() {
    let dir = TempDir::new().unwrap();
    let issuer = issuer(&fake_api().await, &dir);

    let token = issuer.service_account_token("team-a", "argo").await.unwrap();
    assert_eq!(token, "argo-secret");
}

#[tokio::test]
async fn missing_secret_is_status_error() {
    let dir = TempDir::new().unwrap();
    let issuer = issuer(&fake_api().await, &dir);

    let err = issuer.service_account_token("team-b", "argo").await.unwrap_err();
    assert!(matches!(err, TokenError::Status { status: 404, .. }));
}

#[tokio::test]
async fn secret_without_token_is_rejected() {
    let dir = TempDir::new().unwrap();
    let issuer = issuer(&fake_api().await, &dir);

    let err = issuer.service_account_token("team-a", "empty").await.unwrap_err();
    assert!(matches!(err, TokenError::MissingToken { .. }));
}

#[tokio::test]
async fn unreadable_credentials() {
    let dir = TempDir::new().unwrap();
    let issuer = KubeSecretIssuer::new("http://127.0.0.1:1", dir.path().join("absent"), false).unwrap();

    let err = issuer.service_account_token("team-a", "argo").await.unwrap_err();
    assert!(matches!(err, TokenError::Credentials { .. }));
}
