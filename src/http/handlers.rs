//! Route handlers.

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::{Deserialize, Serialize};

use crate::http::request::request_id;
use crate::http::response::{self, ApiError, ERR_MISSING_FIELD, ERR_TOKEN_EXCHANGE, ERR_VERSION_NOT_FOUND};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct Pong {
    pub response: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub healthy: bool,
}

pub async fn ping(headers: HeaderMap) -> impl IntoResponse {
    response::ok(request_id(&headers), Pong { response: "pong!" })
}

pub async fn health(headers: HeaderMap) -> impl IntoResponse {
    response::ok(request_id(&headers), Health { healthy: true })
}

pub async fn version(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let id = request_id(&headers);
    match state.version.as_deref() {
        Some(version) => response::ok(id, version.clone()).into_response(),
        None => response::error(
            StatusCode::NOT_FOUND,
            id,
            ApiError::new(ERR_VERSION_NOT_FOUND, "version information not found", ""),
        )
        .into_response(),
    }
}

/// Form posted to the bearer-token exchange.
#[derive(Debug, Default, Deserialize)]
pub struct BearerTokenRequest {
    pub namespace: Option<String>,
    pub service_acct: Option<String>,
    pub argo_base_url: Option<String>,
}

impl BearerTokenRequest {
    /// The three fields, or the name of the first missing one.
    fn fields(&self) -> Result<(&str, &str, &str), &'static str> {
        fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, &'static str> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or(name)
        }
        Ok((
            required(&self.namespace, "namespace")?,
            required(&self.service_acct, "service_acct")?,
            required(&self.argo_base_url, "argo_base_url")?,
        ))
    }
}

/// Exchange a service account for its token and redirect to the workflow UI.
pub async fn bearer_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BearerTokenRequest>,
) -> Response {
    let id = request_id(&headers);
    let (namespace, service_acct, argo_base_url) = match form.fields() {
        Ok(fields) => fields,
        Err(field) => {
            return response::error(
                StatusCode::BAD_REQUEST,
                id,
                ApiError::new(ERR_MISSING_FIELD, "missing form field", field),
            )
            .into_response();
        }
    };

    match state.issuer.service_account_token(namespace, service_acct).await {
        Ok(token) => {
            let location = workflows_url(argo_base_url, namespace);
            tracing::info!(
                request_id = %id,
                namespace,
                service_account = service_acct,
                location = %location,
                "Redirecting with service account token"
            );
            (
                StatusCode::SEE_OTHER,
                [(LOCATION, location), (AUTHORIZATION, format!("Bearer {token}"))],
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(
                request_id = %id,
                namespace,
                service_account = service_acct,
                error = %e,
                "Token exchange failed"
            );
            response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                id,
                ApiError::new(ERR_TOKEN_EXCHANGE, "unable to retrieve service account token", e.to_string()),
            )
            .into_response()
        }
    }
}

fn workflows_url(argo_base_url: &str, namespace: &str) -> String {
    format!(
        "{}/workflows/{}?limit=50",
        argo_base_url.trim_end_matches('/'),
        namespace
    )
}
