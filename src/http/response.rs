//! Response envelope.
//!
//! Every JSON body the service produces has the same outer shape:
//!
//! ```json
//! {"requestId": "...", "timestamp": "...", "execHost": "...", "payload": {...}, "errors": []}
//! ```

use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Token exchange failed or is unavailable.
pub const ERR_TOKEN_EXCHANGE: &str = "E0001";
/// No version snapshot was loaded.
pub const ERR_VERSION_NOT_FOUND: &str = "E0002";
/// A required form field was missing.
pub const ERR_MISSING_FIELD: &str = "E0003";

/// One entry of the `errors` list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub detail: String,
    pub help_url: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            detail: detail.into(),
            help_url: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub request_id: String,
    pub timestamp: String,
    pub exec_host: String,
    pub payload: Option<T>,
    pub errors: Vec<ApiError>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(request_id: impl Into<String>, payload: T) -> Self {
        Self::build(request_id.into(), Some(payload), Vec::new())
    }
}

impl Envelope<()> {
    pub fn failed(request_id: impl Into<String>, error: ApiError) -> Self {
        Self::build(request_id.into(), None, vec![error])
    }
}

impl<T> Envelope<T> {
    fn build(request_id: String, payload: Option<T>, errors: Vec<ApiError>) -> Self {
        Self {
            request_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            exec_host: exec_host().to_string(),
            payload,
            errors,
        }
    }
}

/// An envelope paired with the status it is sent with.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub envelope: Envelope<T>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        metrics::counter!("muxd_requests_total", "status" => self.status.as_u16().to_string())
            .increment(1);
        (self.status, Json(self.envelope)).into_response()
    }
}

pub fn ok<T: Serialize>(request_id: impl Into<String>, payload: T) -> ApiResponse<T> {
    ApiResponse {
        status: StatusCode::OK,
        envelope: Envelope::ok(request_id, payload),
    }
}

pub fn error(status: StatusCode, request_id: impl Into<String>, error: ApiError) -> ApiResponse<()> {
    ApiResponse {
        status,
        envelope: Envelope::<()>::failed(request_id, error),
    }
}

/// Name of the host serving the request: `POD_NAME`, then `HOSTNAME`, then `N/A`.
pub fn exec_host() -> &'static str {
    static HOST: OnceLock<String> = OnceLock::new();
    HOST.get_or_init(|| resolve_exec_host(|name| std::env::var(name).ok()))
}

fn resolve_exec_host(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["POD_NAME", "HOSTNAME"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}
