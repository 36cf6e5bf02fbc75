use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use counsel::memory::JsonlMemory;
use counsel::pipeline::Pipeline;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Clone)]
pub(crate) struct PipelineState {
    pub(crate) pipeline: Arc<Pipeline<JsonlMemory>>,
    pub(crate) api_key: Arc<str>,
}

pub(crate) type AuthRejection = (StatusCode, Json<serde_json::Value>);

/// Bearer-token check for the pipeline endpoint. Missing or malformed
/// credentials get 401, a wrong token gets 403.
pub(crate) fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), AuthRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing Authorization header" })),
        ))?;

    let token = value.strip_prefix("Bearer ").ok_or((
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "expected a Bearer token" })),
    ))?;

    if token != expected {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "invalid API key" })),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        let (status, _) = authorize(&headers, "secret").expect_err("rejected");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_token_is_forbidden() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        let (status, _) = authorize(&headers, "secret").expect_err("rejected");
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn matching_token_passes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret"),
        );
        assert!(authorize(&headers, "secret").is_ok());
    }
}
