use crate::infra::{authorize, AppState, AuthRejection, PipelineState};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use counsel::pipeline::context::RequestContext;
use counsel::pipeline::PipelineOutcome;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct RunRequest {
    pub(crate) user_text: String,
    #[serde(default)]
    pub(crate) context: RequestContext,
}

pub(crate) fn pipeline_router(state: PipelineState) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/pipeline/run", axum::routing::post(run_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn run_endpoint(
    Extension(state): Extension<PipelineState>,
    headers: HeaderMap,
    Json(payload): Json<RunRequest>,
) -> Result<Json<PipelineOutcome>, AuthRejection> {
    authorize(&headers, &state.api_key)?;
    let outcome = state.pipeline.run(&payload.user_text, &payload.context);
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use counsel::config::RoutingConfig;
    use counsel::memory::JsonlMemory;
    use counsel::pipeline::Pipeline;
    use std::sync::Arc;

    fn state(dir: &tempfile::TempDir) -> PipelineState {
        let memory = Arc::new(JsonlMemory::new(dir.path().join("memory_store.jsonl")));
        PipelineState {
            pipeline: Arc::new(Pipeline::new(&RoutingConfig::standard(), memory)),
            api_key: Arc::from("secret"),
        }
    }

    fn bearer(token: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header"),
        );
        headers
    }

    #[tokio::test]
    async fn run_endpoint_returns_the_pipeline_outcome() {
        let dir = tempfile::tempdir().expect("temp dir");
        let request = RunRequest {
            user_text: "risk exposure on the launch".to_string(),
            context: RequestContext::default(),
        };

        let Json(outcome) = run_endpoint(Extension(state(&dir)), bearer("secret"), Json(request))
            .await
            .expect("authorized run");

        assert_eq!(outcome.summary.intent, "risk");
        assert!(outcome.markdown.contains("**Top Risks:**"));
    }

    #[tokio::test]
    async fn run_endpoint_rejects_a_missing_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let request = RunRequest {
            user_text: "anything".to_string(),
            context: RequestContext::default(),
        };

        let (status, _) = run_endpoint(Extension(state(&dir)), HeaderMap::new(), Json(request))
            .await
            .expect_err("rejected");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn run_endpoint_rejects_a_wrong_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let request = RunRequest {
            user_text: "anything".to_string(),
            context: RequestContext::default(),
        };

        let (status, _) = run_endpoint(Extension(state(&dir)), bearer("nope"), Json(request))
            .await
            .expect_err("rejected");
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
