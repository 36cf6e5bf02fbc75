use crate::cli::ServeArgs;
use crate::error::AppError;
use crate::infra::{AppState, PipelineState};
use crate::routes::pipeline_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use counsel::config::{AppConfig, RoutingConfig};
use counsel::memory::JsonlMemory;
use counsel::pipeline::Pipeline;
use counsel::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let routing = RoutingConfig::load(config.heuristics_path.as_deref())?;
    let memory = Arc::new(JsonlMemory::new(&config.memory_path));
    let pipeline_state = PipelineState {
        pipeline: Arc::new(Pipeline::new(&routing, memory)),
        api_key: Arc::from(config.api_key.as_str()),
    };

    let app = pipeline_router(pipeline_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "decision pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
