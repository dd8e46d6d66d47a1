// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    connect, disconnect, get_log, get_state, health_check, latency_chart, list_endpoints, pause,
    reset, resume, stream_ticks, throughput_chart,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/state", get(get_state))
        .route("/api/log", get(get_log))
        .route("/api/endpoints", get(list_endpoints))
        .route("/api/ticks", get(stream_ticks))
        .route("/api/connect", post(connect))
        .route("/api/disconnect", post(disconnect))
        .route("/api/pause", post(pause))
        .route("/api/resume", post(resume))
        .route("/api/reset", post(reset))
        .route("/charts/throughput.svg", get(throughput_chart))
        .route("/charts/latency.svg", get(latency_chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
