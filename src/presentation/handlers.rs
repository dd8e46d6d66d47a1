// HTTP request handlers
use crate::application::chart_renderer::ChartRenderer;
use crate::application::viewer_session::{ConnectRequest, ViewState, ViewerCommand};
use crate::domain::chart::{ChartKind, Theme};
use crate::infrastructure::chunked_frames::stream_from_broadcast;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::svg_surface::SvgSurface;
use crate::presentation::app_state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_CHART_WIDTH: f64 = 600.0;
const DEFAULT_CHART_HEIGHT: f64 = 160.0;
const MAX_CHART_SIDE: f64 = 4096.0;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub theme: Option<Theme>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsResponse {
    pub presets: Vec<String>,
    pub default_base_url: String,
    pub default_sensor_id: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

async fn current_state(state: &AppState) -> Result<ViewState, StatusCode> {
    state.viewer.state().await.map_err(|e| {
        tracing::error!("Cannot read viewer state: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}

/// Full view: status, KPIs, chart series and log
pub async fn get_state(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = match current_state(&state).await {
        Ok(view) => view,
        Err(status) => return status.into_response(),
    };

    match json_response(&view, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Log lines, newest first
pub async fn get_log(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = match current_state(&state).await {
        Ok(view) => view,
        Err(status) => return status.into_response(),
    };
    let lines: Vec<String> = view.log.iter().map(|entry| entry.to_string()).collect();

    match json_response(&lines, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn list_endpoints(State(state): State<Arc<AppState>>) -> Json<EndpointsResponse> {
    let target = state.stream.default_target();
    Json(EndpointsResponse {
        presets: state.stream.presets.clone(),
        default_base_url: target.base_url,
        default_sensor_id: target.sensor_id,
    })
}

/// Stream tick snapshots as they are produced
pub async fn stream_ticks(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_broadcast(state.viewer.subscribe_ticks(), accepts_brotli(&headers))
}

pub async fn throughput_chart(
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    render_chart(ChartKind::Throughput, query, &state).await
}

pub async fn latency_chart(
    Query(query): Query<ChartQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    render_chart(ChartKind::Latency, query, &state).await
}

async fn render_chart(kind: ChartKind, query: ChartQuery, state: &AppState) -> Response {
    let view = match current_state(state).await {
        Ok(view) => view,
        Err(status) => return status.into_response(),
    };

    let values: Vec<f64> = match kind {
        ChartKind::Throughput => view.throughput_series.iter().map(|v| *v as f64).collect(),
        ChartKind::Latency => view.latency_series,
    };

    let theme = query.theme.unwrap_or(state.default_theme());
    let width = chart_side(query.width, DEFAULT_CHART_WIDTH);
    let height = chart_side(query.height, DEFAULT_CHART_HEIGHT);

    let mut surface = SvgSurface::new(width, height, theme.background());
    ChartRenderer::new().render(&values, &mut surface, &theme.stroke(kind));

    ([(header::CONTENT_TYPE, "image/svg+xml")], surface.into_svg()).into_response()
}

fn chart_side(requested: Option<f64>, default: f64) -> f64 {
    match requested {
        Some(side) if side.is_finite() && side >= 1.0 => side.min(MAX_CHART_SIDE),
        _ => default,
    }
}

/// Connect to the posted target. An empty body reuses the current or configured target.
pub async fn connect(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let request = match parse_connect_request(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected connect request: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    control(&state, ViewerCommand::Connect(request)).await
}

fn parse_connect_request(body: &[u8]) -> Result<ConnectRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConnectRequest::default());
    }
    serde_json::from_slice(body)
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> StatusCode {
    control(&state, ViewerCommand::Disconnect).await
}

pub async fn pause(State(state): State<Arc<AppState>>) -> StatusCode {
    control(&state, ViewerCommand::Pause).await
}

pub async fn resume(State(state): State<Arc<AppState>>) -> StatusCode {
    control(&state, ViewerCommand::Resume).await
}

pub async fn reset(State(state): State<Arc<AppState>>) -> StatusCode {
    control(&state, ViewerCommand::Reset).await
}

async fn control(state: &AppState, command: ViewerCommand) -> StatusCode {
    match state.viewer.send(command).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            tracing::error!("Cannot send viewer command: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
