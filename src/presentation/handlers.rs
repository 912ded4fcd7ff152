// HTTP request handlers
use crate::domain::dashboard::DashboardView;
use crate::domain::view::{ViewMode, parse_day, parse_month};
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::retained_charts::Surface;
use crate::presentation::app_state::AppState;
use crate::presentation::error::AppResult;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Deserialize)]
pub struct DayRequest {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthRequest {
    pub month: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub enabled: bool,
    pub interval_secs: Option<u64>,
}

/// The dashboard state plus every chart surface a browser should paint
#[derive(Serialize)]
pub struct ViewResponse {
    pub view: DashboardView,
    pub charts: Vec<Surface>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/rooms", get(list_rooms))
        .route("/rooms/:id", post(select_room))
        .route("/mode", post(set_mode))
        .route("/day", post(set_day))
        .route("/month", post(set_month))
        .route("/refresh", post(set_refresh))
        .route("/theme/toggle", post(toggle_theme))
        .route("/view", get(get_view))
        .route("/view/stream", get(stream_view))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_rooms(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let rooms = state.controller.rooms();
    match json_response(&rooms, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

pub async fn select_room(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ViewResponse>> {
    state.controller.select_room(&id).await?;
    Ok(Json(current_view(&state)))
}

pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> AppResult<Json<ViewResponse>> {
    let mode: ViewMode = request.mode.parse()?;
    state.controller.set_mode(mode).await;
    Ok(Json(current_view(&state)))
}

pub async fn set_day(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DayRequest>,
) -> AppResult<Json<ViewResponse>> {
    let day = request.date.as_deref().map(parse_day).transpose()?;
    state.controller.set_day(day).await;
    Ok(Json(current_view(&state)))
}

pub async fn set_month(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MonthRequest>,
) -> AppResult<Json<ViewResponse>> {
    let month = request.month.as_deref().map(parse_month).transpose()?;
    state.controller.set_month(month).await;
    Ok(Json(current_view(&state)))
}

pub async fn set_refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Json<ViewResponse> {
    state
        .controller
        .set_auto_refresh(request.enabled, request.interval_secs);
    Json(current_view(&state))
}

pub async fn toggle_theme(State(state): State<Arc<AppState>>) -> Json<ViewResponse> {
    state.controller.toggle_theme().await;
    Json(current_view(&state))
}

/// Current view, Brotli-compressed when the client accepts it
pub async fn get_view(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match json_response(&current_view(&state), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream a fresh view every time the dashboard changes
pub async fn stream_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let charts = state.charts.clone();
    stream_from_watch(state.controller.subscribe(), move |view| ViewResponse {
        view,
        charts: charts.snapshot(),
    })
}

fn current_view(state: &AppState) -> ViewResponse {
    ViewResponse {
        view: state.controller.view(),
        charts: state.charts.snapshot(),
    }
}
