use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::location::{locate_observer, FixedLocation};
use crate::tracker::TrackerStatus;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub route: String,
    #[serde(default)]
    pub observer: Option<Coordinate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ObserverRequest {
    #[serde(default)]
    pub observer: Option<Coordinate>,
}

fn validated(observer: Option<Coordinate>) -> ApiResult<Option<Coordinate>> {
    Ok(observer.map(Coordinate::validate).transpose()?)
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Session opened", body = TrackerStatus),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Unknown route", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    require_permission(&user, Permission::Track)?;

    let provider = FixedLocation::new(validated(request.observer)?);
    let observer = locate_observer(&provider, state.fallback_observer).await;

    let mut registry = state.registry.lock().await;
    let id = registry.create(&request.route, observer)?;
    let status = registry.get(id)?.status();

    Ok((StatusCode::CREATED, Json(status)))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Open sessions", body = Vec<TrackerStatus>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<Vec<TrackerStatus>>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.list()))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Session status", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    let registry = state.registry.lock().await;
    Ok(Json(registry.get(id)?.status()))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Session closed", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Track)?;
    let mut registry = state.registry.lock().await;
    Ok(Json(registry.remove(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/start",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Tracker started", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Tracker already running", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Operate)?;
    let mut registry = state.registry.lock().await;
    let tracker = registry.get_mut(id)?;
    tracker.start()?;
    Ok(Json(tracker.status()))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/stop",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Tracker stopped", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Operate)?;
    let mut registry = state.registry.lock().await;
    let tracker = registry.get_mut(id)?;
    tracker.stop().await;
    Ok(Json(tracker.status()))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Tracker rewound", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn reset(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Operate)?;
    let mut registry = state.registry.lock().await;
    let tracker = registry.get_mut(id)?;
    tracker.reset().await;
    Ok(Json(tracker.status()))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/advance",
    params(("id" = Uuid, Path, description = "Session ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Session stepped (no-op unless running)", body = TrackerStatus),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn advance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Operate)?;
    let registry = state.registry.lock().await;
    let tracker = registry.get(id)?;
    tracker.advance();
    Ok(Json(tracker.status()))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}/observer",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = ObserverRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Observer updated", body = TrackerStatus),
        (status = 400, description = "Invalid coordinate", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn set_observer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ObserverRequest>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&user, Permission::Track)?;
    let observer = validated(request.observer)?;
    let registry = state.registry.lock().await;
    let tracker = registry.get(id)?;
    tracker.set_observer(observer);
    Ok(Json(tracker.status()))
}
