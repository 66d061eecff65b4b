use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::Coordinate;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{AppState, AuthenticatedUser};

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteSummary {
    pub name: String,
    pub waypoint_count: usize,
    pub length_km: f64,
    pub waypoints: Vec<Coordinate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearestQuery {
    /// Rider position as `"lat,lon"`.
    pub at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearestWaypointResponse {
    pub route: String,
    pub index: usize,
    pub waypoint: Coordinate,
    pub distance_km: f64,
}

#[utoipa::path(
    get,
    path = "/api/routes",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Configured routes", body = Vec<RouteSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn list_routes(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<Vec<RouteSummary>>> {
    let registry = state.registry.lock().await;
    let routes = registry
        .routes()
        .iter()
        .map(|(name, route)| RouteSummary {
            name: name.clone(),
            waypoint_count: route.len(),
            length_km: route.length_km(),
            waypoints: route.waypoints().to_vec(),
        })
        .collect();
    Ok(Json(routes))
}

#[utoipa::path(
    get,
    path = "/api/routes/{name}/nearest",
    params(
        ("name" = String, Path, description = "Route name"),
        ("at" = String, Query, description = "Position as lat,lon")
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Closest waypoint", body = NearestWaypointResponse),
        (status = 400, description = "Invalid coordinate", body = ErrorResponse),
        (status = 404, description = "Unknown route", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn nearest_waypoint(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(name): Path<String>,
    Query(query): Query<NearestQuery>,
) -> ApiResult<Json<NearestWaypointResponse>> {
    let at: Coordinate = query.at.parse()?;
    let registry = state.registry.lock().await;
    let route = registry.route(&name)?;
    let (index, distance_km) = route.nearest_waypoint(at);

    Ok(Json(NearestWaypointResponse {
        route: name,
        index,
        waypoint: route.waypoints()[index],
        distance_km,
    }))
}
