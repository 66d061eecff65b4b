use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::{distance_km, eta_minutes, round_eta, Coordinate};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{AppState, AuthenticatedUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DistanceQuery {
    pub from: String,
    pub to: String,
    /// Average speed in km per minute; defaults to the configured value.
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistanceResponse {
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
    pub eta_minutes: f64,
    pub eta_display_minutes: i64,
    pub speed_km_per_min: f64,
}

#[utoipa::path(
    get,
    path = "/api/geo/distance",
    params(
        ("from" = String, Query, description = "Start as lat,lon"),
        ("to" = String, Query, description = "End as lat,lon"),
        ("speed" = Option<f64>, Query, description = "Average speed (km/min)")
    ),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Great-circle distance and ETA", body = DistanceResponse),
        (status = 400, description = "Invalid coordinate or speed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "geo"
)]
pub async fn distance(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DistanceQuery>,
) -> ApiResult<Json<DistanceResponse>> {
    let from: Coordinate = query.from.parse()?;
    let to: Coordinate = query.to.parse()?;
    let speed = query
        .speed
        .unwrap_or(state.config.tracking.average_speed_km_per_min);

    let distance = distance_km(from, to);
    let eta = eta_minutes(distance, speed)?;

    Ok(Json(DistanceResponse {
        from,
        to,
        distance_km: distance,
        eta_minutes: eta,
        eta_display_minutes: round_eta(eta),
        speed_km_per_min: speed,
    }))
}
