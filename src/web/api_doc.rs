use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::{geo, routes, tracker};

#[derive(OpenApi)]
#[openapi(
    paths(
        tracker::create_session,
        tracker::list_sessions,
        tracker::get_session,
        tracker::delete_session,
        tracker::start,
        tracker::stop,
        tracker::reset,
        tracker::advance,
        tracker::set_observer,
        routes::list_routes,
        routes::nearest_waypoint,
        geo::distance,
    ),
    components(
        schemas(
            tracker::CreateSessionRequest,
            tracker::ObserverRequest,
            routes::RouteSummary,
            routes::NearestWaypointResponse,
            geo::DistanceResponse,
            super::api::error::ErrorResponse,
            crate::geo::Coordinate,
            crate::geo::TrafficCondition,
            crate::tracker::TrackerStatus,
            crate::tracker::TrackingSnapshot,
            crate::tracker::TrackingState,
            crate::tracker::Telemetry,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Bus-O-Mat Tracking API",
        description = "Live bus position, distance and ETA for riders and operators",
        version = "0.1.0"
    ),
    tags(
        (name = "sessions", description = "Rider tracking sessions"),
        (name = "routes", description = "Configured bus routes"),
        (name = "geo", description = "Distance and ETA helpers")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
