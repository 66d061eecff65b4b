mod coordinate;
mod distance;
mod error;
mod route;

pub use coordinate::Coordinate;
pub use distance::{
    distance_km, eta_minutes, eta_with_traffic, round_eta, validate_speed, TrafficCondition,
    DEFAULT_AVERAGE_SPEED_KM_PER_MIN,
};
pub use error::GeoError;
pub use route::Route;
